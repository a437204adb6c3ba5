//! Filter matching and ordering for the in-memory tables.
//!
//! Ordering follows PostgreSQL defaults: `NULL` sorts last when ascending and
//! first when descending.

use std::cmp::Ordering;

use crate::domain::{Feedback, FeedbackFilter, Profile, ProfileColumn, ProfileFilter, User, UserFilter};

pub(super) trait Matches {
    type Row;

    fn matches(&self, row: &Self::Row) -> bool;
}

impl Matches for UserFilter {
    type Row = User;

    fn matches(&self, row: &User) -> bool {
        match self {
            Self::Id(id) => row.id() == id,
            Self::Email(email) => row.email() == email,
        }
    }
}

impl Matches for ProfileFilter {
    type Row = Profile;

    fn matches(&self, row: &Profile) -> bool {
        match self {
            Self::Id(id) => &row.id == id,
            Self::Email(email) => row.email.as_ref() == Some(email),
            Self::Role(role) => row.role == *role,
            Self::Department(value) => row.department.as_ref() == Some(value),
            Self::RollNumber(value) => row.roll_number.as_ref() == Some(value),
            Self::FacultyId(value) => row.faculty_id.as_ref() == Some(value),
            Self::AdminId(value) => row.admin_id.as_ref() == Some(value),
            Self::IsVerified(flag) => row.is_verified == *flag,
        }
    }
}

impl Matches for FeedbackFilter {
    type Row = Feedback;

    fn matches(&self, row: &Feedback) -> bool {
        match self {
            Self::Id(id) => &row.id == id,
            Self::UserId(user) => &row.user_id == user,
        }
    }
}

fn nulls_last<K: Ord>(left: Option<&K>, right: Option<&K>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by `key`.
pub(super) fn sort_rows<T, K, F>(rows: &mut [&T], ascending: bool, key: F)
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    rows.sort_by(|left, right| {
        let ordering = nulls_last(key(left).as_ref(), key(right).as_ref());
        if ascending { ordering } else { ordering.reverse() }
    });
}

pub(super) fn sort_profiles(rows: &mut [&Profile], column: ProfileColumn, ascending: bool) {
    match column {
        ProfileColumn::Name => sort_rows(rows, ascending, |p| p.name.clone()),
        ProfileColumn::Email => sort_rows(rows, ascending, |p| p.email.as_ref().map(ToString::to_string)),
        ProfileColumn::Role => sort_rows(rows, ascending, |p| Some(p.role.as_str())),
        ProfileColumn::RollNumber => sort_rows(rows, ascending, |p| p.roll_number.clone()),
        ProfileColumn::CreatedAt => sort_rows(rows, ascending, |p| Some(p.created_at)),
        ProfileColumn::UpdatedAt => sort_rows(rows, ascending, |p| Some(p.updated_at)),
    }
}
