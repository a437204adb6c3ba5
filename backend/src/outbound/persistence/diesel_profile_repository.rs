//! PostgreSQL-backed `ProfileRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ProfileRepository, ProfileRepositoryError};
use crate::domain::{Profile, ProfileColumn, ProfileFilter, ProfilePatch, Selection, UserId};

use super::diesel_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error, unique_violation,
};
use super::models::{ProfileChangeset, ProfileRow};
use super::pool::{DbPool, PoolError};
use super::schema::profiles;

type Predicate = Box<dyn BoxableExpression<profiles::table, Pg, SqlType = Bool>>;

/// Diesel-backed implementation of the `ProfileRepository` port.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProfileRepositoryError {
    map_basic_pool_error(error, ProfileRepositoryError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> ProfileRepositoryError {
    map_basic_diesel_error(
        error,
        ProfileRepositoryError::query,
        ProfileRepositoryError::connection,
    )
}

fn predicate(filter: &ProfileFilter) -> Predicate {
    match filter {
        ProfileFilter::Id(id) => Box::new(profiles::id.eq(*id.as_uuid())),
        ProfileFilter::Email(email) => {
            Box::new(profiles::email.assume_not_null().eq(email.to_string()))
        }
        ProfileFilter::Role(role) => Box::new(profiles::role.eq(role.as_str())),
        ProfileFilter::Department(value) => {
            Box::new(profiles::department.assume_not_null().eq(value.clone()))
        }
        ProfileFilter::RollNumber(value) => {
            Box::new(profiles::roll_number.assume_not_null().eq(value.clone()))
        }
        ProfileFilter::FacultyId(value) => {
            Box::new(profiles::faculty_id.assume_not_null().eq(value.clone()))
        }
        ProfileFilter::AdminId(value) => {
            Box::new(profiles::admin_id.assume_not_null().eq(value.clone()))
        }
        ProfileFilter::IsVerified(flag) => Box::new(profiles::is_verified.eq(*flag)),
    }
}

/// Conjunction of every filter, or `None` when there are none.
fn combined(filters: &[ProfileFilter]) -> Option<Predicate> {
    filters
        .iter()
        .map(predicate)
        .reduce(|left, right| Box::new(left.and(right)))
}

fn require_filters(filters: &[ProfileFilter]) -> Result<Predicate, ProfileRepositoryError> {
    combined(filters).ok_or_else(|| ProfileRepositoryError::query("refusing to write every profile"))
}

fn convert_rows(rows: Vec<ProfileRow>) -> Result<Vec<Profile>, ProfileRepositoryError> {
    rows.into_iter()
        .map(Profile::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(ProfileRepositoryError::query)
}

fn changeset(patch: &ProfilePatch, now: DateTime<Utc>) -> ProfileChangeset<'_> {
    ProfileChangeset {
        name: patch.name.as_deref(),
        email: patch.email.as_ref().map(AsRef::as_ref),
        role: patch.role.map(|role| role.as_str()),
        department: patch.department.as_deref(),
        roll_number: patch.roll_number.as_deref(),
        faculty_id: patch.faculty_id.as_deref(),
        admin_id: patch.admin_id.as_deref(),
        is_verified: patch.is_verified,
        updated_at: now,
    }
}

#[async_trait]
impl ProfileRepository for DieselProfileRepository {
    async fn find(&self, id: &UserId) -> Result<Option<Profile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ProfileRow> = profiles::table
            .filter(profiles::id.eq(*id.as_uuid()))
            .select(ProfileRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        row.map(Profile::try_from)
            .transpose()
            .map_err(ProfileRepositoryError::query)
    }

    async fn insert(&self, profile: &Profile) -> Result<(), ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(profiles::table)
            .values(ProfileRow::from(profile))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if unique_violation(&err).is_some() {
                    ProfileRepositoryError::duplicate(profile.id.to_string())
                } else if is_foreign_key_violation(&err) {
                    ProfileRepositoryError::missing_user(profile.id.to_string())
                } else {
                    map_diesel_error(&err)
                }
            })
    }

    async fn select(
        &self,
        selection: &Selection<ProfileFilter, ProfileColumn>,
    ) -> Result<Vec<Profile>, ProfileRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = profiles::table
            .select(ProfileRow::as_select())
            .into_boxed();
        if let Some(predicate) = combined(&selection.filters) {
            query = query.filter(predicate);
        }
        if let Some(order) = selection.order {
            query = match (order.column, order.ascending) {
                (ProfileColumn::Name, true) => query.order_by(profiles::name.asc()),
                (ProfileColumn::Name, false) => query.order_by(profiles::name.desc()),
                (ProfileColumn::Email, true) => query.order_by(profiles::email.asc()),
                (ProfileColumn::Email, false) => query.order_by(profiles::email.desc()),
                (ProfileColumn::Role, true) => query.order_by(profiles::role.asc()),
                (ProfileColumn::Role, false) => query.order_by(profiles::role.desc()),
                (ProfileColumn::RollNumber, true) => query.order_by(profiles::roll_number.asc()),
                (ProfileColumn::RollNumber, false) => query.order_by(profiles::roll_number.desc()),
                (ProfileColumn::CreatedAt, true) => query.order_by(profiles::created_at.asc()),
                (ProfileColumn::CreatedAt, false) => query.order_by(profiles::created_at.desc()),
                (ProfileColumn::UpdatedAt, true) => query.order_by(profiles::updated_at.asc()),
                (ProfileColumn::UpdatedAt, false) => query.order_by(profiles::updated_at.desc()),
            };
        }
        let rows = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        convert_rows(rows)
    }

    async fn update(
        &self,
        filters: &[ProfileFilter],
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<usize, ProfileRepositoryError> {
        let predicate = require_filters(filters)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(profiles::table.filter(predicate))
            .set(changeset(patch, now))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))
    }

    async fn delete(&self, filters: &[ProfileFilter]) -> Result<usize, ProfileRepositoryError> {
        let predicate = require_filters(filters)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(profiles::table.filter(predicate))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))
    }
}
