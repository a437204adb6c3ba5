//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions back into domain types are
//! fallible because stored text still has to pass domain validation.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    Course, CourseRegistration, EmailAddress, Feedback, FeedbackId, OtpChallenge, OtpCode, Profile,
    User, UserAccount, UserId,
};

use super::schema::{course_registrations, courses, feedbacks, otp_verifications, profiles, users};

pub(crate) fn count_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(crate) fn count_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

fn email_from_db(raw: &str) -> Result<EmailAddress, String> {
    EmailAddress::syntactic(raw).map_err(|err| format!("stored email {raw:?} is invalid: {err}"))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    #[expect(dead_code, reason = "selected so rows mirror the table")]
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_user(self) -> Result<User, String> {
        Ok(User::new(UserId::from_uuid(self.id), email_from_db(&self.email)?))
    }

    pub(crate) fn into_account(self) -> Result<UserAccount, String> {
        let password_hash = self.password_hash.clone();
        Ok(UserAccount {
            user: self.into_user()?,
            password_hash,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub department: Option<String>,
    pub roll_number: Option<String>,
    pub faculty_id: Option<String>,
    pub admin_id: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Profile> for ProfileRow {
    fn from(profile: &Profile) -> Self {
        Self {
            id: *profile.id.as_uuid(),
            name: profile.name.clone(),
            email: profile.email.as_ref().map(ToString::to_string),
            role: profile.role.as_str().to_owned(),
            department: profile.department.clone(),
            roll_number: profile.roll_number.clone(),
            faculty_id: profile.faculty_id.clone(),
            admin_id: profile.admin_id.clone(),
            is_verified: profile.is_verified,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

impl TryFrom<ProfileRow> for Profile {
    type Error = String;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email.as_deref().map(email_from_db).transpose()?,
            role: row.role.parse().map_err(|err| format!("profile {}: {err}", row.id))?,
            department: row.department,
            roll_number: row.roll_number,
            faculty_id: row.faculty_id,
            admin_id: row.admin_id,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Changeset for profile patches. `None` leaves a column untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = profiles)]
pub(crate) struct ProfileChangeset<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role: Option<&'static str>,
    pub department: Option<&'a str>,
    pub roll_number: Option<&'a str>,
    pub faculty_id: Option<&'a str>,
    pub admin_id: Option<&'a str>,
    pub is_verified: Option<bool>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Feedbacks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = feedbacks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FeedbackRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: Value,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Feedback> for FeedbackRow {
    fn from(feedback: &Feedback) -> Self {
        Self {
            id: *feedback.id.as_uuid(),
            user_id: *feedback.user_id.as_uuid(),
            content: feedback.content.clone(),
            attachment_url: feedback.attachment_url.clone(),
            created_at: feedback.created_at,
            updated_at: feedback.updated_at,
        }
    }
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Self {
            id: FeedbackId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            content: row.content,
            attachment_url: row.attachment_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = feedbacks)]
pub(crate) struct FeedbackChangeset<'a> {
    pub content: Option<Value>,
    pub attachment_url: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// OTP challenges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = otp_verifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OtpRow {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&OtpChallenge> for OtpRow {
    fn from(challenge: &OtpChallenge) -> Self {
        Self {
            email: challenge.email.to_string(),
            code: challenge.code.as_ref().to_owned(),
            expires_at: challenge.expires_at,
            verified: challenge.verified,
            created_at: challenge.created_at,
        }
    }
}

impl TryFrom<OtpRow> for OtpChallenge {
    type Error = String;

    fn try_from(row: OtpRow) -> Result<Self, Self::Error> {
        Ok(Self {
            email: email_from_db(&row.email)?,
            code: OtpCode::parse(&row.code).map_err(|err| format!("stored otp: {err}"))?,
            expires_at: row.expires_at,
            created_at: row.created_at,
            verified: row.verified,
        })
    }
}

// ---------------------------------------------------------------------------
// Courses and registrations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CourseRow {
    pub code: String,
    pub name: String,
    pub credits: i32,
    pub instructor: String,
    pub schedule: String,
    pub prerequisites: Vec<String>,
    pub capacity: i32,
    pub enrolled: i32,
}

impl From<&Course> for CourseRow {
    fn from(course: &Course) -> Self {
        Self {
            code: course.code.clone(),
            name: course.name.clone(),
            credits: count_to_db(course.credits),
            instructor: course.instructor.clone(),
            schedule: course.schedule.clone(),
            prerequisites: course.prerequisites.clone(),
            capacity: count_to_db(course.capacity),
            enrolled: count_to_db(course.enrolled),
        }
    }
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            credits: count_from_db(row.credits),
            instructor: row.instructor,
            schedule: row.schedule,
            prerequisites: row.prerequisites,
            capacity: count_from_db(row.capacity),
            enrolled: count_from_db(row.enrolled),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = course_registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RegistrationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub student_id: String,
    pub student_name: String,
    pub semester: String,
    pub year: String,
    pub course_codes: Vec<String>,
    pub total_credits: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&CourseRegistration> for RegistrationRow {
    fn from(registration: &CourseRegistration) -> Self {
        Self {
            id: registration.id,
            user_id: *registration.user_id.as_uuid(),
            student_id: registration.student_id.clone(),
            student_name: registration.student_name.clone(),
            semester: registration.semester.clone(),
            year: registration.year.clone(),
            course_codes: registration.course_codes.clone(),
            total_credits: count_to_db(registration.total_credits),
            created_at: registration.created_at,
        }
    }
}

impl From<RegistrationRow> for CourseRegistration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            student_id: row.student_id,
            student_name: row.student_name,
            semester: row.semester,
            year: row.year,
            course_codes: row.course_codes,
            total_credits: count_from_db(row.total_credits),
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{Role, seed_catalogue};
    use chrono::TimeZone;
    use rstest::rstest;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    #[case(-1, 0)]
    #[case(0, 0)]
    #[case(18, 18)]
    fn negative_counts_clamp_to_zero(#[case] stored: i32, #[case] expected: u32) {
        assert_eq!(count_from_db(stored), expected);
    }

    #[rstest]
    fn huge_counts_saturate() {
        assert_eq!(count_to_db(u32::MAX), i32::MAX);
    }

    #[rstest]
    fn profile_rows_keep_role_text() {
        let row = ProfileRow {
            id: Uuid::new_v4(),
            name: Some("Dr. Rao".to_owned()),
            email: Some("rao@nitm.ac.in".to_owned()),
            role: "faculty".to_owned(),
            department: None,
            roll_number: None,
            faculty_id: Some("F-17".to_owned()),
            admin_id: None,
            is_verified: true,
            created_at: timestamp(),
            updated_at: timestamp(),
        };

        let profile = Profile::try_from(row.clone()).expect("valid row");
        assert_eq!(profile.role, Role::Faculty);
        assert_eq!(ProfileRow::from(&profile).role, row.role);
    }

    #[rstest]
    fn unknown_roles_are_reported() {
        let row = ProfileRow {
            id: Uuid::new_v4(),
            name: None,
            email: None,
            role: "dean".to_owned(),
            department: None,
            roll_number: None,
            faculty_id: None,
            admin_id: None,
            is_verified: false,
            created_at: timestamp(),
            updated_at: timestamp(),
        };

        assert!(Profile::try_from(row).is_err());
    }

    #[rstest]
    fn course_rows_preserve_catalogue_entries() {
        let course = seed_catalogue().into_iter().next().expect("catalogue entry");
        let restored = Course::from(CourseRow::from(&course));
        assert_eq!(restored, course);
    }
}
