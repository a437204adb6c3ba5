//! Port error mapping shared by the services.
//!
//! Connection failures surface as `service_unavailable`; anything else an
//! adapter reports is an internal error.

use serde_json::json;

use super::ports::{
    AttachmentStoreError, CourseRepositoryError, FeedbackRepositoryError, OtpNotifierError,
    OtpRepositoryError, PasswordHashError, ProfileRepository, ProfileRepositoryError,
    UserPersistenceError,
};
use super::{Error, Profile, RegistrationRejection, Role, UserId};

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => Error::invalid_request("User exists"),
    }
}

pub(crate) fn map_profile_error(error: ProfileRepositoryError) -> Error {
    match error {
        ProfileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("profile repository unavailable: {message}"))
        }
        ProfileRepositoryError::Query { message } => {
            Error::internal(format!("profile repository error: {message}"))
        }
        ProfileRepositoryError::Duplicate { id } => {
            Error::conflict(format!("profile {id} already exists"))
        }
        ProfileRepositoryError::MissingUser { id } => {
            Error::invalid_request(format!("no account exists for profile {id}"))
        }
    }
}

pub(crate) fn map_feedback_error(error: FeedbackRepositoryError) -> Error {
    match error {
        FeedbackRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("feedback repository unavailable: {message}"))
        }
        FeedbackRepositoryError::Query { message } => {
            Error::internal(format!("feedback repository error: {message}"))
        }
    }
}

pub(crate) fn map_otp_error(error: OtpRepositoryError) -> Error {
    match error {
        OtpRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("otp repository unavailable: {message}"))
        }
        OtpRepositoryError::Query { message } => {
            Error::internal(format!("otp repository error: {message}"))
        }
    }
}

pub(crate) fn map_notifier_error(error: OtpNotifierError) -> Error {
    match error {
        OtpNotifierError::Delivery { message } => {
            Error::service_unavailable(format!("otp delivery unavailable: {message}"))
        }
    }
}

pub(crate) fn map_course_error(error: CourseRepositoryError) -> Error {
    match error {
        CourseRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("course repository unavailable: {message}"))
        }
        CourseRepositoryError::Query { message } => {
            Error::internal(format!("course repository error: {message}"))
        }
        CourseRepositoryError::UnknownCourse { code } => {
            RegistrationRejection::UnknownCourse { code }.into()
        }
        CourseRepositoryError::CourseFull { code } => {
            RegistrationRejection::CourseFull { code }.into()
        }
        CourseRepositoryError::AlreadyRegistered => {
            Error::invalid_request("Already registered for this term").with_details(json!({
                "field": "semester",
                "code": "already_registered",
            }))
        }
    }
}

pub(crate) fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

pub(crate) fn map_attachment_error(error: AttachmentStoreError) -> Error {
    match error {
        AttachmentStoreError::Io { message } => {
            Error::internal(format!("attachment storage error: {message}"))
        }
        AttachmentStoreError::NotFound { name } => {
            Error::not_found(format!("attachment {name} not found"))
        }
    }
}

/// Profile of the caller, or `None` when they have none.
pub(crate) async fn caller_profile<P>(profiles: &P, caller: &UserId) -> Result<Option<Profile>, Error>
where
    P: ProfileRepository + ?Sized,
{
    profiles.find(caller).await.map_err(map_profile_error)
}

/// Role of the caller; callers without a profile are treated as students.
pub(crate) async fn caller_role<P>(profiles: &P, caller: &UserId) -> Result<Role, Error>
where
    P: ProfileRepository + ?Sized,
{
    Ok(caller_profile(profiles, caller)
        .await?
        .map(|profile| profile.role)
        .unwrap_or_default())
}
