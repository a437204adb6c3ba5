//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed portal entities used by the API and
//! persistence layers, and the services that implement the driving ports.
//! Types document their invariants and serialisation contracts in Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, Profile, Role: accounts and their portal role.
//! - Feedback, FeedbackContent: questionnaire submissions.
//! - Course, CourseRegistration: catalogue and semester sign-up.
//! - DataCommand: validated table proxy requests.

pub mod attachment;
pub mod attachment_service;
pub mod auth;
pub mod auth_service;
pub mod bootstrap;
pub mod course;
pub mod course_service;
pub mod data_proxy;
pub mod data_proxy_service;
pub mod error;
pub mod feedback;
pub mod feedback_analysis;
pub mod feedback_service;
pub mod otp;
pub mod otp_service;
pub mod payload_digest;
pub mod ports;
pub mod profile;
mod service_errors;
#[cfg(test)]
pub(crate) mod test_fixtures;
pub mod trace_id;
pub mod user;

pub use self::attachment::{
    ATTACHMENT_URL_PREFIX, AttachmentError, AttachmentName, MAX_ATTACHMENT_BYTES,
};
pub use self::attachment_service::AttachmentService;
pub use self::auth::{
    AuthValidationError, PASSWORD_MAX_BYTES, PASSWORD_MIN_BYTES, Password, SignInCredentials,
    SignInValidationError, SignUpParts, SignUpRequest,
};
pub use self::auth_service::{AuthService, AuthSettings};
pub use self::bootstrap::{
    DEV_ACCOUNT_DEPARTMENT, DEV_ACCOUNT_EMAIL, DEV_ACCOUNT_PASSWORD, DEV_ACCOUNT_ROLL_NUMBER,
    seed_course_catalogue, seed_dev_account,
};
pub use self::course::{
    Course, CourseRegistration, MAX_SEMESTER_CREDITS, NewRegistration, RegistrationParts,
    RegistrationRejection, RegistrationRequest, seed_catalogue,
};
pub use self::course_service::CourseService;
pub use self::data_proxy::{
    DataCommand, DataFilterInput, DataOperation, DataOrderInput, DataOrderOptions, DataOutcome,
    DataProxyError, DataRequest, DataTable, FeedbackColumn, FeedbackFilter, Ordering,
    ProfileColumn, ProfileFilter, Selection, UserColumn, UserFilter,
};
pub use self::data_proxy_service::DataProxyService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::feedback::{
    FEEDBACK_QUESTIONS, Feedback, FeedbackContent, FeedbackId, FeedbackPatch, FeedbackScope,
    FeedbackValidationError, InstructorFeedback, MAX_COMMENT_CHARS, MAX_INSTRUCTORS,
    NewFeedback, QUESTION_COUNT, instructor_matches,
};
pub use self::feedback_analysis::{FeedbackAnalysis, InstructorRatingSummary, analyse_feedback};
pub use self::feedback_service::FeedbackService;
pub use self::otp::{OTP_MAX, OTP_MIN, OtpChallenge, OtpCode, OtpValidationError};
pub use self::otp_service::{OtpService, OtpSettings};
pub use self::payload_digest::digest_payload;
pub use self::profile::{NewProfile, Profile, ProfilePatch, Role, UnknownRole};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{EmailAddress, EmailPolicy, User, UserAccount, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use portal::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
