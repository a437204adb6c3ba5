//! Domain ports for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`) are called by inbound adapters and
//! implemented by the services. Driven ports (repositories, hasher, notifier,
//! attachment store) are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod attachment_command;
mod attachment_store;
mod auth_command;
mod course_command;
mod course_repository;
mod data_proxy_command;
mod feedback_command;
mod feedback_repository;
mod otp_command;
mod otp_notifier;
mod otp_repository;
mod password_hasher;
mod profile_repository;
mod user_repository;

pub use attachment_command::AttachmentCommand;
#[cfg(test)]
pub use attachment_command::MockAttachmentCommand;
#[cfg(test)]
pub use attachment_store::MockAttachmentStore;
pub use attachment_store::{AttachmentStore, AttachmentStoreError};
pub use auth_command::{AccountQuery, AuthCommand};
#[cfg(test)]
pub use auth_command::{MockAccountQuery, MockAuthCommand};
pub use course_command::{CourseCommand, CourseQuery};
#[cfg(test)]
pub use course_command::{MockCourseCommand, MockCourseQuery};
#[cfg(test)]
pub use course_repository::MockCourseRepository;
pub use course_repository::{CourseRepository, CourseRepositoryError};
pub use data_proxy_command::DataProxyCommand;
#[cfg(test)]
pub use data_proxy_command::MockDataProxyCommand;
pub use feedback_command::{FeedbackCommand, FeedbackQuery};
#[cfg(test)]
pub use feedback_command::{MockFeedbackCommand, MockFeedbackQuery};
#[cfg(test)]
pub use feedback_repository::MockFeedbackRepository;
pub use feedback_repository::{FeedbackRepository, FeedbackRepositoryError};
#[cfg(test)]
pub use otp_command::MockOtpCommand;
pub use otp_command::{OtpCommand, OtpDispatch};
#[cfg(test)]
pub use otp_notifier::MockOtpNotifier;
pub use otp_notifier::{OtpNotifier, OtpNotifierError};
#[cfg(test)]
pub use otp_repository::MockOtpRepository;
pub use otp_repository::{OtpRepository, OtpRepositoryError};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{ProfileRepository, ProfileRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{NewAccount, UserPersistenceError, UserRepository};
