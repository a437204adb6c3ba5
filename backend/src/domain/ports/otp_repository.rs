//! Port for OTP verification rows, keyed by email.
use async_trait::async_trait;

use crate::domain::{EmailAddress, OtpChallenge};

use super::define_port_error;

define_port_error! {
    /// Errors raised by OTP repository adapters.
    pub enum OtpRepositoryError {
        Connection { message: String } => "otp repository connection failed: {message}",
        Query { message: String } => "otp repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Store `challenge`, replacing any existing row for the same email.
    async fn replace(&self, challenge: &OtpChallenge) -> Result<(), OtpRepositoryError>;

    async fn find(&self, email: &EmailAddress) -> Result<Option<OtpChallenge>, OtpRepositoryError>;

    async fn mark_verified(&self, email: &EmailAddress) -> Result<(), OtpRepositoryError>;

    async fn delete(&self, email: &EmailAddress) -> Result<(), OtpRepositoryError>;
}
