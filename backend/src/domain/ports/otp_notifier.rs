//! Port for delivering one-time passcodes to their owner.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{EmailAddress, OtpCode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by OTP delivery adapters.
    pub enum OtpNotifierError {
        Delivery { message: String } => "otp delivery failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn deliver(
        &self,
        email: &EmailAddress,
        name: Option<String>,
        code: &OtpCode,
        expires_at: DateTime<Utc>,
    ) -> Result<(), OtpNotifierError>;
}
