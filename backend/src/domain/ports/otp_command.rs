//! Driving port for issuing and checking email passcodes.

use async_trait::async_trait;

use crate::domain::{EmailAddress, Error, OtpCode};

/// Result of issuing a passcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpDispatch {
    /// The code itself, echoed back only in development mode.
    pub dev_code: Option<OtpCode>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpCommand: Send + Sync {
    /// Issue a fresh code for `email`, replacing any previous one.
    async fn send(&self, email: EmailAddress, name: Option<String>) -> Result<OtpDispatch, Error>;

    /// Check `code` for `email` and mark the challenge verified.
    async fn verify(&self, email: &EmailAddress, code: &OtpCode) -> Result<(), Error>;
}
