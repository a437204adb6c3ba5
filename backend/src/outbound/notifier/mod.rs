//! OTP delivery adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::ports::{OtpNotifier, OtpNotifierError};
use crate::domain::{EmailAddress, OtpCode};

/// Writes each code to the structured log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOtpNotifier;

#[async_trait]
impl OtpNotifier for LogOtpNotifier {
    async fn deliver(
        &self,
        email: &EmailAddress,
        name: Option<String>,
        code: &OtpCode,
        expires_at: DateTime<Utc>,
    ) -> Result<(), OtpNotifierError> {
        info!(
            target: "portal::otp",
            email = %email,
            name = name.as_deref().unwrap_or_default(),
            otp = code.as_ref(),
            expires_at = %expires_at.to_rfc3339(),
            "otp issued"
        );
        Ok(())
    }
}
