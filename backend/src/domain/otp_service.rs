//! One-time password issue and verification.
//!
//! Each email has at most one live challenge. Issuing a new code replaces the
//! previous row; verifying marks it so sign-up can consume it later. A code
//! verifies once; sending a new one starts over.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use tracing::{debug, info};

use super::ports::{OtpCommand, OtpDispatch, OtpNotifier, OtpRepository};
use super::service_errors::{map_notifier_error, map_otp_error};
use super::{EmailAddress, Error, OtpChallenge, OtpCode};

/// Message returned for every failed verification.
pub const INVALID_OTP_MESSAGE: &str = "Invalid or expired OTP";

/// Behaviour switches for [`OtpService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpSettings {
    /// How long an issued code stays valid.
    pub ttl: Duration,
    /// Echo the code back to the caller instead of relying on delivery.
    pub dev_mode: bool,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(10),
            dev_mode: false,
        }
    }
}

pub(crate) fn invalid_otp() -> Error {
    Error::invalid_request(INVALID_OTP_MESSAGE)
        .with_details(serde_json::json!({ "field": "otpCode", "code": "invalid_otp" }))
}

/// OTP service implementing [`OtpCommand`].
#[derive(Clone)]
pub struct OtpService<R, N> {
    otp_repo: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    settings: OtpSettings,
}

impl<R, N> OtpService<R, N> {
    pub fn new(
        otp_repo: Arc<R>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
        settings: OtpSettings,
    ) -> Self {
        Self {
            otp_repo,
            notifier,
            clock,
            settings,
        }
    }
}

#[async_trait]
impl<R, N> OtpCommand for OtpService<R, N>
where
    R: OtpRepository,
    N: OtpNotifier,
{
    async fn send(&self, email: EmailAddress, name: Option<String>) -> Result<OtpDispatch, Error> {
        let code = OtpCode::generate(&mut rand::thread_rng());
        let challenge =
            OtpChallenge::issue(email, code.clone(), self.clock.utc(), self.settings.ttl);

        self.otp_repo
            .replace(&challenge)
            .await
            .map_err(map_otp_error)?;
        self.notifier
            .deliver(&challenge.email, name, &code, challenge.expires_at)
            .await
            .map_err(map_notifier_error)?;
        info!(email = %challenge.email, expires_at = %challenge.expires_at, "otp issued");

        Ok(OtpDispatch {
            dev_code: self.settings.dev_mode.then_some(code),
        })
    }

    async fn verify(&self, email: &EmailAddress, code: &OtpCode) -> Result<(), Error> {
        let now = self.clock.utc();
        let Some(challenge) = self.otp_repo.find(email).await.map_err(map_otp_error)? else {
            return Err(invalid_otp());
        };

        if challenge.is_expired(now) {
            self.otp_repo.delete(email).await.map_err(map_otp_error)?;
            debug!(%email, "expired otp removed");
            return Err(invalid_otp());
        }
        if !challenge.accepts(code, now) {
            return Err(invalid_otp());
        }
        if challenge.verified {
            debug!(%email, "otp already verified");
            return Err(invalid_otp());
        }

        self.otp_repo
            .mark_verified(email)
            .await
            .map_err(map_otp_error)
    }
}
