//! One-time passcodes used to prove ownership of an email address.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use super::EmailAddress;

/// Smallest code ever issued.
pub const OTP_MIN: u32 = 100_000;
/// Largest code ever issued.
pub const OTP_MAX: u32 = 999_999;

/// Errors raised while parsing a caller-supplied code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpValidationError {
    #[error("otp code must be six digits")]
    Malformed,
}

/// Six-digit passcode.
///
/// # Examples
/// ```
/// use portal::domain::OtpCode;
///
/// let code = OtpCode::parse(" 123456 ").unwrap();
/// assert_eq!(code.as_ref(), "123456");
/// assert!(OtpCode::parse("012345").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "483920")]
pub struct OtpCode(String);

impl OtpCode {
    /// Draw a code uniformly from `OTP_MIN..=OTP_MAX`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(OTP_MIN..=OTP_MAX).to_string())
    }

    /// Parse a caller-supplied code.
    pub fn parse(raw: &str) -> Result<Self, OtpValidationError> {
        let trimmed = raw.trim();
        let value: u32 = trimmed
            .parse()
            .ok()
            .filter(|_| trimmed.len() == 6 && trimmed.bytes().all(|b| b.is_ascii_digit()))
            .ok_or(OtpValidationError::Malformed)?;
        if !(OTP_MIN..=OTP_MAX).contains(&value) {
            return Err(OtpValidationError::Malformed);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for OtpCode {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// Stored verification row. One live row per email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub email: EmailAddress,
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub verified: bool,
}

impl OtpChallenge {
    /// Issue a fresh challenge valid for `ttl` from `now`.
    pub fn issue(email: EmailAddress, code: OtpCode, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            email,
            code,
            expires_at: now + ttl,
            created_at: now,
            verified: false,
        }
    }

    /// A challenge is spent once its expiry has been reached.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether `candidate` matches and the challenge is still live.
    pub fn accepts(&self, candidate: &OtpCode, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.code == *candidate
    }
}
