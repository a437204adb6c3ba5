//! Authentication primitives: sign-in credentials and sign-up requests.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use serde_json::json;
use zeroize::Zeroizing;

use super::{
    EmailAddress, EmailPolicy, Error, NewProfile, OtpCode, OtpValidationError, UserValidationError,
};

/// Shortest accepted password, in bytes.
pub const PASSWORD_MIN_BYTES: usize = 8;
/// Longest accepted password, in bytes. bcrypt ignores anything past this.
pub const PASSWORD_MAX_BYTES: usize = 72;

/// Domain error returned when authentication payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthValidationError {
    /// Email or password was missing or blank.
    #[error("Missing credentials")]
    MissingCredentials,
    /// Email failed syntax or domain checks.
    #[error("{0}")]
    Email(#[from] UserValidationError),
    /// Password length falls outside the accepted range.
    #[error("password must be between {min} and {max} bytes")]
    PasswordLength { min: usize, max: usize },
    /// Supplied OTP was not six digits.
    #[error("{0}")]
    Otp(#[from] OtpValidationError),
}

impl AuthValidationError {
    /// Name of the request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "credentials",
            Self::Email(_) => "email",
            Self::PasswordLength { .. } => "password",
            Self::Otp(_) => "otpCode",
        }
    }

    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing",
            Self::Email(UserValidationError::ForeignDomain { .. }) => "foreign_domain",
            Self::Email(_) => "malformed",
            Self::PasswordLength { .. } => "length",
            Self::Otp(_) => "malformed",
        }
    }
}

/// Password accepted for a new account.
///
/// The text is wiped from memory when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Check the byte length and wrap the password.
    pub fn new(raw: &str) -> Result<Self, AuthValidationError> {
        if raw.is_empty() {
            return Err(AuthValidationError::MissingCredentials);
        }
        if !(PASSWORD_MIN_BYTES..=PASSWORD_MAX_BYTES).contains(&raw.len()) {
            return Err(AuthValidationError::PasswordLength {
                min: PASSWORD_MIN_BYTES,
                max: PASSWORD_MAX_BYTES,
            });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Plain-text password for hashing.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(**redacted**)")
    }
}

/// Outcome of sign-in input parsing.
///
/// A malformed email cannot match any account, so it is reported the same way
/// as an unknown one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignInValidationError {
    #[error("Missing credentials")]
    MissingCredentials,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Validated sign-in credentials.
///
/// ## Invariants
/// - `email` is syntactically valid and lower-cased.
/// - `password` is non-empty but keeps caller whitespace.
///
/// # Examples
/// ```
/// use portal::domain::SignInCredentials;
///
/// let creds = SignInCredentials::try_from_parts("Test.Student@nitm.ac.in", "password123").unwrap();
/// assert_eq!(creds.email().as_ref(), "test.student@nitm.ac.in");
/// assert_eq!(creds.password(), "password123");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl SignInCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, SignInValidationError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SignInValidationError::MissingCredentials);
        }
        let email = EmailAddress::syntactic(email)
            .map_err(|_| SignInValidationError::InvalidCredentials)?;
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl std::fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Raw sign-up inputs as received from an adapter.
#[derive(Clone, Default)]
pub struct SignUpParts<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub profile: NewProfile,
    pub otp_code: Option<&'a str>,
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpRequest {
    email: EmailAddress,
    password: Password,
    profile: NewProfile,
    otp_code: Option<OtpCode>,
}

impl SignUpRequest {
    /// Validate raw inputs against the configured email policy.
    pub fn try_new(parts: SignUpParts<'_>, policy: &EmailPolicy) -> Result<Self, AuthValidationError> {
        if parts.email.trim().is_empty() || parts.password.is_empty() {
            return Err(AuthValidationError::MissingCredentials);
        }
        let email = EmailAddress::parse(parts.email, policy)?;
        let password = Password::new(parts.password)?;
        let otp_code = parts
            .otp_code
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(OtpCode::parse)
            .transpose()?;
        let mut profile = parts.profile.normalised();
        profile.email = Some(email.clone());
        Ok(Self {
            email,
            password,
            profile,
            otp_code,
        })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn password(&self) -> &Password {
        &self.password
    }

    pub fn profile(&self) -> &NewProfile {
        &self.profile
    }

    pub fn otp_code(&self) -> Option<&OtpCode> {
        self.otp_code.as_ref()
    }
}

impl From<AuthValidationError> for Error {
    fn from(error: AuthValidationError) -> Self {
        Self::invalid_request(error.to_string()).with_details(json!({
            "field": error.field(),
            "code": error.reason(),
        }))
    }
}

impl From<SignInValidationError> for Error {
    fn from(error: SignInValidationError) -> Self {
        Self::invalid_request(error.to_string())
    }
}
