//! User accounts and the identifiers they are addressed by.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors for user identifiers and email addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must look like name@domain.tld")]
    MalformedEmail,
    #[error("email must belong to the {domain} domain")]
    ForeignDomain { domain: String },
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from text.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        let parsed = Uuid::parse_str(raw).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self::from_uuid(parsed))
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.1
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[expect(clippy::expect_used, reason = "the pattern is a compile-time literal")]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

/// Which email domains may register.
///
/// An institutional policy admits the named domain and its subdomains only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmailPolicy {
    /// Any syntactically valid address.
    #[default]
    AnyDomain,
    /// Addresses under a single institutional domain.
    Institutional(String),
}

impl EmailPolicy {
    /// Build a policy from a configured domain; blank means any domain.
    pub fn from_domain(domain: Option<&str>) -> Self {
        match domain.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => Self::Institutional(value.to_ascii_lowercase()),
            None => Self::AnyDomain,
        }
    }

    fn admits(&self, domain: &str) -> Result<(), UserValidationError> {
        match self {
            Self::AnyDomain => Ok(()),
            Self::Institutional(required) => {
                let suffix = format!(".{required}");
                if domain == required || domain.ends_with(&suffix) {
                    Ok(())
                } else {
                    Err(UserValidationError::ForeignDomain {
                        domain: required.clone(),
                    })
                }
            }
        }
    }
}

/// Lower-cased, syntactically valid email address.
///
/// # Examples
/// ```
/// use portal::domain::{EmailAddress, EmailPolicy};
///
/// let policy = EmailPolicy::from_domain(Some("nitm.ac.in"));
/// let email = EmailAddress::parse(" Test.Student@NITM.ac.in ", &policy).unwrap();
/// assert_eq!(email.as_ref(), "test.student@nitm.ac.in");
/// assert!(EmailAddress::parse("someone@example.com", &policy).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse an address and check it against `policy`.
    pub fn parse(raw: &str, policy: &EmailPolicy) -> Result<Self, UserValidationError> {
        let email = Self::syntactic(raw)?;
        let domain = email
            .0
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .ok_or(UserValidationError::MalformedEmail)?;
        policy.admits(domain)?;
        Ok(email)
    }

    /// Parse an address checking syntax only.
    ///
    /// Used for lookups, where an unknown domain simply finds nothing.
    pub fn syntactic(raw: &str) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !EMAIL_RE.is_match(trimmed) {
            return Err(UserValidationError::MalformedEmail);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::syntactic(&value)
    }
}

/// Public identity of an account: the password hash never leaves storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    #[schema(value_type = String, example = "test.student@nitm.ac.in")]
    email: EmailAddress,
}

impl User {
    /// Build a user from validated parts.
    pub fn new(id: UserId, email: EmailAddress) -> Self {
        Self { id, email }
    }

    /// Stable identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login email.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }
}

/// Stored account including the password hash, as read from persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub user: User,
    pub password_hash: String,
}
