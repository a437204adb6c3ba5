//! Driving ports for sign-up, sign-in and session lookups.
//!
//! Inbound adapters call these to authenticate callers without knowing the
//! backing infrastructure, so handler tests can substitute a double.

use async_trait::async_trait;

use crate::domain::{Error, Profile, SignInCredentials, SignUpRequest, User, UserId};

/// Account creation and credential checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthCommand: Send + Sync {
    /// Create an account and its profile.
    async fn sign_up(&self, request: SignUpRequest) -> Result<User, Error>;

    /// Validate credentials and return the authenticated user.
    async fn sign_in(&self, credentials: &SignInCredentials) -> Result<User, Error>;
}

/// Read access to the signed-in account.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// The user behind a session, if it still exists.
    async fn current_user(&self, id: &UserId) -> Result<Option<User>, Error>;

    /// The user's profile, if one was created.
    async fn profile(&self, id: &UserId) -> Result<Option<Profile>, Error>;
}
