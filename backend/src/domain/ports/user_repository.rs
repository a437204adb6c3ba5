//! Port abstraction for account persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    EmailAddress, NewProfile, Selection, User, UserAccount, UserColumn, UserFilter, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// The email already belongs to another account.
        DuplicateEmail { email: String } => "email {email} is already registered",
    }
}

/// Account and profile written together at sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub user: User,
    pub password_hash: String,
    pub profile: NewProfile,
    pub created_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user and their profile atomically.
    async fn create_account(&self, account: &NewAccount) -> Result<(), UserPersistenceError>;

    /// Fetch an account, including its password hash, by email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// List users matching every filter.
    async fn select(
        &self,
        selection: &Selection<UserFilter, UserColumn>,
    ) -> Result<Vec<User>, UserPersistenceError>;
}
