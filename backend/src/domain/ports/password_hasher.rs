//! Port for one-way password hashing.
use async_trait::async_trait;

use crate::domain::Password;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        Hash { message: String } => "password hashing failed: {message}",
        Verify { message: String } => "password verification failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted hash suitable for storage.
    async fn hash(&self, password: &Password) -> Result<String, PasswordHashError>;

    /// Check a candidate password against a stored hash.
    async fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
