//! bcrypt-backed password hashing.
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::Password;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Work factor for new hashes.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// `PasswordHasher` implementation using `bcrypt`.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &Password) -> Result<String, PasswordHashError> {
        let secret = Zeroizing::new(password.expose().to_owned());
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(secret.as_str(), cost))
            .await
            .map_err(|err| PasswordHashError::hash(err.to_string()))?
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    async fn verify(&self, candidate: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let secret = Zeroizing::new(candidate.to_owned());
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(secret.as_str(), &hash))
            .await
            .map_err(|err| PasswordHashError::verify(err.to_string()))?;
        match outcome {
            Ok(matched) => Ok(matched),
            // A malformed stored hash can never match.
            Err(bcrypt::BcryptError::InvalidHash(_)) => Ok(false),
            Err(err) => Err(PasswordHashError::verify(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    // Minimum cost keeps the tests fast.
    const TEST_COST: u32 = 4;

    #[rstest]
    #[tokio::test]
    async fn hashes_verify_against_the_original() {
        let hasher = BcryptPasswordHasher::new(TEST_COST);
        let password = Password::new("correct horse").expect("valid password");

        let hash = hasher.hash(&password).await.expect("hash");
        assert_ne!(hash, "correct horse");
        assert!(hasher.verify("correct horse", &hash).await.expect("verify"));
        assert!(!hasher.verify("wrong horse", &hash).await.expect("verify"));
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_hashes_never_match() {
        let hasher = BcryptPasswordHasher::new(TEST_COST);
        assert!(!hasher.verify("anything", "not-a-hash").await.expect("verify"));
    }

    #[rstest]
    fn default_cost_is_ten() {
        assert_eq!(BcryptPasswordHasher::default().cost, 10);
    }
}
