//! Port for profile rows.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Profile, ProfileColumn, ProfileFilter, ProfilePatch, Selection, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        Connection { message: String } => "profile repository connection failed: {message}",
        Query { message: String } => "profile repository query failed: {message}",
        /// A profile already exists for the user.
        Duplicate { id: String } => "profile {id} already exists",
        /// No account exists for the profile id.
        MissingUser { id: String } => "no account exists for profile {id}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, id: &UserId) -> Result<Option<Profile>, ProfileRepositoryError>;

    async fn insert(&self, profile: &Profile) -> Result<(), ProfileRepositoryError>;

    async fn select(
        &self,
        selection: &Selection<ProfileFilter, ProfileColumn>,
    ) -> Result<Vec<Profile>, ProfileRepositoryError>;

    /// Apply `patch` to every row matching all filters; returns the row count.
    async fn update(
        &self,
        filters: &[ProfileFilter],
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<usize, ProfileRepositoryError>;

    /// Delete every row matching all filters; returns the row count.
    async fn delete(&self, filters: &[ProfileFilter]) -> Result<usize, ProfileRepositoryError>;
}
