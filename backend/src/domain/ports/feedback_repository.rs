//! Port for feedback submissions.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Feedback, FeedbackColumn, FeedbackFilter, FeedbackPatch, Selection};

use super::define_port_error;

define_port_error! {
    /// Errors raised by feedback repository adapters.
    pub enum FeedbackRepositoryError {
        Connection { message: String } => "feedback repository connection failed: {message}",
        Query { message: String } => "feedback repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    async fn insert(&self, feedback: &Feedback) -> Result<(), FeedbackRepositoryError>;

    async fn select(
        &self,
        selection: &Selection<FeedbackFilter, FeedbackColumn>,
    ) -> Result<Vec<Feedback>, FeedbackRepositoryError>;

    /// Apply `patch` to every row matching all filters; returns the row count.
    async fn update(
        &self,
        filters: &[FeedbackFilter],
        patch: &FeedbackPatch,
        now: DateTime<Utc>,
    ) -> Result<usize, FeedbackRepositoryError>;

    /// Delete every row matching all filters; returns the row count.
    async fn delete(&self, filters: &[FeedbackFilter]) -> Result<usize, FeedbackRepositoryError>;
}
