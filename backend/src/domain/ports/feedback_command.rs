//! Driving ports for feedback submissions and staff analysis.

use async_trait::async_trait;

use crate::domain::{
    Error, Feedback, FeedbackAnalysis, FeedbackContent, FeedbackId, FeedbackPatch, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackCommand: Send + Sync {
    /// Store a new submission owned by `caller`.
    async fn submit(
        &self,
        caller: &UserId,
        content: FeedbackContent,
        attachment_url: Option<String>,
    ) -> Result<Feedback, Error>;

    /// Update a submission if `caller` owns it; returns the number of rows
    /// changed.
    async fn amend(
        &self,
        caller: &UserId,
        id: FeedbackId,
        patch: FeedbackPatch,
    ) -> Result<usize, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackQuery: Send + Sync {
    /// Submissions visible to `caller`, newest first.
    async fn visible_to(&self, caller: &UserId) -> Result<Vec<Feedback>, Error>;

    /// Ratings grouped by course and instructor. Staff only.
    async fn analysis(&self, caller: &UserId) -> Result<FeedbackAnalysis, Error>;

    /// Submissions naming `instructor`, narrowed to those entries. Staff
    /// only; without a name the caller's own profile name is used.
    async fn for_instructor(
        &self,
        caller: &UserId,
        instructor: Option<String>,
    ) -> Result<Vec<Feedback>, Error>;

    /// Submissions owned by `student`. Students may only read their own.
    async fn by_student(&self, caller: &UserId, student: &UserId) -> Result<Vec<Feedback>, Error>;
}
