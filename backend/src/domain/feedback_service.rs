//! Feedback submission, listing and analysis.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use super::ports::{FeedbackCommand, FeedbackQuery, FeedbackRepository, ProfileRepository};
use super::service_errors::{caller_profile, caller_role, map_feedback_error};
use super::{
    Error, Feedback, FeedbackAnalysis, FeedbackColumn, FeedbackContent, FeedbackFilter,
    FeedbackId, FeedbackPatch, FeedbackScope, NewFeedback, Ordering, Selection, UserId,
    analyse_feedback,
};

/// Feedback service implementing [`FeedbackCommand`] and [`FeedbackQuery`].
#[derive(Clone)]
pub struct FeedbackService<F, P> {
    feedbacks: Arc<F>,
    profiles: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<F, P> FeedbackService<F, P> {
    pub fn new(feedbacks: Arc<F>, profiles: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            feedbacks,
            profiles,
            clock,
        }
    }
}

/// Newest-first selection over the rows `scope` allows.
pub(crate) fn scoped_selection(scope: FeedbackScope) -> Selection<FeedbackFilter, FeedbackColumn> {
    let filters = match scope {
        FeedbackScope::All => Vec::new(),
        FeedbackScope::OwnedBy(owner) => vec![FeedbackFilter::UserId(owner)],
    };
    Selection {
        filters,
        order: Some(Ordering {
            column: FeedbackColumn::CreatedAt,
            ascending: false,
        }),
    }
}

impl<F, P> FeedbackService<F, P>
where
    F: FeedbackRepository,
    P: ProfileRepository,
{
    async fn scope_for(&self, caller: &UserId) -> Result<FeedbackScope, Error> {
        let role = caller_role(self.profiles.as_ref(), caller).await?;
        Ok(if role.is_staff() {
            FeedbackScope::All
        } else {
            FeedbackScope::OwnedBy(caller.clone())
        })
    }
}

#[async_trait]
impl<F, P> FeedbackCommand for FeedbackService<F, P>
where
    F: FeedbackRepository,
    P: ProfileRepository,
{
    async fn submit(
        &self,
        caller: &UserId,
        content: FeedbackContent,
        attachment_url: Option<String>,
    ) -> Result<Feedback, Error> {
        let feedback = NewFeedback {
            user_id: caller.clone(),
            content: content.validated()?,
            attachment_url,
        }
        .into_feedback(FeedbackId::random(), self.clock.utc());

        self.feedbacks
            .insert(&feedback)
            .await
            .map_err(map_feedback_error)?;
        info!(feedback_id = %feedback.id, user_id = %caller, "feedback submitted");
        Ok(feedback)
    }

    async fn amend(
        &self,
        caller: &UserId,
        id: FeedbackId,
        patch: FeedbackPatch,
    ) -> Result<usize, Error> {
        if patch.is_empty() {
            return Err(Error::invalid_request("Nothing to update"));
        }
        let patch = FeedbackPatch {
            content: patch.content.map(FeedbackContent::validated).transpose()?,
            attachment_url: patch.attachment_url,
        };
        let filters = [FeedbackFilter::Id(id), FeedbackFilter::UserId(caller.clone())];

        self.feedbacks
            .update(&filters, &patch, self.clock.utc())
            .await
            .map_err(map_feedback_error)
    }
}

#[async_trait]
impl<F, P> FeedbackQuery for FeedbackService<F, P>
where
    F: FeedbackRepository,
    P: ProfileRepository,
{
    async fn visible_to(&self, caller: &UserId) -> Result<Vec<Feedback>, Error> {
        let selection = scoped_selection(self.scope_for(caller).await?);
        self.feedbacks
            .select(&selection)
            .await
            .map_err(map_feedback_error)
    }

    async fn analysis(&self, caller: &UserId) -> Result<FeedbackAnalysis, Error> {
        if self.scope_for(caller).await? != FeedbackScope::All {
            return Err(Error::forbidden("Forbidden"));
        }
        let rows = self
            .feedbacks
            .select(&scoped_selection(FeedbackScope::All))
            .await
            .map_err(map_feedback_error)?;
        Ok(analyse_feedback(rows.iter().map(|row| &row.content)))
    }

    async fn for_instructor(
        &self,
        caller: &UserId,
        instructor: Option<String>,
    ) -> Result<Vec<Feedback>, Error> {
        let profile = caller_profile(self.profiles.as_ref(), caller).await?;
        let Some(profile) = profile.filter(|profile| profile.role.is_staff()) else {
            return Err(Error::forbidden("Forbidden"));
        };
        let name = instructor
            .or(profile.name)
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                Error::invalid_request("Instructor name is required")
                    .with_details(json!({ "field": "instructor", "code": "missing_field" }))
            })?;

        let rows = self
            .feedbacks
            .select(&scoped_selection(FeedbackScope::All))
            .await
            .map_err(map_feedback_error)?;
        let matching: Vec<Feedback> = rows
            .iter()
            .filter_map(|row| row.for_instructor(&name))
            .collect();
        debug!(instructor = %name, matches = matching.len(), "instructor feedback read");
        Ok(matching)
    }

    async fn by_student(&self, caller: &UserId, student: &UserId) -> Result<Vec<Feedback>, Error> {
        if caller != student && !caller_role(self.profiles.as_ref(), caller).await?.is_staff() {
            return Err(Error::forbidden("Forbidden"));
        }
        self.feedbacks
            .select(&scoped_selection(FeedbackScope::OwnedBy(student.clone())))
            .await
            .map_err(map_feedback_error)
    }
}
