//! Authorisation and execution for the table proxy.
//!
//! [`DataCommand::parse`] has already restricted tables, columns and
//! payloads. This service decides what the caller may touch:
//!
//! - reads of `feedbacks` are scoped the same way as the feedback listing;
//! - non-admins only write their own rows and cannot change `role` or
//!   `is_verified`;
//! - deletes are admin-only.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::feedback_service::scoped_selection;
use super::ports::{DataProxyCommand, FeedbackRepository, ProfileRepository, UserRepository};
use super::service_errors::{
    caller_profile, map_feedback_error, map_profile_error, map_user_error,
};
use super::{
    DataCommand, DataOutcome, Error, FeedbackColumn, FeedbackContent, FeedbackFilter,
    FeedbackId, FeedbackPatch, FeedbackScope, NewFeedback, NewProfile, Profile, ProfileFilter,
    ProfilePatch, Role, Selection, UserId,
};

/// Table proxy service implementing [`DataProxyCommand`].
#[derive(Clone)]
pub struct DataProxyService<U, P, F> {
    users: Arc<U>,
    profiles: Arc<P>,
    feedbacks: Arc<F>,
    clock: Arc<dyn Clock>,
}

impl<U, P, F> DataProxyService<U, P, F> {
    pub fn new(users: Arc<U>, profiles: Arc<P>, feedbacks: Arc<F>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            profiles,
            feedbacks,
            clock,
        }
    }
}

/// Who is calling, resolved once per command.
struct Caller {
    id: UserId,
    role: Option<Role>,
}

impl Caller {
    fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    fn is_staff(&self) -> bool {
        self.role.is_some_and(Role::is_staff)
    }

    fn require_admin(&self) -> Result<(), Error> {
        match self.role {
            Some(Role::Admin) => Ok(()),
            Some(_) => Err(Error::forbidden("Forbidden - admin only")),
            None => Err(Error::forbidden("Forbidden")),
        }
    }
}

fn rows<T: Serialize>(items: &[T], single: bool) -> Result<DataOutcome, Error> {
    let mut values = items
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()
        .map_err(|err| Error::internal(format!("failed to serialise row: {err}")))?;
    if single {
        return Ok(DataOutcome::Row(
            (!values.is_empty()).then(|| values.swap_remove(0)),
        ));
    }
    Ok(DataOutcome::Rows(values))
}

fn row<T: Serialize>(item: &T) -> Result<DataOutcome, Error> {
    serde_json::to_value(item)
        .map(|value| DataOutcome::Row(Some(value)))
        .map_err(|err| Error::internal(format!("failed to serialise row: {err}")))
}

impl<U, P, F> DataProxyService<U, P, F>
where
    U: UserRepository,
    P: ProfileRepository,
    F: FeedbackRepository,
{
    async fn insert_profile(
        &self,
        caller: &Caller,
        id: Option<UserId>,
        profile: NewProfile,
    ) -> Result<DataOutcome, Error> {
        let id = id.unwrap_or_else(|| caller.id.clone());
        let mut profile = profile.normalised();
        if !caller.is_admin() {
            if id != caller.id || profile.role == Role::Admin {
                return Err(Error::forbidden("Forbidden"));
            }
            profile.is_verified = false;
        }
        let stored = profile.into_profile(id, self.clock.utc());
        self.profiles
            .insert(&stored)
            .await
            .map_err(map_profile_error)?;
        info!(profile_id = %stored.id, by = %caller.id, "profile created through proxy");
        row(&stored)
    }

    async fn update_profiles(
        &self,
        caller: &Caller,
        mut filters: Vec<ProfileFilter>,
        patch: ProfilePatch,
    ) -> Result<DataOutcome, Error> {
        if !caller.is_admin() {
            if patch.escalates_privilege() {
                return Err(Error::forbidden("Forbidden"));
            }
            filters.push(ProfileFilter::Id(caller.id.clone()));
        }
        let count = self
            .profiles
            .update(&filters, &patch, self.clock.utc())
            .await
            .map_err(map_profile_error)?;
        Ok(DataOutcome::Count { count })
    }

    async fn insert_feedback(
        &self,
        caller: &Caller,
        owner: Option<UserId>,
        content: FeedbackContent,
        attachment_url: Option<String>,
    ) -> Result<DataOutcome, Error> {
        if owner.is_some_and(|owner| owner != caller.id) {
            return Err(Error::forbidden("Forbidden"));
        }
        let feedback = NewFeedback {
            user_id: caller.id.clone(),
            content: content.validated()?,
            attachment_url,
        }
        .into_feedback(FeedbackId::random(), self.clock.utc());
        self.feedbacks
            .insert(&feedback)
            .await
            .map_err(map_feedback_error)?;
        row(&feedback)
    }

    async fn update_feedbacks(
        &self,
        caller: &Caller,
        mut filters: Vec<FeedbackFilter>,
        patch: FeedbackPatch,
    ) -> Result<DataOutcome, Error> {
        if !caller.is_admin() {
            filters.push(FeedbackFilter::UserId(caller.id.clone()));
        }
        let patch = FeedbackPatch {
            content: patch.content.map(FeedbackContent::validated).transpose()?,
            attachment_url: patch.attachment_url,
        };
        let count = self
            .feedbacks
            .update(&filters, &patch, self.clock.utc())
            .await
            .map_err(map_feedback_error)?;
        Ok(DataOutcome::Count { count })
    }

    async fn select_feedbacks(
        &self,
        caller: &Caller,
        selection: Selection<FeedbackFilter, FeedbackColumn>,
        single: bool,
    ) -> Result<DataOutcome, Error> {
        let scope = if caller.is_staff() {
            FeedbackScope::All
        } else {
            FeedbackScope::OwnedBy(caller.id.clone())
        };
        let defaults = scoped_selection(scope);
        let scoped = Selection {
            filters: selection.filters.into_iter().chain(defaults.filters).collect(),
            order: selection.order.or(defaults.order),
        };
        let found = self
            .feedbacks
            .select(&scoped)
            .await
            .map_err(map_feedback_error)?;
        rows(&found, single)
    }
}

#[async_trait]
impl<U, P, F> DataProxyCommand for DataProxyService<U, P, F>
where
    U: UserRepository,
    P: ProfileRepository,
    F: FeedbackRepository,
{
    async fn execute(&self, caller: &UserId, command: DataCommand) -> Result<DataOutcome, Error> {
        let profile: Option<Profile> = caller_profile(self.profiles.as_ref(), caller).await?;
        let caller = Caller {
            id: caller.clone(),
            role: profile.map(|profile| profile.role),
        };

        match command {
            DataCommand::SelectProfiles { selection, single } => {
                let found = self
                    .profiles
                    .select(&selection)
                    .await
                    .map_err(map_profile_error)?;
                rows(&found, single)
            }
            DataCommand::InsertProfile { id, profile } => {
                self.insert_profile(&caller, id, profile).await
            }
            DataCommand::UpdateProfiles { filters, patch } => {
                self.update_profiles(&caller, filters, patch).await
            }
            DataCommand::DeleteProfiles { filters } => {
                caller.require_admin()?;
                let count = self
                    .profiles
                    .delete(&filters)
                    .await
                    .map_err(map_profile_error)?;
                info!(count, by = %caller.id, "profiles deleted through proxy");
                Ok(DataOutcome::Count { count })
            }
            DataCommand::SelectFeedbacks { selection, single } => {
                self.select_feedbacks(&caller, selection, single).await
            }
            DataCommand::InsertFeedback {
                user_id,
                content,
                attachment_url,
            } => {
                self.insert_feedback(&caller, user_id, content, attachment_url)
                    .await
            }
            DataCommand::UpdateFeedbacks { filters, patch } => {
                self.update_feedbacks(&caller, filters, patch).await
            }
            DataCommand::DeleteFeedbacks { filters } => {
                caller.require_admin()?;
                let count = self
                    .feedbacks
                    .delete(&filters)
                    .await
                    .map_err(map_feedback_error)?;
                info!(count, by = %caller.id, "feedbacks deleted through proxy");
                Ok(DataOutcome::Count { count })
            }
            DataCommand::SelectUsers { selection, single } => {
                let found = self
                    .users
                    .select(&selection)
                    .await
                    .map_err(map_user_error)?;
                rows(&found, single)
            }
        }
    }
}

#[cfg(test)]
mod tests;
