//! PostgreSQL-backed `FeedbackRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::Bool;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{FeedbackRepository, FeedbackRepositoryError};
use crate::domain::{
    Feedback, FeedbackColumn, FeedbackContent, FeedbackFilter, FeedbackPatch, Selection,
};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{FeedbackChangeset, FeedbackRow};
use super::pool::{DbPool, PoolError};
use super::schema::feedbacks;

type Predicate = Box<dyn BoxableExpression<feedbacks::table, Pg, SqlType = Bool>>;

/// Diesel-backed implementation of the `FeedbackRepository` port.
#[derive(Clone)]
pub struct DieselFeedbackRepository {
    pool: DbPool,
}

impl DieselFeedbackRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> FeedbackRepositoryError {
    map_basic_pool_error(error, FeedbackRepositoryError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> FeedbackRepositoryError {
    map_basic_diesel_error(
        error,
        FeedbackRepositoryError::query,
        FeedbackRepositoryError::connection,
    )
}

fn predicate(filter: &FeedbackFilter) -> Predicate {
    match filter {
        FeedbackFilter::Id(id) => Box::new(feedbacks::id.eq(*id.as_uuid())),
        FeedbackFilter::UserId(user) => Box::new(feedbacks::user_id.eq(*user.as_uuid())),
    }
}

fn combined(filters: &[FeedbackFilter]) -> Option<Predicate> {
    filters
        .iter()
        .map(predicate)
        .reduce(|left, right| Box::new(left.and(right)))
}

fn require_filters(filters: &[FeedbackFilter]) -> Result<Predicate, FeedbackRepositoryError> {
    combined(filters).ok_or_else(|| FeedbackRepositoryError::query("refusing to write every feedback"))
}

#[async_trait]
impl FeedbackRepository for DieselFeedbackRepository {
    async fn insert(&self, feedback: &Feedback) -> Result<(), FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(feedbacks::table)
            .values(FeedbackRow::from(feedback))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(&err))
    }

    async fn select(
        &self,
        selection: &Selection<FeedbackFilter, FeedbackColumn>,
    ) -> Result<Vec<Feedback>, FeedbackRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = feedbacks::table
            .select(FeedbackRow::as_select())
            .into_boxed();
        if let Some(predicate) = combined(&selection.filters) {
            query = query.filter(predicate);
        }
        if let Some(order) = selection.order {
            query = match (order.column, order.ascending) {
                (FeedbackColumn::CreatedAt, true) => query.order_by(feedbacks::created_at.asc()),
                (FeedbackColumn::CreatedAt, false) => query.order_by(feedbacks::created_at.desc()),
                (FeedbackColumn::UpdatedAt, true) => query.order_by(feedbacks::updated_at.asc()),
                (FeedbackColumn::UpdatedAt, false) => query.order_by(feedbacks::updated_at.desc()),
            };
        }
        let rows: Vec<FeedbackRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(rows.into_iter().map(Feedback::from).collect())
    }

    async fn update(
        &self,
        filters: &[FeedbackFilter],
        patch: &FeedbackPatch,
        now: DateTime<Utc>,
    ) -> Result<usize, FeedbackRepositoryError> {
        let predicate = require_filters(filters)?;
        let changes = FeedbackChangeset {
            content: patch.content.as_ref().map(FeedbackContent::to_value),
            attachment_url: patch.attachment_url.as_deref(),
            updated_at: now,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(feedbacks::table.filter(predicate))
            .set(changes)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))
    }

    async fn delete(&self, filters: &[FeedbackFilter]) -> Result<usize, FeedbackRepositoryError> {
        let predicate = require_filters(filters)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(feedbacks::table.filter(predicate))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for query construction.
    use super::*;
    use crate::domain::{FeedbackId, UserId};
    use diesel::debug_query;
    use rstest::rstest;

    #[rstest]
    fn owner_and_id_filters_are_combined() {
        let predicate = combined(&[
            FeedbackFilter::Id(FeedbackId::random()),
            FeedbackFilter::UserId(UserId::random()),
        ])
        .expect("filters present");
        let sql = debug_query::<Pg, _>(&feedbacks::table.select(feedbacks::id).filter(predicate))
            .to_string();
        assert!(sql.contains("\"feedbacks\".\"id\" = $1"));
        assert!(sql.contains("\"feedbacks\".\"user_id\" = $2"));
    }

    #[rstest]
    fn unfiltered_deletes_are_refused() {
        assert!(matches!(
            require_filters(&[]),
            Err(FeedbackRepositoryError::Query { .. })
        ));
    }
}
