//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Account creation writes the `users` row and its profile in one
//! transaction so a failed profile insert never leaves a login behind.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{NewAccount, UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, Selection, User, UserAccount, UserColumn, UserFilter, UserId,
};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error, unique_violation};
use super::models::{NewUserRow, ProfileRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{profiles, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> UserPersistenceError {
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn convert_row(row: UserRow) -> Result<User, UserPersistenceError> {
    row.into_user().map_err(UserPersistenceError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create_account(&self, account: &NewAccount) -> Result<(), UserPersistenceError> {
        let user_row = NewUserRow {
            id: *account.user.id().as_uuid(),
            email: account.user.email().as_ref(),
            password_hash: account.password_hash.as_str(),
            created_at: account.created_at,
        };
        let profile_row = ProfileRow::from(
            &account
                .profile
                .clone()
                .into_profile(account.user.id().clone(), account.created_at),
        );

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(users::table)
                    .values(&user_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(profiles::table)
                    .values(&profile_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err: diesel::result::Error| match unique_violation(&err) {
            Some(constraint) => {
                debug!(constraint, "account insert hit a unique constraint");
                UserPersistenceError::duplicate_email(account.user.email().to_string())
            }
            None => map_diesel_error(&err),
        })
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        row.map(UserRow::into_account)
            .transpose()
            .map_err(UserPersistenceError::query)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(*id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        row.map(convert_row).transpose()
    }

    async fn select(
        &self,
        selection: &Selection<UserFilter, UserColumn>,
    ) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = users::table.select(UserRow::as_select()).into_boxed();
        for filter in &selection.filters {
            query = match filter {
                UserFilter::Id(id) => query.filter(users::id.eq(*id.as_uuid())),
                UserFilter::Email(email) => query.filter(users::email.eq(email.to_string())),
            };
        }
        if let Some(order) = selection.order {
            query = match (order.column, order.ascending) {
                (UserColumn::Email, true) => query.order_by(users::email.asc()),
                (UserColumn::Email, false) => query.order_by(users::email.desc()),
                (UserColumn::CreatedAt, true) => query.order_by(users::created_at.asc()),
                (UserColumn::CreatedAt, false) => query.order_by(users::created_at.desc()),
            };
        }
        let rows: Vec<UserRow> = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        rows.into_iter().map(convert_row).collect()
    }
}
