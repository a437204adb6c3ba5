//! PostgreSQL-backed `OtpRepository` implementation using Diesel ORM.
//!
//! One row per email; issuing a new code overwrites the previous challenge.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{OtpRepository, OtpRepositoryError};
use crate::domain::{EmailAddress, OtpChallenge};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::OtpRow;
use super::pool::{DbPool, PoolError};
use super::schema::otp_verifications;

/// Diesel-backed implementation of the `OtpRepository` port.
#[derive(Clone)]
pub struct DieselOtpRepository {
    pool: DbPool,
}

impl DieselOtpRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OtpRepositoryError {
    map_basic_pool_error(error, OtpRepositoryError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> OtpRepositoryError {
    map_basic_diesel_error(
        error,
        OtpRepositoryError::query,
        OtpRepositoryError::connection,
    )
}

#[async_trait]
impl OtpRepository for DieselOtpRepository {
    async fn replace(&self, challenge: &OtpChallenge) -> Result<(), OtpRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(otp_verifications::table)
            .values(OtpRow::from(challenge))
            .on_conflict(otp_verifications::email)
            .do_update()
            .set((
                otp_verifications::code.eq(excluded(otp_verifications::code)),
                otp_verifications::expires_at.eq(excluded(otp_verifications::expires_at)),
                otp_verifications::verified.eq(excluded(otp_verifications::verified)),
                otp_verifications::created_at.eq(excluded(otp_verifications::created_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(&err))
    }

    async fn find(&self, email: &EmailAddress) -> Result<Option<OtpChallenge>, OtpRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OtpRow> = otp_verifications::table
            .filter(otp_verifications::email.eq(email.as_ref()))
            .select(OtpRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(&err))?;
        row.map(OtpChallenge::try_from)
            .transpose()
            .map_err(OtpRepositoryError::query)
    }

    async fn mark_verified(&self, email: &EmailAddress) -> Result<(), OtpRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(otp_verifications::table.filter(otp_verifications::email.eq(email.as_ref())))
            .set(otp_verifications::verified.eq(true))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(&err))
    }

    async fn delete(&self, email: &EmailAddress) -> Result<(), OtpRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(otp_verifications::table.filter(otp_verifications::email.eq(email.as_ref())))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| map_diesel_error(&err))
    }
}
