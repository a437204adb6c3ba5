//! PostgreSQL-backed `CourseRepository` implementation using Diesel ORM.
//!
//! Registration locks the selected course rows, re-checks seats, stores the
//! registration and bumps the enrolment counters in a single transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{CourseRepository, CourseRepositoryError};
use crate::domain::{Course, CourseRegistration, NewRegistration, UserId};

use super::diesel_error_mapping::{map_basic_diesel_error, map_basic_pool_error, unique_violation};
use super::models::{CourseRow, RegistrationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{course_registrations, courses};

const TERM_CONSTRAINT: &str = "course_registrations_term_key";

/// Diesel-backed implementation of the `CourseRepository` port.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Error raised inside the registration transaction.
#[derive(Debug)]
enum RegisterFailure {
    Diesel(diesel::result::Error),
    Rejected(CourseRepositoryError),
}

impl From<diesel::result::Error> for RegisterFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> CourseRepositoryError {
    map_basic_pool_error(error, CourseRepositoryError::connection)
}

fn map_diesel_error(error: &diesel::result::Error) -> CourseRepositoryError {
    map_basic_diesel_error(
        error,
        CourseRepositoryError::query,
        CourseRepositoryError::connection,
    )
}

fn map_register_failure(failure: RegisterFailure) -> CourseRepositoryError {
    match failure {
        RegisterFailure::Rejected(error) => error,
        RegisterFailure::Diesel(error) => match unique_violation(&error) {
            Some(TERM_CONSTRAINT) => CourseRepositoryError::AlreadyRegistered,
            _ => map_diesel_error(&error),
        },
    }
}

/// Check locked rows against the requested codes, in request order.
fn check_seats(codes: &[String], locked: &[CourseRow]) -> Result<(), CourseRepositoryError> {
    for code in codes {
        let row = locked
            .iter()
            .find(|row| &row.code == code)
            .ok_or_else(|| CourseRepositoryError::unknown_course(code.clone()))?;
        if row.enrolled >= row.capacity {
            return Err(CourseRepositoryError::course_full(code.clone()));
        }
    }
    Ok(())
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn seed(&self, catalogue: &[Course]) -> Result<usize, CourseRepositoryError> {
        let rows: Vec<CourseRow> = catalogue.iter().map(CourseRow::from).collect();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(courses::table)
            .values(&rows)
            .on_conflict(courses::code)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))
    }

    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CourseRow> = courses::table
            .select(CourseRow::as_select())
            .order_by(courses::code.asc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(rows.into_iter().map(Course::from).collect())
    }

    async fn register(
        &self,
        registration: &NewRegistration,
    ) -> Result<CourseRegistration, CourseRepositoryError> {
        let stored = CourseRegistration::from(registration.clone());
        let row = RegistrationRow::from(&stored);
        let codes = stored.course_codes.clone();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let locked: Vec<CourseRow> = courses::table
                    .filter(courses::code.eq_any(&codes))
                    .select(CourseRow::as_select())
                    .for_update()
                    .load(conn)
                    .await?;
                check_seats(&codes, &locked).map_err(RegisterFailure::Rejected)?;

                diesel::insert_into(course_registrations::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                let bumped = diesel::update(courses::table.filter(courses::code.eq_any(&codes)))
                    .set(courses::enrolled.eq(courses::enrolled + 1))
                    .execute(conn)
                    .await?;
                debug!(bumped, "course enrolment incremented");
                Ok::<_, RegisterFailure>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_register_failure)?;

        Ok(stored)
    }

    async fn registrations_for(
        &self,
        user: &UserId,
    ) -> Result<Vec<CourseRegistration>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RegistrationRow> = course_registrations::table
            .filter(course_registrations::user_id.eq(*user.as_uuid()))
            .select(RegistrationRow::as_select())
            .order_by(course_registrations::created_at.desc())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(&err))?;
        Ok(rows.into_iter().map(CourseRegistration::from).collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for seat checks and error mapping.
    use super::*;
    use crate::domain::seed_catalogue;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use rstest::{fixture, rstest};

    #[derive(Debug)]
    struct ConstraintInfo(&'static str);

    impl DatabaseErrorInformation for ConstraintInfo {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("course_registrations")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[fixture]
    fn rows() -> Vec<CourseRow> {
        seed_catalogue().iter().map(CourseRow::from).collect()
    }

    fn codes(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|code| (*code).to_owned()).collect()
    }

    #[rstest]
    fn open_courses_pass(rows: Vec<CourseRow>) {
        assert!(check_seats(&codes(&["CS201", "MATH101"]), &rows).is_ok());
    }

    #[rstest]
    fn vanished_courses_are_unknown(rows: Vec<CourseRow>) {
        let err = check_seats(&codes(&["CS999"]), &rows).expect_err("unknown");
        assert!(matches!(err, CourseRepositoryError::UnknownCourse { code } if code == "CS999"));
    }

    #[rstest]
    fn full_rows_are_rejected(mut rows: Vec<CourseRow>) {
        let row = rows
            .iter_mut()
            .find(|row| row.code == "CS350")
            .expect("catalogue entry");
        row.enrolled = row.capacity;
        let err = check_seats(&codes(&["CS201", "CS350"]), &rows).expect_err("full");
        assert!(matches!(err, CourseRepositoryError::CourseFull { code } if code == "CS350"));
    }

    #[rstest]
    #[case(TERM_CONSTRAINT, true)]
    #[case("course_registrations_pkey", false)]
    fn term_violations_mean_already_registered(#[case] constraint: &'static str, #[case] dup: bool) {
        let failure = RegisterFailure::Diesel(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(ConstraintInfo(constraint)),
        ));
        let mapped = map_register_failure(failure);
        assert_eq!(
            matches!(mapped, CourseRepositoryError::AlreadyRegistered),
            dup
        );
    }
}
