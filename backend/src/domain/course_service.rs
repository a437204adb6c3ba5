//! Course catalogue and semester registration.
//!
//! The catalogue is checked up front so most rejections never reach storage.
//! The repository repeats the capacity and duplicate checks inside its
//! transaction.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use super::ports::{CourseCommand, CourseQuery, CourseRepository, CourseRepositoryError};
use super::service_errors::map_course_error;
use super::{
    Course, CourseRegistration, Error, NewRegistration, RegistrationRejection,
    RegistrationRequest, UserId,
};

/// Course service implementing [`CourseCommand`] and [`CourseQuery`].
#[derive(Clone)]
pub struct CourseService<C> {
    courses: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<C> CourseService<C> {
    pub fn new(courses: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self { courses, clock }
    }
}

#[async_trait]
impl<C> CourseCommand for CourseService<C>
where
    C: CourseRepository,
{
    async fn register(
        &self,
        caller: &UserId,
        request: RegistrationRequest,
    ) -> Result<CourseRegistration, Error> {
        let catalogue = self.courses.list().await.map_err(map_course_error)?;
        let total_credits = request.check_against(&catalogue)?;
        let (semester, year) = (request.semester.clone(), request.year.clone());
        let registration = NewRegistration {
            id: Uuid::new_v4(),
            user_id: caller.clone(),
            request,
            total_credits,
            created_at: self.clock.utc(),
        };

        let stored = self
            .courses
            .register(&registration)
            .await
            .map_err(|error| match error {
                CourseRepositoryError::AlreadyRegistered => {
                    RegistrationRejection::AlreadyRegistered { semester, year }.into()
                }
                other => map_course_error(other),
            })?;
        info!(
            registration_id = %stored.id,
            user_id = %caller,
            credits = stored.total_credits,
            "courses registered"
        );
        Ok(stored)
    }
}

#[async_trait]
impl<C> CourseQuery for CourseService<C>
where
    C: CourseRepository,
{
    async fn catalogue(&self) -> Result<Vec<Course>, Error> {
        let mut courses = self.courses.list().await.map_err(map_course_error)?;
        courses.sort_by(|left, right| left.code.cmp(&right.code));
        Ok(courses)
    }

    async fn registrations(&self, caller: &UserId) -> Result<Vec<CourseRegistration>, Error> {
        let mut registrations = self
            .courses
            .registrations_for(caller)
            .await
            .map_err(map_course_error)?;
        registrations.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(registrations)
    }
}
