//! Port for the course catalogue and registrations.
use async_trait::async_trait;

use crate::domain::{Course, CourseRegistration, NewRegistration, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by course repository adapters.
    pub enum CourseRepositoryError {
        Connection { message: String } => "course repository connection failed: {message}",
        Query { message: String } => "course repository query failed: {message}",
        /// A course was missing when the registration was written.
        UnknownCourse { code: String } => "course {code} is not offered",
        /// A course filled up before the registration was written.
        CourseFull { code: String } => "course {code} is full",
        /// The user already holds a registration for the term.
        AlreadyRegistered => "registration already exists for this term",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Insert catalogue entries whose code is not yet present.
    ///
    /// Returns how many entries were added.
    async fn seed(&self, courses: &[Course]) -> Result<usize, CourseRepositoryError>;

    /// Every course, ordered by code.
    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Reserve a seat in every chosen course and store the registration as
    /// one unit.
    async fn register(
        &self,
        registration: &NewRegistration,
    ) -> Result<CourseRegistration, CourseRepositoryError>;

    /// Registrations held by `user`, newest first.
    async fn registrations_for(
        &self,
        user: &UserId,
    ) -> Result<Vec<CourseRegistration>, CourseRepositoryError>;
}
