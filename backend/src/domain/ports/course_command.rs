//! Driving ports for the catalogue and semester registration.

use async_trait::async_trait;

use crate::domain::{Course, CourseRegistration, Error, RegistrationRequest, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseCommand: Send + Sync {
    async fn register(
        &self,
        caller: &UserId,
        request: RegistrationRequest,
    ) -> Result<CourseRegistration, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseQuery: Send + Sync {
    /// Every course, ordered by code.
    async fn catalogue(&self) -> Result<Vec<Course>, Error>;

    /// The caller's registrations, newest first.
    async fn registrations(&self, caller: &UserId) -> Result<Vec<CourseRegistration>, Error>;
}
