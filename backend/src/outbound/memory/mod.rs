//! In-memory adapters used when no database is configured.
//!
//! A single [`MemoryStore`] implements every repository port over one set of
//! tables behind a `Mutex`, so account creation can write the user and the
//! profile together the way the PostgreSQL adapter does in a transaction.

mod selection;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::ports::{
    CourseRepository, CourseRepositoryError, FeedbackRepository, FeedbackRepositoryError,
    NewAccount, OtpRepository, OtpRepositoryError, ProfileRepository, ProfileRepositoryError,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    Course, CourseRegistration, EmailAddress, Feedback, FeedbackColumn, FeedbackFilter,
    FeedbackPatch, NewRegistration, OtpChallenge, Profile, ProfileColumn, ProfileFilter,
    ProfilePatch, Selection, User, UserAccount, UserColumn, UserFilter, UserId,
};

use self::selection::{Matches, sort_profiles, sort_rows};

#[derive(Debug, Clone)]
struct StoredUser {
    account: UserAccount,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<StoredUser>,
    profiles: Vec<Profile>,
    feedbacks: Vec<Feedback>,
    otps: HashMap<String, OtpChallenge>,
    courses: Vec<Course>,
    registrations: Vec<CourseRegistration>,
}

/// Process-local store backing every repository port.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_account(&self, account: &NewAccount) -> Result<(), UserPersistenceError> {
        let mut tables = self.tables();
        let email = account.user.email();
        if tables
            .users
            .iter()
            .any(|stored| stored.account.user.email() == email)
        {
            return Err(UserPersistenceError::duplicate_email(email.to_string()));
        }
        let profile = account
            .profile
            .clone()
            .into_profile(account.user.id().clone(), account.created_at);
        tables.users.push(StoredUser {
            account: UserAccount {
                user: account.user.clone(),
                password_hash: account.password_hash.clone(),
            },
            created_at: account.created_at,
        });
        tables.profiles.push(profile);
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|stored| stored.account.user.email() == email)
            .map(|stored| stored.account.clone()))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|stored| stored.account.user.id() == id)
            .map(|stored| stored.account.user.clone()))
    }

    async fn select(
        &self,
        selection: &Selection<UserFilter, UserColumn>,
    ) -> Result<Vec<User>, UserPersistenceError> {
        let tables = self.tables();
        let mut rows: Vec<&StoredUser> = tables
            .users
            .iter()
            .filter(|stored| selection.filters.iter().all(|f| f.matches(&stored.account.user)))
            .collect();
        if let Some(order) = selection.order {
            match order.column {
                UserColumn::Email => sort_rows(&mut rows, order.ascending, |stored| {
                    Some(stored.account.user.email().to_string())
                }),
                UserColumn::CreatedAt => {
                    sort_rows(&mut rows, order.ascending, |stored| Some(stored.created_at));
                }
            }
        }
        Ok(rows.into_iter().map(|stored| stored.account.user.clone()).collect())
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn find(&self, id: &UserId) -> Result<Option<Profile>, ProfileRepositoryError> {
        Ok(self
            .tables()
            .profiles
            .iter()
            .find(|profile| &profile.id == id)
            .cloned())
    }

    async fn insert(&self, profile: &Profile) -> Result<(), ProfileRepositoryError> {
        let mut tables = self.tables();
        if !tables
            .users
            .iter()
            .any(|stored| stored.account.user.id() == &profile.id)
        {
            return Err(ProfileRepositoryError::missing_user(profile.id.to_string()));
        }
        if tables.profiles.iter().any(|existing| existing.id == profile.id) {
            return Err(ProfileRepositoryError::duplicate(profile.id.to_string()));
        }
        tables.profiles.push(profile.clone());
        Ok(())
    }

    async fn select(
        &self,
        selection: &Selection<ProfileFilter, ProfileColumn>,
    ) -> Result<Vec<Profile>, ProfileRepositoryError> {
        let tables = self.tables();
        let mut rows: Vec<&Profile> = tables
            .profiles
            .iter()
            .filter(|profile| selection.filters.iter().all(|f| f.matches(*profile)))
            .collect();
        if let Some(order) = selection.order {
            sort_profiles(&mut rows, order.column, order.ascending);
        }
        Ok(rows.into_iter().cloned().collect())
    }

    async fn update(
        &self,
        filters: &[ProfileFilter],
        patch: &ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<usize, ProfileRepositoryError> {
        if filters.is_empty() {
            return Err(ProfileRepositoryError::query("refusing to write every profile"));
        }
        let mut tables = self.tables();
        let mut count = 0;
        for profile in tables
            .profiles
            .iter_mut()
            .filter(|profile| filters.iter().all(|f| f.matches(&**profile)))
        {
            patch.apply_to(profile, now);
            count += 1;
        }
        Ok(count)
    }

    async fn delete(&self, filters: &[ProfileFilter]) -> Result<usize, ProfileRepositoryError> {
        if filters.is_empty() {
            return Err(ProfileRepositoryError::query("refusing to write every profile"));
        }
        let mut tables = self.tables();
        let before = tables.profiles.len();
        tables
            .profiles
            .retain(|profile| !filters.iter().all(|f| f.matches(profile)));
        Ok(before - tables.profiles.len())
    }
}

// ---------------------------------------------------------------------------
// Feedbacks
// ---------------------------------------------------------------------------

#[async_trait]
impl FeedbackRepository for MemoryStore {
    async fn insert(&self, feedback: &Feedback) -> Result<(), FeedbackRepositoryError> {
        self.tables().feedbacks.push(feedback.clone());
        Ok(())
    }

    async fn select(
        &self,
        selection: &Selection<FeedbackFilter, FeedbackColumn>,
    ) -> Result<Vec<Feedback>, FeedbackRepositoryError> {
        let tables = self.tables();
        let mut rows: Vec<&Feedback> = tables
            .feedbacks
            .iter()
            .filter(|feedback| selection.filters.iter().all(|f| f.matches(*feedback)))
            .collect();
        if let Some(order) = selection.order {
            match order.column {
                FeedbackColumn::CreatedAt => {
                    sort_rows(&mut rows, order.ascending, |feedback| Some(feedback.created_at));
                }
                FeedbackColumn::UpdatedAt => {
                    sort_rows(&mut rows, order.ascending, |feedback| Some(feedback.updated_at));
                }
            }
        }
        Ok(rows.into_iter().cloned().collect())
    }

    async fn update(
        &self,
        filters: &[FeedbackFilter],
        patch: &FeedbackPatch,
        now: DateTime<Utc>,
    ) -> Result<usize, FeedbackRepositoryError> {
        if filters.is_empty() {
            return Err(FeedbackRepositoryError::query("refusing to write every feedback"));
        }
        let mut tables = self.tables();
        let mut count = 0;
        for feedback in tables
            .feedbacks
            .iter_mut()
            .filter(|feedback| filters.iter().all(|f| f.matches(&**feedback)))
        {
            patch.apply_to(feedback, now);
            count += 1;
        }
        Ok(count)
    }

    async fn delete(&self, filters: &[FeedbackFilter]) -> Result<usize, FeedbackRepositoryError> {
        if filters.is_empty() {
            return Err(FeedbackRepositoryError::query("refusing to write every feedback"));
        }
        let mut tables = self.tables();
        let before = tables.feedbacks.len();
        tables
            .feedbacks
            .retain(|feedback| !filters.iter().all(|f| f.matches(feedback)));
        Ok(before - tables.feedbacks.len())
    }
}

// ---------------------------------------------------------------------------
// OTP challenges
// ---------------------------------------------------------------------------

#[async_trait]
impl OtpRepository for MemoryStore {
    async fn replace(&self, challenge: &OtpChallenge) -> Result<(), OtpRepositoryError> {
        self.tables()
            .otps
            .insert(challenge.email.to_string(), challenge.clone());
        Ok(())
    }

    async fn find(&self, email: &EmailAddress) -> Result<Option<OtpChallenge>, OtpRepositoryError> {
        Ok(self.tables().otps.get(email.as_ref()).cloned())
    }

    async fn mark_verified(&self, email: &EmailAddress) -> Result<(), OtpRepositoryError> {
        if let Some(challenge) = self.tables().otps.get_mut(email.as_ref()) {
            challenge.verified = true;
        }
        Ok(())
    }

    async fn delete(&self, email: &EmailAddress) -> Result<(), OtpRepositoryError> {
        self.tables().otps.remove(email.as_ref());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn seed(&self, catalogue: &[Course]) -> Result<usize, CourseRepositoryError> {
        let mut tables = self.tables();
        let mut inserted = 0;
        for course in catalogue {
            if tables.courses.iter().all(|existing| existing.code != course.code) {
                tables.courses.push(course.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut courses = self.tables().courses.clone();
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(courses)
    }

    async fn register(
        &self,
        registration: &NewRegistration,
    ) -> Result<CourseRegistration, CourseRepositoryError> {
        let mut tables = self.tables();
        let request = &registration.request;
        for code in &request.course_codes {
            let course = tables
                .courses
                .iter()
                .find(|course| &course.code == code)
                .ok_or_else(|| CourseRepositoryError::unknown_course(code.clone()))?;
            if course.is_full() {
                return Err(CourseRepositoryError::course_full(code.clone()));
            }
        }
        if tables.registrations.iter().any(|existing| {
            existing.user_id == registration.user_id
                && existing.semester == request.semester
                && existing.year == request.year
        }) {
            return Err(CourseRepositoryError::AlreadyRegistered);
        }
        for course in tables
            .courses
            .iter_mut()
            .filter(|course| request.course_codes.contains(&course.code))
        {
            course.enrolled += 1;
        }
        let stored = CourseRegistration::from(registration.clone());
        tables.registrations.push(stored.clone());
        debug!(id = %stored.id, "registration stored in memory");
        Ok(stored)
    }

    async fn registrations_for(
        &self,
        user: &UserId,
    ) -> Result<Vec<CourseRegistration>, CourseRepositoryError> {
        let mut rows: Vec<CourseRegistration> = self
            .tables()
            .registrations
            .iter()
            .filter(|registration| &registration.user_id == user)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests;
