//! Start-up seeding: the course catalogue and the optional development
//! account.

use chrono::{DateTime, Utc};
use tracing::info;

use super::ports::{CourseRepository, NewAccount, PasswordHasher, UserRepository};
use super::service_errors::{map_course_error, map_hash_error, map_user_error};
use super::{EmailAddress, Error, NewProfile, Password, Role, User, UserId, seed_catalogue};

pub const DEV_ACCOUNT_EMAIL: &str = "test.student@nitm.ac.in";
pub const DEV_ACCOUNT_PASSWORD: &str = "testpass123";
pub const DEV_ACCOUNT_ROLL_NUMBER: &str = "b22cs999";
pub const DEV_ACCOUNT_DEPARTMENT: &str = "Computer Science";

/// Insert any catalogue course the repository does not hold yet.
///
/// Returns the number of courses inserted.
pub async fn seed_course_catalogue<C>(courses: &C) -> Result<usize, Error>
where
    C: CourseRepository + ?Sized,
{
    let inserted = courses
        .seed(&seed_catalogue())
        .await
        .map_err(map_course_error)?;
    info!(inserted, "course catalogue seeded");
    Ok(inserted)
}

/// Create the development student account unless its email is taken.
///
/// Returns whether an account was created.
pub async fn seed_dev_account<U, H>(users: &U, hasher: &H, now: DateTime<Utc>) -> Result<bool, Error>
where
    U: UserRepository + ?Sized,
    H: PasswordHasher + ?Sized,
{
    let email = EmailAddress::syntactic(DEV_ACCOUNT_EMAIL)
        .map_err(|err| Error::internal(format!("invalid development email: {err}")))?;
    if users
        .find_by_email(&email)
        .await
        .map_err(map_user_error)?
        .is_some()
    {
        return Ok(false);
    }

    let password = Password::new(DEV_ACCOUNT_PASSWORD)
        .map_err(|err| Error::internal(format!("invalid development password: {err}")))?;
    let password_hash = hasher.hash(&password).await.map_err(map_hash_error)?;
    let account = NewAccount {
        user: User::new(UserId::random(), email.clone()),
        password_hash,
        profile: NewProfile {
            name: Some("Test Student".to_owned()),
            email: Some(email),
            role: Role::Student,
            department: Some(DEV_ACCOUNT_DEPARTMENT.to_owned()),
            roll_number: Some(DEV_ACCOUNT_ROLL_NUMBER.to_owned()),
            is_verified: true,
            ..NewProfile::default()
        },
        created_at: now,
    };
    users.create_account(&account).await.map_err(map_user_error)?;
    info!(email = DEV_ACCOUNT_EMAIL, "development account created");
    Ok(true)
}
