//! Account sign-up and sign-in.
//!
//! Sign-up writes the user and profile together through
//! [`UserRepository::create_account`]. When OTP enforcement is on, the
//! email's live challenge must match the submitted code and is consumed once
//! the account exists.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use super::otp_service::invalid_otp;
use super::ports::{
    AccountQuery, AuthCommand, NewAccount, OtpRepository, PasswordHasher, ProfileRepository,
    UserRepository,
};
use super::service_errors::{map_hash_error, map_otp_error, map_profile_error, map_user_error};
use super::{
    EmailAddress, Error, OtpCode, Profile, SignInCredentials, SignInValidationError,
    SignUpRequest, User, UserId,
};

/// Behaviour switches for [`AuthService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthSettings {
    /// Refuse sign-up unless a live OTP for the email is supplied.
    pub require_otp: bool,
}

/// Authentication service implementing [`AuthCommand`] and [`AccountQuery`].
#[derive(Clone)]
pub struct AuthService<U, P, O, H> {
    users: Arc<U>,
    profiles: Arc<P>,
    otp_repo: Arc<O>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
}

impl<U, P, O, H> AuthService<U, P, O, H> {
    pub fn new(
        users: Arc<U>,
        profiles: Arc<P>,
        otp_repo: Arc<O>,
        hasher: Arc<H>,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            profiles,
            otp_repo,
            hasher,
            clock,
            settings,
        }
    }
}

fn invalid_credentials() -> Error {
    SignInValidationError::InvalidCredentials.into()
}

impl<U, P, O, H> AuthService<U, P, O, H>
where
    U: UserRepository,
    P: ProfileRepository,
    O: OtpRepository,
    H: PasswordHasher,
{
    /// Check the submitted code against the email's live challenge.
    ///
    /// Returns whether a code was checked. An absent code is only accepted
    /// when enforcement is off.
    async fn check_otp(&self, email: &EmailAddress, code: Option<&OtpCode>) -> Result<bool, Error> {
        let Some(code) = code else {
            return if self.settings.require_otp {
                Err(invalid_otp())
            } else {
                Ok(false)
            };
        };

        let challenge = self.otp_repo.find(email).await.map_err(map_otp_error)?;
        match challenge {
            Some(challenge) if challenge.accepts(code, self.clock.utc()) => Ok(true),
            Some(challenge) if challenge.is_expired(self.clock.utc()) => {
                self.otp_repo.delete(email).await.map_err(map_otp_error)?;
                Err(invalid_otp())
            }
            _ => Err(invalid_otp()),
        }
    }
}

#[async_trait]
impl<U, P, O, H> AuthCommand for AuthService<U, P, O, H>
where
    U: UserRepository,
    P: ProfileRepository,
    O: OtpRepository,
    H: PasswordHasher,
{
    async fn sign_up(&self, request: SignUpRequest) -> Result<User, Error> {
        let email = request.email();
        if self
            .users
            .find_by_email(email)
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Err(Error::invalid_request("User exists"));
        }

        let otp_checked = self.check_otp(email, request.otp_code()).await?;
        let password_hash = self
            .hasher
            .hash(request.password())
            .await
            .map_err(map_hash_error)?;

        let mut profile = request.profile().clone();
        profile.is_verified = otp_checked;
        let user = User::new(UserId::random(), email.clone());
        let account = NewAccount {
            user: user.clone(),
            password_hash,
            profile,
            created_at: self.clock.utc(),
        };
        self.users
            .create_account(&account)
            .await
            .map_err(map_user_error)?;

        if otp_checked {
            self.otp_repo.delete(email).await.map_err(map_otp_error)?;
        }
        info!(user_id = %user.id(), role = %account.profile.role, "account created");
        Ok(user)
    }

    async fn sign_in(&self, credentials: &SignInCredentials) -> Result<User, Error> {
        let Some(account) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            return Err(invalid_credentials());
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !matches {
            return Err(invalid_credentials());
        }
        Ok(account.user)
    }
}

#[async_trait]
impl<U, P, O, H> AccountQuery for AuthService<U, P, O, H>
where
    U: UserRepository,
    P: ProfileRepository,
    O: OtpRepository,
    H: PasswordHasher,
{
    async fn current_user(&self, id: &UserId) -> Result<Option<User>, Error> {
        self.users.find_by_id(id).await.map_err(map_user_error)
    }

    async fn profile(&self, id: &UserId) -> Result<Option<Profile>, Error> {
        self.profiles.find(id).await.map_err(map_profile_error)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockOtpRepository, MockPasswordHasher, MockProfileRepository, MockUserRepository,
        UserPersistenceError,
    };
    use crate::domain::test_fixtures::{fixture_clock, fixture_timestamp};
    use crate::domain::{
        EmailPolicy, ErrorCode, NewProfile, OtpChallenge, Role, SignUpParts, UserAccount,
    };
    use chrono::Duration;
    use rstest::rstest;

    type TestService =
        AuthService<MockUserRepository, MockProfileRepository, MockOtpRepository, MockPasswordHasher>;

    fn make_service(
        users: MockUserRepository,
        otp_repo: MockOtpRepository,
        hasher: MockPasswordHasher,
        require_otp: bool,
    ) -> TestService {
        AuthService::new(
            Arc::new(users),
            Arc::new(MockProfileRepository::new()),
            Arc::new(otp_repo),
            Arc::new(hasher),
            fixture_clock(),
            AuthSettings { require_otp },
        )
    }

    fn sign_up_request(otp_code: Option<&str>) -> SignUpRequest {
        SignUpRequest::try_new(
            SignUpParts {
                email: "new.student@nitm.ac.in",
                password: "password123",
                profile: NewProfile {
                    name: Some("New Student".to_owned()),
                    roll_number: Some("b22cs001".to_owned()),
                    ..NewProfile::default()
                },
                otp_code,
            },
            &EmailPolicy::default(),
        )
        .expect("valid request")
    }

    fn hashing() -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .return_once(|_| Ok("$2b$10$hash".to_owned()));
        hasher
    }

    fn live_challenge(raw: &str) -> OtpChallenge {
        OtpChallenge::issue(
            EmailAddress::syntactic("new.student@nitm.ac.in").expect("valid email"),
            OtpCode::parse(raw).expect("valid code"),
            fixture_timestamp() - Duration::minutes(2),
            Duration::minutes(10),
        )
    }

    #[tokio::test]
    async fn sign_up_creates_account_without_otp_when_not_required() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        users
            .expect_create_account()
            .withf(|account| {
                account.password_hash == "$2b$10$hash"
                    && account.profile.role == Role::Student
                    && !account.profile.is_verified
                    && account.created_at == fixture_timestamp()
            })
            .times(1)
            .return_once(|_| Ok(()));
        let mut otp_repo = MockOtpRepository::new();
        otp_repo.expect_delete().never();

        let user = make_service(users, otp_repo, hashing(), false)
            .sign_up(sign_up_request(None))
            .await
            .expect("sign-up succeeds");

        assert_eq!(user.email().as_ref(), "new.student@nitm.ac.in");
    }

    #[tokio::test]
    async fn sign_up_consumes_matching_otp() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        users
            .expect_create_account()
            .withf(|account| account.profile.is_verified)
            .times(1)
            .return_once(|_| Ok(()));
        let mut otp_repo = MockOtpRepository::new();
        otp_repo
            .expect_find()
            .return_once(|_| Ok(Some(live_challenge("482913"))));
        otp_repo.expect_delete().times(1).return_once(|_| Ok(()));

        make_service(users, otp_repo, hashing(), true)
            .sign_up(sign_up_request(Some("482913")))
            .await
            .expect("sign-up succeeds");
    }

    #[rstest]
    #[case(None)]
    #[case(Some("111111"))]
    #[tokio::test]
    async fn sign_up_requires_valid_otp_when_enforced(#[case] code: Option<&'static str>) {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        users.expect_create_account().never();
        let mut otp_repo = MockOtpRepository::new();
        otp_repo
            .expect_find()
            .returning(|_| Ok(Some(live_challenge("482913"))));

        let err = make_service(users, otp_repo, MockPasswordHasher::new(), true)
            .sign_up(sign_up_request(code))
            .await
            .expect_err("otp rejected");

        assert_eq!(err.message(), "Invalid or expired OTP");
    }

    #[tokio::test]
    async fn sign_up_rejects_existing_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|email| {
            Ok(Some(UserAccount {
                user: User::new(UserId::random(), email.clone()),
                password_hash: "$2b$10$hash".to_owned(),
            }))
        });
        users.expect_create_account().never();

        let err = make_service(users, MockOtpRepository::new(), MockPasswordHasher::new(), false)
            .sign_up(sign_up_request(None))
            .await
            .expect_err("duplicate");

        assert_eq!(err.message(), "User exists");
    }

    #[tokio::test]
    async fn sign_up_maps_racing_duplicate_to_user_exists() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        users
            .expect_create_account()
            .return_once(|_| Err(UserPersistenceError::duplicate_email("new.student@nitm.ac.in")));

        let err = make_service(users, MockOtpRepository::new(), hashing(), false)
            .sign_up(sign_up_request(None))
            .await
            .expect_err("duplicate");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "User exists");
    }

    fn stored_account() -> UserAccount {
        UserAccount {
            user: User::new(
                UserId::random(),
                EmailAddress::syntactic("test.student@nitm.ac.in").expect("valid email"),
            ),
            password_hash: "$2b$10$hash".to_owned(),
        }
    }

    #[rstest]
    #[case(true, true)]
    #[case(false, false)]
    #[tokio::test]
    async fn sign_in_checks_password(#[case] password_matches: bool, #[case] succeeds: bool) {
        let account = stored_account();
        let expected = account.user.clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .return_once(move |_| Ok(Some(account)));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_verify()
            .return_once(move |_, _| Ok(password_matches));

        let credentials = SignInCredentials::try_from_parts("test.student@nitm.ac.in", "password123")
            .expect("valid credentials");
        let result = make_service(users, MockOtpRepository::new(), hasher, false)
            .sign_in(&credentials)
            .await;

        match result {
            Ok(user) => {
                assert!(succeeds);
                assert_eq!(user, expected);
            }
            Err(err) => {
                assert!(!succeeds);
                assert_eq!(err.message(), "Invalid credentials");
            }
        }
    }

    #[tokio::test]
    async fn sign_in_hides_unknown_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().never();

        let credentials = SignInCredentials::try_from_parts("ghost@nitm.ac.in", "password123")
            .expect("valid credentials");
        let err = make_service(users, MockOtpRepository::new(), hasher, false)
            .sign_in(&credentials)
            .await
            .expect_err("unknown user");

        assert_eq!(err.message(), "Invalid credentials");
    }
}
