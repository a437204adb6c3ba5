//! Builders for the HTTP state over PostgreSQL or in-memory adapters.

use std::sync::Arc;

use color_eyre::eyre::{Report, Result, WrapErr, eyre};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use portal::PortalSettings;
use portal::domain::ports::{
    AttachmentStore, CourseRepository, FeedbackRepository, OtpNotifier, OtpRepository,
    PasswordHasher, ProfileRepository, UserRepository,
};
use portal::domain::{DEV_ACCOUNT_EMAIL, Error, seed_course_catalogue, seed_dev_account};
use portal::inbound::http::state::{Adapters, HttpState};
use portal::outbound::credentials::BcryptPasswordHasher;
use portal::outbound::memory::MemoryStore;
use portal::outbound::notifier::LogOtpNotifier;
use portal::outbound::persistence::{
    DbPool, DieselCourseRepository, DieselFeedbackRepository, DieselOtpRepository,
    DieselProfileRepository, DieselUserRepository,
};
use portal::outbound::storage::DirAttachmentStore;

fn startup_error(error: Error) -> Report {
    eyre!("{error}")
}

/// Seed startup data through the adapters, then build every service.
async fn seeded_state<U, P, F, O, C, H, N, S>(
    adapters: Adapters<U, P, F, O, C, H, N, S>,
    settings: &PortalSettings,
    clock: Arc<dyn Clock>,
) -> Result<HttpState>
where
    U: UserRepository + 'static,
    P: ProfileRepository + 'static,
    F: FeedbackRepository + 'static,
    O: OtpRepository + 'static,
    C: CourseRepository + 'static,
    H: PasswordHasher + 'static,
    N: OtpNotifier + 'static,
    S: AttachmentStore + 'static,
{
    seed_course_catalogue(adapters.courses.as_ref())
        .await
        .map_err(startup_error)
        .wrap_err("failed to seed the course catalogue")?;
    if settings.seed_dev_account {
        let created = seed_dev_account(
            adapters.users.as_ref(),
            adapters.hasher.as_ref(),
            clock.utc(),
        )
        .await
        .map_err(startup_error)
        .wrap_err("failed to seed the development account")?;
        if created {
            warn!(email = DEV_ACCOUNT_EMAIL, "development account created");
        }
    }
    Ok(adapters.into_state(settings.service_settings(), clock))
}

/// Build the HTTP state, using Diesel repositories when a pool is available
/// and a process-local [`MemoryStore`] otherwise.
///
/// # Errors
///
/// Returns an error when the upload directory cannot be opened or startup
/// seeding fails.
pub(crate) async fn build_http_state(
    settings: &PortalSettings,
    db_pool: Option<&DbPool>,
) -> Result<HttpState> {
    let upload_dir = settings.upload_dir();
    let attachments = Arc::new(
        DirAttachmentStore::open(&upload_dir)
            .wrap_err_with(|| format!("failed to open upload directory {}", upload_dir.display()))?,
    );
    let hasher = Arc::new(BcryptPasswordHasher::default());
    let notifier = Arc::new(LogOtpNotifier);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    match db_pool {
        Some(pool) => {
            let adapters = Adapters {
                users: Arc::new(DieselUserRepository::new(pool.clone())),
                profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
                feedbacks: Arc::new(DieselFeedbackRepository::new(pool.clone())),
                otps: Arc::new(DieselOtpRepository::new(pool.clone())),
                courses: Arc::new(DieselCourseRepository::new(pool.clone())),
                hasher,
                notifier,
                attachments,
            };
            seeded_state(adapters, settings, clock).await
        }
        None => {
            warn!("no database configured; data lives in memory and is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let adapters = Adapters {
                users: store.clone(),
                profiles: store.clone(),
                feedbacks: store.clone(),
                otps: store.clone(),
                courses: store,
                hasher,
                notifier,
                attachments,
            };
            let state = seeded_state(adapters, settings, clock).await?;
            info!("in-memory adapters ready");
            Ok(state)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Start-up wiring over the in-memory adapters.
    use super::*;
    use portal::domain::ports::{AuthCommand, CourseQuery};
    use portal::domain::{DEV_ACCOUNT_PASSWORD, SignInCredentials};
    use rstest::rstest;
    use tempfile::TempDir;

    fn memory_settings(uploads: &TempDir, seed_dev_account: bool) -> PortalSettings {
        PortalSettings {
            bind_addr: None,
            database_url: None,
            upload_dir: Some(uploads.path().join("uploads")),
            otp_ttl_secs: None,
            otp_dev_mode: false,
            require_otp: false,
            email_domain: None,
            seed_dev_account,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn memory_state_starts_with_the_catalogue() {
        let uploads = TempDir::new().expect("temp dir");
        let state = build_http_state(&memory_settings(&uploads, false), None)
            .await
            .expect("state");

        let courses = state.courses_query.catalogue().await.expect("catalogue");
        assert_eq!(courses.len(), 25);
        assert!(uploads.path().join("uploads").is_dir());
    }

    #[rstest]
    #[tokio::test]
    async fn seeded_development_account_can_sign_in() {
        let uploads = TempDir::new().expect("temp dir");
        let state = build_http_state(&memory_settings(&uploads, true), None)
            .await
            .expect("state");

        let credentials =
            SignInCredentials::try_from_parts(DEV_ACCOUNT_EMAIL, DEV_ACCOUNT_PASSWORD)
                .expect("credentials");
        let user = state.auth.sign_in(&credentials).await.expect("signed in");
        assert_eq!(user.email().as_ref(), DEV_ACCOUNT_EMAIL);
    }
}
