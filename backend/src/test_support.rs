//! Test utilities for the portal crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Only compiled for tests or with the `test-support` feature.

use std::io;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tempfile::TempDir;

use crate::domain::{AuthSettings, EmailPolicy, OtpSettings, seed_course_catalogue};
use crate::inbound::http::state::{Adapters, HttpState, ServiceSettings};
use crate::outbound::credentials::BcryptPasswordHasher;
use crate::outbound::memory::MemoryStore;
use crate::outbound::notifier::LogOtpNotifier;
use crate::outbound::storage::DirAttachmentStore;

/// Cheapest cost bcrypt accepts; keeps sign-up fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Switches for a test portal.
#[derive(Debug, Clone)]
pub struct PortalOptions {
    pub require_otp: bool,
    pub otp_dev_mode: bool,
    pub email_domain: Option<String>,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            require_otp: false,
            otp_dev_mode: true,
            email_domain: Some("nitm.ac.in".to_owned()),
        }
    }
}

/// A portal wired over in-memory adapters and a temporary upload directory.
pub struct MemoryPortal {
    pub state: HttpState,
    pub store: MemoryStore,
    /// Kept alive for the portal's lifetime; dropped with it.
    pub uploads: TempDir,
}

/// Build a portal over a fresh [`MemoryStore`] with the catalogue seeded.
///
/// # Errors
///
/// Returns an error when the upload directory cannot be created.
pub async fn memory_portal(options: PortalOptions) -> io::Result<MemoryPortal> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    memory_portal_with_clock(options, clock).await
}

/// As [`memory_portal`], with a caller-supplied clock.
///
/// # Errors
///
/// Returns an error when the upload directory cannot be created.
pub async fn memory_portal_with_clock(
    options: PortalOptions,
    clock: Arc<dyn Clock>,
) -> io::Result<MemoryPortal> {
    let uploads = TempDir::new()?;
    let attachments = DirAttachmentStore::open(uploads.path())?;
    let store = MemoryStore::new();
    seed_course_catalogue(&store)
        .await
        .map_err(|err| io::Error::other(err.to_string()))?;

    let shared = Arc::new(store.clone());
    let adapters = Adapters {
        users: shared.clone(),
        profiles: shared.clone(),
        feedbacks: shared.clone(),
        otps: shared.clone(),
        courses: shared,
        hasher: Arc::new(BcryptPasswordHasher::new(TEST_BCRYPT_COST)),
        notifier: Arc::new(LogOtpNotifier),
        attachments: Arc::new(attachments),
    };
    let settings = ServiceSettings {
        auth: AuthSettings {
            require_otp: options.require_otp,
        },
        otp: OtpSettings {
            dev_mode: options.otp_dev_mode,
            ..OtpSettings::default()
        },
        email_policy: EmailPolicy::from_domain(options.email_domain.as_deref()),
    };
    Ok(MemoryPortal {
        state: adapters.into_state(settings, clock),
        store,
        uploads,
    })
}
