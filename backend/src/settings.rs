//! Portal configuration loaded via OrthoConfig.
//!
//! Values come from `--flags`, `PORTAL_*` environment variables or a config
//! file, in that order of precedence.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{AuthSettings, EmailPolicy, OtpSettings};
use crate::inbound::http::state::ServiceSettings;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_OTP_TTL_SECS: u32 = 600;
const DEFAULT_EMAIL_DOMAIN: &str = "nitm.ac.in";

/// Runtime settings for the portal server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct PortalSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection string; in-memory adapters are used without one.
    pub database_url: Option<String>,
    /// Directory attachments are written to.
    pub upload_dir: Option<PathBuf>,
    /// Lifetime of an issued OTP, in seconds.
    pub otp_ttl_secs: Option<u32>,
    /// Return issued OTPs from `send-otp` instead of relying on delivery.
    #[ortho_config(default = false)]
    pub otp_dev_mode: bool,
    /// Refuse sign-up without a valid OTP.
    #[ortho_config(default = false)]
    pub require_otp: bool,
    /// Institutional email domain; an empty value admits any domain.
    pub email_domain: Option<String>,
    /// Create the development student account at startup.
    #[ortho_config(default = false)]
    pub seed_dev_account: bool,
}

impl PortalSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)))
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR))
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::seconds(i64::from(
            self.otp_ttl_secs.unwrap_or(DEFAULT_OTP_TTL_SECS),
        ))
    }

    pub fn email_policy(&self) -> EmailPolicy {
        EmailPolicy::from_domain(Some(
            self.email_domain.as_deref().unwrap_or(DEFAULT_EMAIL_DOMAIN),
        ))
    }

    /// Service switches derived from these settings.
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            auth: AuthSettings {
                require_otp: self.require_otp,
            },
            otp: OtpSettings {
                ttl: self.otp_ttl(),
                dev_mode: self.otp_dev_mode,
            },
            email_policy: self.email_policy(),
        }
    }
}
