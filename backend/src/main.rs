//! Portal entry-point: loads settings, prepares storage and serves the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use portal::PortalSettings;
use portal::inbound::http::health::HealthState;
use portal::inbound::http::session_config::{BuildMode, session_settings_from_env};
use portal::outbound::persistence::{DbPool, PoolConfig, run_migrations};

use server::{ServerConfig, build_http_state, create_server};

/// Apply migrations, then open the connection pool.
async fn connect(database_url: &str) -> Result<DbPool> {
    run_migrations(database_url)
        .await
        .wrap_err("failed to apply database migrations")?;
    DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("failed to build the database pool")
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = PortalSettings::load().wrap_err("failed to load portal settings")?;
    let env = DefaultEnv::new();
    let session = session_settings_from_env(&env, BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let db_pool = match settings.database_url.as_deref() {
        Some(url) => Some(connect(url).await?),
        None => None,
    };
    let http_state = build_http_state(&settings, db_pool.as_ref()).await?;

    let config = ServerConfig::new(session, settings.bind_addr());
    info!(addr = %config.bind_addr(), "portal listening");
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, http_state, config)?
        .await
        .wrap_err("server terminated with an error")
}
