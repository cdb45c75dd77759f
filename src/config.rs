use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sea_orm::{Database, DatabaseConnection};
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::listener::LoginListeners;
use crate::auth::password::PasswordHasher;
use crate::auth::policy::PolicyRegistry;
use crate::auth::session::SessionStore;
use crate::schemas::AppState;

/// Runtime configuration.
///
/// Read from `config/bookshelf.toml` when present, then from `BOOKSHELF__*`
/// environment variables (`BOOKSHELF__SERVER__BIND_ADDRESS=...`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub security: SecuritySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://bookshelf.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    pub session_ttl_secs: u64,
    pub session_capacity: u64,
    /// Argon2 memory cost in KiB
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            session_ttl_secs: 3600,
            session_capacity: 10_000,
            argon2_memory_kib: 19 * 1024,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl SecuritySettings {
    pub fn password_hasher(&self) -> Result<PasswordHasher> {
        PasswordHasher::new(
            self.argon2_memory_kib,
            self.argon2_iterations,
            self.argon2_parallelism,
        )
        .context("invalid argon2 settings")
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(
            self.session_capacity,
            Duration::from_secs(self.session_ttl_secs),
        )
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/bookshelf").required(false))
            .add_source(config::Environment::with_prefix("BOOKSHELF").separator("__"))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;
        Ok(settings)
    }
}

/// Build the shared state around an open connection
pub fn build_app_state(db: DatabaseConnection, settings: &Settings) -> Result<AppState> {
    Ok(AppState {
        db,
        sessions: settings.security.session_store(),
        policies: Arc::new(PolicyRegistry::with_defaults()),
        login_listeners: Arc::new(LoginListeners::with_defaults()),
        hasher: settings.security.password_hasher()?,
    })
}

/// Initialize application state with specific database URL
pub async fn initialize_app_state_with_url(
    database_url: &str,
    settings: &Settings,
) -> Result<AppState> {
    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;
    debug!(
        session_ttl_secs = settings.security.session_ttl_secs,
        "Building application state"
    );
    build_app_state(db, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind_address, "0.0.0.0:3000");
        assert_eq!(settings.server.request_timeout_secs, 30);
        assert!(settings.security.password_hasher().is_ok());
    }

    #[test]
    fn partial_sources_keep_defaults() {
        let settings: Settings = config::Config::builder()
            .set_override("server.bind_address", "127.0.0.1:8080")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.bind_address, "127.0.0.1:8080");
        assert_eq!(settings.server.request_timeout_secs, 30);
        assert_eq!(settings.security.session_ttl_secs, 3600);
    }

    #[test]
    fn broken_argon2_settings_are_reported() {
        let security = SecuritySettings {
            argon2_iterations: 0,
            ..SecuritySettings::default()
        };
        assert!(security.password_hasher().is_err());
    }
}
