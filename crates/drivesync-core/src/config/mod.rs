//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field has a default, so an empty source is valid.

pub mod cache;
pub mod events;
pub mod logging;
pub mod remote;
pub mod scheduler;

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::cache::CacheConfig;
use self::events::EventsConfig;
use self::logging::LoggingConfig;
use self::remote::RemoteConfig;
use self::scheduler::SchedulerConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Entity store and view index settings.
    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,
    /// Invalidation scheduler settings.
    #[serde(default)]
    #[validate(nested)]
    pub scheduler: SchedulerConfig,
    /// Remote resource API settings.
    #[serde(default)]
    #[validate(nested)]
    pub remote: RemoteConfig,
    /// Event bus settings.
    #[serde(default)]
    #[validate(nested)]
    pub events: EventsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the `config/` directory.
    ///
    /// Merges `config/default.toml`, `config/{env}.toml`, and environment
    /// variables prefixed with `DRIVESYNC__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from(Path::new("config"), env)
    }

    /// Load configuration from an explicit directory.
    pub fn load_from(dir: &Path, env: &str) -> Result<Self, AppError> {
        let default_path = dir.join("default");
        let env_path = dir.join(env);

        let config = config::Config::builder()
            .add_source(config::File::from(default_path).required(false))
            .add_source(config::File::from(env_path).required(false))
            .add_source(
                config::Environment::with_prefix("DRIVESYNC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        tracing::debug!(dir = %dir.display(), env, "Configuration loaded");
        Ok(parsed)
    }
}
