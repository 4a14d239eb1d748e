//! Operator-varying settings, loaded via the `config` crate from TOML and
//! environment variables (prefix `GWETA_`). Business thresholds never live
//! here — they are named constants in [`crate::constants`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeEnvironment {
    Development,
    Staging,
    Production,
}

impl Default for RuntimeEnvironment {
    fn default() -> Self {
        RuntimeEnvironment::Development
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub pool_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: crate::constants::cache::CACHE_ENABLED,
            pool_size: crate::constants::cache::MAX_POOL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub environment: RuntimeEnvironment,
    pub request_deadline_s: u64,
    pub parent_fetch_concurrency: usize,
    pub cache: CacheConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            request_deadline_s: crate::constants::graph::REQUEST_DEADLINE_S,
            parent_fetch_concurrency: crate::constants::graph::PARENT_FETCH_CONCURRENCY,
            cache: CacheConfig::default(),
        }
    }
}

/// Load settings from (in increasing priority) built-in defaults, an
/// optional `config/settings.toml` file, and `GWETA_*` environment
/// variables, mirroring the donor workspace's `load_settings` layering.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let defaults = Settings::default();
    let builder = config::Config::builder()
        .set_default("environment", "development")?
        .set_default("request_deadline_s", defaults.request_deadline_s as i64)?
        .set_default("parent_fetch_concurrency", defaults.parent_fetch_concurrency as i64)?
        .set_default("cache.enabled", defaults.cache.enabled)?
        .set_default("cache.pool_size", defaults.cache.pool_size as i64)?
        .add_source(config::File::with_name("config/settings").required(false))
        .add_source(config::Environment::with_prefix("GWETA").separator("__"));

    let settings = builder.build()?;
    settings.try_deserialize().map_err(ConfigError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let s = Settings::default();
        assert_eq!(s.request_deadline_s, crate::constants::graph::REQUEST_DEADLINE_S);
        assert!(s.cache.enabled);
    }
}
