//! Configuration for the Gweta query orchestration core.
//!
//! - [`constants`] is the single source of truth for every named threshold
//!   in the specification (adaptive top-k, quality weights, cache TTLs,
//!   memory window sizes, concurrency caps).
//! - [`settings`] covers the handful of values operators legitimately vary
//!   per deployment (deadlines, pool sizes, environment).

pub mod constants;
pub mod settings;

pub use settings::{load_settings, CacheConfig, ConfigError, RuntimeEnvironment, Settings};
