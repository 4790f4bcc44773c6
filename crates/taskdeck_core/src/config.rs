//! Process configuration for embedding hosts.
//!
//! Values come from the environment so the core never reads session or
//! browser state on its own.

use crate::logging::default_log_level;
use std::path::PathBuf;

/// Log level override (`trace|debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "TASKDECK_LOG_LEVEL";
/// Absolute directory for rolling log files. Logging stays off when unset.
pub const ENV_LOG_DIR: &str = "TASKDECK_LOG_DIR";
/// JSON seed file loaded at startup instead of the demo dataset.
pub const ENV_SEED: &str = "TASKDECK_SEED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub seed_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            seed_path: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup. Blank values are
    /// treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        config.seed_path = read(ENV_SEED).map(PathBuf::from);
        config
    }
}
