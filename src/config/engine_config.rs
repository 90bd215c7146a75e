//! Engine Configuration - cache and worker settings as TOML values
//!
//! Each struct implements `Default` so a missing file, or a file that only
//! sets a few keys, still yields a complete configuration.

use super::defaults;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "PITCH_INTEL_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "pitch_intel.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a metrics engine instance.
///
/// Load with `EngineConfig::load()` which searches:
/// 1. `$PITCH_INTEL_CONFIG` env var
/// 2. `./pitch_intel.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Result-bundle cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Section execution
    #[serde(default)]
    pub engine: ExecutionConfig,
}

impl EngineConfig {
    /// Resolve configuration from, in order, the file named by
    /// `$PITCH_INTEL_CONFIG`, `./pitch_intel.toml`, then built-in defaults.
    ///
    /// A candidate that is missing or unreadable is skipped with a warning.
    pub fn load() -> Self {
        let explicit = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        if let Some(path) = explicit.as_deref() {
            if !path.exists() {
                warn!(var = CONFIG_ENV_VAR, path = %path.display(), "Config path from environment does not exist");
            }
        }

        let candidates = explicit
            .into_iter()
            .chain(std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)))
            .filter(|path| path.exists());

        for path in candidates {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!(path = %path.display(), "Engine config resolved");
                    return config;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unusable engine config"),
            }
        }

        info!("Engine config not found on disk, running with defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Engine config saved");
        Ok(())
    }

    /// Config with the cache rooted at `dir`; everything else default.
    pub fn with_cache_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cache: CacheConfig {
                dir: dir.into(),
                ..CacheConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate settings for internal consistency.
    ///
    /// Rules:
    /// - Worker count must be in 1..=64
    /// - Cache TTL must be > 0
    /// - Cache directory must be non-empty when caching is enabled
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.engine.workers == 0 || self.engine.workers > defaults::MAX_WORKERS {
            errors.push(format!(
                "engine.workers must be in 1..={} (got {})",
                defaults::MAX_WORKERS,
                self.engine.workers
            ));
        }

        if self.cache.ttl_secs == 0 {
            errors.push("cache.ttl_secs must be > 0".to_string());
        }

        if self.cache.enabled && self.cache.dir.as_os_str().is_empty() {
            errors.push("cache.dir must be set when cache.enabled = true".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Config file and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot access {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("{} is not valid engine TOML: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("cannot encode engine config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("rejected engine settings: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Cache Config
// ============================================================================

/// Result-bundle cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Master switch. When false the engine never opens the store.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding the cache database
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Entries older than this are treated as absent (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,

    /// Mix an order-independent digest of cell values into the cache key.
    ///
    /// When false the key depends only on table shape and identifier, so two
    /// datasets with the same shape collide.
    #[serde(default = "default_true")]
    pub content_digest: bool,
}

fn default_true() -> bool {
    true
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_CACHE_DIR)
}
fn default_cache_ttl_secs() -> u64 {
    defaults::DEFAULT_CACHE_TTL_SECS
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            ttl_secs: default_cache_ttl_secs(),
            content_digest: true,
        }
    }
}

// ============================================================================
// Execution Config
// ============================================================================

/// Section execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Worker slots in the section pool. Bounded so large tables are not
    /// processed by every section at once.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Minimum actions before a player's consistency is reported
    #[serde(default = "default_min_player_actions")]
    pub min_player_actions: usize,

    /// Minimum passes before a player is ranked as an accurate passer
    #[serde(default = "default_accurate_passer_min_passes")]
    pub accurate_passer_min_passes: usize,
}

fn default_workers() -> usize {
    defaults::DEFAULT_WORKERS
}
fn default_min_player_actions() -> usize {
    defaults::MIN_PLAYER_ACTIONS
}
fn default_accurate_passer_min_passes() -> usize {
    defaults::ACCURATE_PASSER_MIN_PASSES
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            min_player_actions: default_min_player_actions(),
            accurate_passer_min_passes: default_accurate_passer_min_passes(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
