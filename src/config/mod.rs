//! Engine Configuration Module
//!
//! Cache location, TTL and worker-pool size, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `PITCH_INTEL_CONFIG` environment variable (path to TOML file)
//! 2. `pitch_intel.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The configuration is handed to the engine at construction time; there is
//! no process-wide engine state, so tests can run engines side by side with
//! separate cache directories:
//!
//! ```ignore
//! let config = EngineConfig::load();
//! let engine = MetricsEngine::new(config, SectionRegistry::standard())?;
//! ```

mod engine_config;
pub mod defaults;

pub use engine_config::*;
