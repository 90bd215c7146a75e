//! Pitch Intel: tactical metrics for football match data
//!
//! Runs a fixed catalogue of analytic sections over a match's event and phase
//! tables and returns one serializable result bundle.
//!
//! ## Architecture
//!
//! - **Dataset**: schema-flexible event/phase tables with typed optional access
//! - **Sections**: 14 pure analytics (possession, pressing, set-pieces, ...)
//! - **Engine**: bounded parallel execution with per-section error isolation
//! - **Storage**: fingerprint-keyed result cache with TTL freshness

pub mod config;
pub mod dataset;
pub mod engine;
pub mod sections;
pub mod storage;
pub mod types;

pub use config::{CacheConfig, ConfigError, EngineConfig, ExecutionConfig};
pub use dataset::{Dataset, DatasetError, Record, Table, View};
pub use engine::{
    fingerprint, scoped_key, EngineError, MetricsEngine, SectionDescriptor, SectionRegistry,
    CACHE_HIT_MESSAGE,
};
pub use sections::{FnSection, Section, SectionError};
pub use storage::{CacheError, CacheStore};
pub use types::{
    MetricMap, MetricValue, ResultBundle, RunSummary, SectionMetrics, SectionOutcome,
    SectionResult, SectionStatus,
};
