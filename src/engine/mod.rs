//! Metrics engine
//!
//! - `registry`: ordered catalogue of the sections a run executes
//! - `executor`: runs one section, capturing errors and panics
//! - `fingerprint`: dataset cache key
//! - `orchestrator`: bounded parallel fan-out, progress, caching

mod executor;
mod fingerprint;
mod orchestrator;
mod registry;

pub use executor::run as run_section;
pub use fingerprint::{fingerprint, scoped_key};
pub use orchestrator::{EngineError, MetricsEngine, CACHE_HIT_MESSAGE};
pub use registry::{SectionDescriptor, SectionRegistry};
