//! Shared data structures for the tactical metrics engine
//!
//! - `metrics`: nested metric values produced by each analytic section
//! - `bundle`: per-section results and the run-level bundle returned to callers

mod bundle;
mod metrics;

pub use bundle::*;
pub use metrics::*;
