//! Result bundle - the complete, serializable output of one engine run.
//!
//! A bundle holds one [`SectionResult`] per registered section (keyed by
//! section id) plus a [`RunSummary`]. It carries no live resources, so it can
//! be cached to disk and handed to the presentation layer as JSON.

use super::metrics::{MetricMap, SectionMetrics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Section execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Success,
    Error,
}

impl std::fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// What a section produced: metrics on success, an error description on
/// failure. A failed section carries an empty metrics map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SectionOutcome {
    Success(SectionMetrics),
    Error {
        error: String,
        #[serde(default)]
        metrics: MetricMap,
    },
}

impl SectionOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Error {
            error: error.into(),
            metrics: MetricMap::new(),
        }
    }
}

/// One section's entry in the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionResult {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// Wall-clock computation time in seconds
    pub duration_secs: f64,
    /// Serialized inline: `status` plus `section`/`metrics` or `error`/`metrics`
    #[serde(flatten)]
    pub outcome: SectionOutcome,
}

impl SectionResult {
    pub fn status(&self) -> SectionStatus {
        match self.outcome {
            SectionOutcome::Success(_) => SectionStatus::Success,
            SectionOutcome::Error { .. } => SectionStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == SectionStatus::Success
    }

    /// Section metrics, present only on success.
    pub fn metrics(&self) -> Option<&MetricMap> {
        match &self.outcome {
            SectionOutcome::Success(m) => Some(&m.metrics),
            SectionOutcome::Error { .. } => None,
        }
    }

    /// Error description, present only on failure.
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            SectionOutcome::Success(_) => None,
            SectionOutcome::Error { error, .. } => Some(error),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs.max(0.0))
    }
}

/// Run-level statistics.
///
/// Invariant: `successful_sections + failed_sections == total_sections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_sections: usize,
    pub total_events: usize,
    pub total_phases: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Wall-clock batch duration in seconds
    pub duration_secs: f64,
    pub successful_sections: usize,
    pub failed_sections: usize,
}

impl RunSummary {
    /// Summary stamped at batch start; tallies are filled by [`RunSummary::finish`].
    pub fn started(total_sections: usize, total_events: usize, total_phases: usize) -> Self {
        let now = Utc::now();
        Self {
            total_sections,
            total_events,
            total_phases,
            started_at: now,
            finished_at: now,
            duration_secs: 0.0,
            successful_sections: 0,
            failed_sections: 0,
        }
    }

    /// Stamp the end time and tally section outcomes.
    pub fn finish<'a>(&mut self, results: impl IntoIterator<Item = &'a SectionResult>) {
        self.finished_at = Utc::now();
        self.duration_secs = (self.finished_at - self.started_at)
            .to_std()
            .map_or(0.0, |d| d.as_secs_f64());

        let (ok, failed) = results
            .into_iter()
            .fold((0, 0), |(ok, failed), r| match r.status() {
                SectionStatus::Success => (ok + 1, failed),
                SectionStatus::Error => (ok, failed + 1),
            });
        self.successful_sections = ok;
        self.failed_sections = failed;
    }
}

/// Complete output of one `compute_all` run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle {
    /// Team / match identifier supplied by the caller
    pub identifier: Option<String>,
    /// Section ids in canonical registry order
    pub section_order: Vec<String>,
    /// Section id -> result
    pub sections: BTreeMap<String, SectionResult>,
    pub summary: RunSummary,
}

impl ResultBundle {
    pub fn get(&self, id: &str) -> Option<&SectionResult> {
        self.sections.get(id)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections in registry order, independent of completion order.
    pub fn ordered_sections(&self) -> impl Iterator<Item = &SectionResult> {
        self.section_order
            .iter()
            .filter_map(|id| self.sections.get(id))
    }

    pub fn failed_sections(&self) -> impl Iterator<Item = &SectionResult> {
        self.ordered_sections().filter(|r| !r.is_success())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
