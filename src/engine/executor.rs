//! Section executor - runs one section and packages whatever happens.
//!
//! The executor never fails: a returned error and a panic inside the section
//! both become a `status = error` result, so one bad section cannot take the
//! batch down.

use crate::dataset::Table;
use crate::sections::Section;
use crate::types::{SectionOutcome, SectionResult};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, warn};

/// Run `section` against the shared tables, timing the call.
pub fn run(section: &dyn Section, events: &Table, phases: Option<&Table>) -> SectionResult {
    let started = Instant::now();

    // Sections only read the shared tables, so observing them after an
    // unwind cannot expose a broken invariant.
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| section.compute(events, phases))) {
        Ok(Ok(metrics)) => SectionOutcome::Success(metrics),
        Ok(Err(e)) => SectionOutcome::failed(e.to_string()),
        Err(payload) => {
            SectionOutcome::failed(format!("section panicked: {}", panic_message(payload.as_ref())))
        }
    };

    let duration = started.elapsed();
    match &outcome {
        SectionOutcome::Success(_) => debug!(
            section = section.id(),
            duration_ms = duration.as_millis() as u64,
            "Section completed"
        ),
        SectionOutcome::Error { error, .. } => warn!(
            section = section.id(),
            duration_ms = duration.as_millis() as u64,
            error = %error,
            "Section failed"
        ),
    }

    SectionResult {
        id: section.id().to_string(),
        name: section.name().to_string(),
        icon: section.icon().to_string(),
        duration_secs: duration.as_secs_f64(),
        outcome,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
