//! Metrics Engine - runs every registered section over one dataset
//!
//! ## Run Flow
//!
//! 1. Validate the dataset (the only fatal step)
//! 2. Key it by fingerprint, section ids and thresholds; try the result cache
//! 3. On a miss, fan the sections out over a bounded worker pool
//! 4. Drain completions on the calling thread, reporting progress
//! 5. Tally the summary, store the bundle, return it
//!
//! Sections share the tables read-only and never see each other's output, so
//! completion order is irrelevant. Only the caller thread touches the progress
//! callback, which keeps the completed count strictly increasing.

use super::executor;
use super::fingerprint::{fingerprint, scoped_key};
use super::registry::{SectionDescriptor, SectionRegistry};
use crate::config::{ConfigError, EngineConfig};
use crate::dataset::{Dataset, DatasetError};
use crate::storage::{CacheError, CacheStore};
use crate::types::{ResultBundle, RunSummary, SectionOutcome, SectionResult};
use std::collections::BTreeMap;
use std::sync::mpsc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Progress message for a cache hit.
pub const CACHE_HIT_MESSAGE: &str = "Loaded from cache";

/// Failures that abort a whole run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Dataset(#[from] DatasetError),

    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

// ============================================================================
// Metrics Engine
// ============================================================================

/// Orchestrates section execution, caching and progress reporting.
pub struct MetricsEngine {
    config: EngineConfig,
    registry: SectionRegistry,
    cache: Option<CacheStore>,
    pool: rayon::ThreadPool,
}

impl MetricsEngine {
    /// Build an engine from explicit configuration and sections.
    ///
    /// A cache directory that cannot be opened is logged and the engine runs
    /// uncached; an invalid config is an error.
    pub fn new(config: EngineConfig, registry: SectionRegistry) -> Result<Self, EngineError> {
        config.validate()?;

        let cache = if config.cache.enabled {
            match CacheStore::open(&config.cache.dir, config.cache.ttl()) {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(
                        dir = %config.cache.dir.display(),
                        error = %e,
                        "Result cache unavailable, running without cache"
                    );
                    None
                }
            }
        } else {
            None
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.engine.workers)
            .thread_name(|i| format!("section-worker-{}", i))
            .build()?;

        info!(
            sections = registry.len(),
            workers = config.engine.workers,
            cache = cache.is_some(),
            "Metrics engine initialized"
        );

        Ok(Self {
            config,
            registry,
            cache,
            pool,
        })
    }

    /// Engine running the 14 standard sections.
    pub fn with_standard_sections(config: EngineConfig) -> Result<Self, EngineError> {
        let registry = SectionRegistry::configured(&config.engine);
        Self::new(config, registry)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SectionRegistry {
        &self.registry
    }

    /// The result cache, when enabled and open.
    pub fn cache(&self) -> Option<&CacheStore> {
        self.cache.as_ref()
    }

    pub fn section_catalog(&self) -> Vec<SectionDescriptor> {
        self.registry.catalog()
    }

    /// Fingerprint of `dataset` under this engine's digest setting.
    pub fn fingerprint(&self, dataset: &Dataset) -> String {
        fingerprint(dataset, self.config.cache.content_digest)
    }

    /// Key this engine stores `dataset`'s bundle under: the fingerprint scoped
    /// to the registered section ids and sample thresholds.
    pub fn cache_key(&self, dataset: &Dataset) -> String {
        scoped_key(
            &self.fingerprint(dataset),
            &self.registry.ids(),
            &self.config.engine,
        )
    }

    /// Run every section over `dataset`.
    ///
    /// `on_progress(completed, total, message)` fires once per finished section
    /// from the calling thread, or once with `(total, total, ..)` on a cache
    /// hit. Section failures are recorded in the bundle; only an unusable
    /// dataset returns `Err`.
    pub fn compute_all<F>(
        &self,
        dataset: &Dataset,
        use_cache: bool,
        mut on_progress: F,
    ) -> Result<ResultBundle, EngineError>
    where
        F: FnMut(usize, usize, &str),
    {
        dataset.validate()?;

        let total = self.registry.len();
        let cache = self.cache.as_ref().filter(|_| use_cache);
        let key = cache.map(|_| self.cache_key(dataset));

        if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
            match cache.lookup(key) {
                Some(bundle) if self.produced(&bundle) => {
                    info!(key = %key, sections = bundle.len(), "Serving results from cache");
                    on_progress(total, total, CACHE_HIT_MESSAGE);
                    return Ok(bundle);
                }
                Some(_) => warn!(key = %key, "Cached bundle does not match registry, recomputing"),
                None => debug!(key = %key, "Cache miss"),
            }
        }

        let mut summary =
            RunSummary::started(total, dataset.total_events(), dataset.total_phases());
        info!(
            identifier = dataset.identifier().unwrap_or("-"),
            sections = total,
            events = summary.total_events,
            phases = summary.total_phases,
            "Computing metrics"
        );

        let slots = self.execute(dataset, &mut on_progress);

        let mut sections = BTreeMap::new();
        for (section, slot) in self.registry.iter().zip(slots) {
            let result = slot.unwrap_or_else(|| SectionResult {
                id: section.id().to_string(),
                name: section.name().to_string(),
                icon: section.icon().to_string(),
                duration_secs: 0.0,
                outcome: SectionOutcome::failed("section worker exited without a result"),
            });
            sections.insert(result.id.clone(), result);
        }
        summary.finish(sections.values());

        info!(
            successful = summary.successful_sections,
            failed = summary.failed_sections,
            duration_ms = (summary.duration_secs * 1000.0) as u64,
            "Metrics computation complete"
        );

        let bundle = ResultBundle {
            identifier: dataset.identifier().map(str::to_string),
            section_order: self.registry.ids(),
            sections,
            summary,
        };

        if let (Some(cache), Some(key)) = (cache, key.as_deref()) {
            cache.store(key, &bundle);
        }

        Ok(bundle)
    }

    /// Whether `bundle` holds exactly this registry's sections, in order.
    fn produced(&self, bundle: &ResultBundle) -> bool {
        bundle.section_order == self.registry.ids()
            && bundle.len() == self.registry.len()
            && self.registry.iter().all(|s| bundle.get(s.id()).is_some())
    }

    /// Fan sections out on the pool; results come back indexed by registry slot.
    fn execute<F>(&self, dataset: &Dataset, on_progress: &mut F) -> Vec<Option<SectionResult>>
    where
        F: FnMut(usize, usize, &str),
    {
        let total = self.registry.len();
        let mut slots: Vec<Option<SectionResult>> = (0..total).map(|_| None).collect();
        let events = dataset.events();
        let phases = dataset.phases();

        self.pool.in_place_scope(|scope| {
            let (tx, rx) = mpsc::channel::<(usize, SectionResult)>();
            for (index, section) in self.registry.iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let result = executor::run(section, events, phases);
                    // Receiver outlives the scope; a send error cannot occur
                    let _ = tx.send((index, result));
                });
            }
            drop(tx);

            let mut completed = 0;
            for (index, result) in rx {
                completed += 1;
                let message = if result.is_success() {
                    format!("Completed: {}", result.name)
                } else {
                    format!("Error in: {}", result.name)
                };
                on_progress(completed, total, &message);
                slots[index] = Some(result);
            }
        });

        slots
    }

    /// Drop every cached bundle. Returns the number of entries removed.
    pub fn clear_cache(&self) -> Result<usize, CacheError> {
        match &self.cache {
            Some(cache) => cache.clear(),
            None => Ok(0),
        }
    }
}

impl std::fmt::Debug for MetricsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsEngine")
            .field("registry", &self.registry)
            .field("workers", &self.config.engine.workers)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{fixtures, FnSection, SectionError};
    use crate::types::SectionMetrics;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn uncached() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.cache.enabled = false;
        config
    }

    fn dataset() -> Dataset {
        Dataset::new(
            fixtures::events(100),
            Some(fixtures::phases(10)),
            Some("match_001".to_string()),
        )
    }

    #[test]
    fn test_standard_run_fills_every_section() {
        let engine = MetricsEngine::with_standard_sections(uncached()).expect("engine");
        let bundle = engine.compute_all(&dataset(), false, |_, _, _| {}).expect("run");

        assert_eq!(bundle.len(), 14);
        assert_eq!(bundle.summary.total_sections, 14);
        assert_eq!(bundle.summary.total_events, 100);
        assert_eq!(bundle.summary.total_phases, 10);
        assert_eq!(bundle.summary.failed_sections, 0, "{:?}", bundle.failed_sections().collect::<Vec<_>>());
        assert_eq!(bundle.identifier.as_deref(), Some("match_001"));
        assert_eq!(bundle.section_order, engine.registry().ids());
    }

    #[test]
    fn test_progress_is_strictly_increasing() {
        let engine = MetricsEngine::with_standard_sections(uncached()).expect("engine");
        let mut seen = Vec::new();
        engine
            .compute_all(&dataset(), false, |done, total, message| {
                assert_eq!(total, 14);
                assert!(message.starts_with("Completed: ") || message.starts_with("Error in: "));
                seen.push(done);
            })
            .expect("run");
        assert_eq!(seen, (1..=14).collect::<Vec<_>>());
    }

    #[test]
    fn test_failing_section_is_isolated() {
        let mut registry = SectionRegistry::standard();
        registry.replace(
            "momentum",
            Box::new(FnSection::new("momentum", "Momentum", "📈", |_, _| {
                Err(SectionError::Failed("broken on purpose".to_string()))
            })),
        );
        let engine = MetricsEngine::new(uncached(), registry).expect("engine");

        let mut messages = Vec::new();
        let bundle = engine
            .compute_all(&dataset(), false, |_, _, m| messages.push(m.to_string()))
            .expect("run");

        assert_eq!(bundle.summary.failed_sections, 1);
        assert_eq!(bundle.summary.successful_sections, 13);
        assert_eq!(bundle.get("momentum").and_then(|r| r.error()), Some("broken on purpose"));
        assert!(messages.contains(&"Error in: Momentum".to_string()));
    }

    #[test]
    fn test_cache_hit_skips_sections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = SectionRegistry::empty().with(Box::new(FnSection::new(
            "counted",
            "Counted",
            "#",
            move |events, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(SectionMetrics::new("Counted").with_group("rows", events.len()))
            },
        )));
        let engine =
            MetricsEngine::new(EngineConfig::with_cache_dir(dir.path()), registry).expect("engine");

        let first = engine.compute_all(&dataset(), true, |_, _, _| {}).expect("first");
        let mut progress = Vec::new();
        let second = engine
            .compute_all(&dataset(), true, |d, t, m| progress.push((d, t, m.to_string())))
            .expect("second");

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(progress, vec![(1, 1, CACHE_HIT_MESSAGE.to_string())]);

        // Bypassing the cache recomputes
        engine.compute_all(&dataset(), false, |_, _, _| {}).expect("third");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert_eq!(engine.clear_cache().expect("clear"), 1);
    }

    #[test]
    fn test_invalid_dataset_is_fatal() {
        let engine = MetricsEngine::with_standard_sections(uncached()).expect("engine");
        let bad = crate::dataset::Table::new(
            vec!["x".to_string()],
            vec![crate::dataset::Record::new().with("y", 1)],
        );
        let result = engine.compute_all(&Dataset::new(bad, None, None), false, |_, _, _| {});
        assert!(matches!(result, Err(EngineError::Dataset(_))));
    }

    #[test]
    fn test_foreign_bundle_under_own_key_is_recomputed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let counted = |calls: &Arc<AtomicUsize>, id: &str| {
            let counter = Arc::clone(calls);
            Box::new(FnSection::new(id, id, "#", move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(SectionMetrics::new("Counted"))
            }))
        };
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = MetricsEngine::new(
            EngineConfig::with_cache_dir(dir.path()),
            SectionRegistry::empty().with(counted(&calls, "alpha")),
        )
        .expect("engine");

        // A bundle from another registry planted under this engine's key
        let other_calls = Arc::new(AtomicUsize::new(0));
        let other = MetricsEngine::new(
            uncached(),
            SectionRegistry::empty().with(counted(&other_calls, "beta")),
        )
        .expect("other engine");
        let foreign = other.compute_all(&dataset(), false, |_, _, _| {}).expect("foreign");
        let cache = engine.cache().expect("cache");
        cache
            .store_at(&engine.cache_key(&dataset()), &foreign, chrono::Utc::now())
            .expect("plant");

        let mut progress = Vec::new();
        let bundle = engine
            .compute_all(&dataset(), true, |d, t, m| progress.push((d, t, m.to_string())))
            .expect("run");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bundle.section_order, vec!["alpha".to_string()]);
        assert!(bundle.get("alpha").is_some());
        assert_eq!(progress, vec![(1, 1, "Completed: alpha".to_string())]);
        assert_eq!(cache.lookup(&engine.cache_key(&dataset())), Some(bundle));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = uncached();
        config.engine.workers = 0;
        let result = MetricsEngine::with_standard_sections(config);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
