//! Result Bundle Cache
//!
//! Persists complete result bundles in a Sled database under the configured
//! cache directory, one entry per dataset fingerprint.
//!
//! Key format: the fingerprint hex string
//! Value: JSON-serialized [`CachedBundle`]
//!
//! Entries older than the TTL are ignored rather than evicted; the next run
//! with the same fingerprint overwrites them. Cache failures never fail a
//! computation: `lookup` degrades to a miss and `store` logs and drops.

use crate::types::ResultBundle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cache error types
#[derive(Debug)]
pub enum CacheError {
    /// Sled database error
    Database(sled::Error),
    /// Serialization error
    Serialization(serde_json::Error),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database(e) => write!(f, "Cache database error: {}", e),
            Self::Serialization(e) => write!(f, "Cache serialization error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<sled::Error> for CacheError {
    fn from(err: sled::Error) -> Self {
        CacheError::Database(err)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err)
    }
}

/// Stored bundle with its write time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedBundle {
    pub stored_at: DateTime<Utc>,
    pub bundle: ResultBundle,
}

impl CachedBundle {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.stored_at).to_std() {
            Ok(age) => age < ttl,
            // stored_at in the future (clock skew): treat as fresh
            Err(_) => true,
        }
    }
}

/// Fingerprint-keyed bundle store.
#[derive(Clone)]
pub struct CacheStore {
    db: Arc<sled::Db>,
    ttl: Duration,
}

impl CacheStore {
    /// Open or create the cache database in `dir`.
    pub fn open<P: AsRef<Path>>(dir: P, ttl: Duration) -> Result<Self, CacheError> {
        let dir = dir.as_ref();
        let db = sled::open(dir)?;
        info!(path = %dir.display(), ttl_secs = ttl.as_secs(), "Result cache opened");
        Ok(Self {
            db: Arc::new(db),
            ttl,
        })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_temp(ttl: Duration) -> Result<Self, CacheError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            db: Arc::new(db),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh bundle for `key`, or `None` if missing, unreadable or expired.
    pub fn lookup(&self, key: &str) -> Option<ResultBundle> {
        self.lookup_at(key, Utc::now())
    }

    /// [`CacheStore::lookup`] evaluated against an explicit clock.
    pub fn lookup_at(&self, key: &str, now: DateTime<Utc>) -> Option<ResultBundle> {
        match self.read(key) {
            Ok(Some(entry)) if entry.is_fresh(now, self.ttl) => {
                debug!(key = %key, "Cache hit");
                Some(entry.bundle)
            }
            Ok(Some(entry)) => {
                debug!(key = %key, stored_at = %entry.stored_at, "Cache entry expired");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    fn read(&self, key: &str) -> Result<Option<CachedBundle>, CacheError> {
        match self.db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persist `bundle` under `key`. Failures are logged and dropped.
    pub fn store(&self, key: &str, bundle: &ResultBundle) {
        if let Err(e) = self.store_at(key, bundle, Utc::now()) {
            warn!(key = %key, error = %e, "Cache write failed, continuing without cache");
        }
    }

    /// Persist with an explicit write time. Overwrites any existing entry.
    pub fn store_at(
        &self,
        key: &str,
        bundle: &ResultBundle,
        stored_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let entry = CachedBundle {
            stored_at,
            bundle: bundle.clone(),
        };
        let value = serde_json::to_vec(&entry)?;
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;

        debug!(key = %key, sections = bundle.len(), "Stored result bundle");
        Ok(())
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let removed = self.db.len();
        self.db.clear()?;
        self.db.flush()?;
        info!(removed, "Result cache cleared");
        Ok(removed)
    }

    /// Number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}
