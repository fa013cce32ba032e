//! In-process KPI result cache.
//!
//! Entries are keyed on the filter criteria plus a fingerprint of the
//! snapshot they were computed from, so a reloaded dataset never serves a
//! stale result. Entries also expire after a TTL. Callers pass the current
//! [`Instant`] in; nothing here reads the clock.

use crate::core::{NormalizedTable, Result};
use crate::filter::FilterCriteria;
use crate::metrics::KpiResult;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL_SECS: u64 = 300;

/// `[cache]` config section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Canonical JSON of the criteria
    pub criteria: String,
    /// Data version of the snapshot
    pub snapshot: u64,
}

impl CacheKey {
    pub fn new(criteria: &FilterCriteria, table: &NormalizedTable) -> Result<Self> {
        Ok(Self {
            criteria: serde_json::to_string(criteria)?,
            snapshot: table.fingerprint()?,
        })
    }
}

struct CacheEntry {
    stored_at: Instant,
    result: Arc<KpiResult>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Thread-safe TTL cache of computed results
pub struct KpiCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for KpiCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl KpiCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.ttl
    }

    /// Fresh entry for `key`, if any. Expired entries are dropped on read.
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<Arc<KpiResult>> {
        let found = self
            .entries
            .get(key)
            .map(|entry| (self.is_fresh(&entry, now), Arc::clone(&entry.result)));

        match found {
            Some((true, result)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(result)
            }
            Some((false, _)) => {
                self.entries.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, key: CacheKey, result: KpiResult, now: Instant) -> Arc<KpiResult> {
        let result = Arc::new(result);
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: now,
                result: Arc::clone(&result),
            },
        );
        result
    }

    /// Cached result for `key`, or compute, store and return a new one.
    pub fn get_or_compute<F>(&self, key: CacheKey, now: Instant, compute: F) -> Arc<KpiResult>
    where
        F: FnOnce() -> KpiResult,
    {
        if let Some(hit) = self.get(&key, now) {
            log::debug!("KPI cache hit for snapshot {:016x}", key.snapshot);
            return hit;
        }
        self.insert(key, compute(), now)
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_fresh(entry, now));
        before - self.entries.len()
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            entries: self.entries.len(),
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }
}
