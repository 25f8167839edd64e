//! Per-base exchange-rate cache with an injected clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::clock::{Clock, SystemClock};
use super::provider::{normalize_code, FallbackRateProvider, RateProvider, RateSnapshot};
use crate::CalcResult;

/// Entries older than this are refetched.
pub const DEFAULT_TTL_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Fetched from the provider for this request.
    Live,
    /// Served from the cache.
    Cached,
    /// Provider failed; hardcoded table.
    Fallback,
}

struct CachedRates {
    snapshot: RateSnapshot,
    fetched_at: DateTime<Utc>,
    is_fallback: bool,
}

pub struct RateCache<C: Clock = SystemClock> {
    clock: C,
    ttl: Duration,
    entries: HashMap<String, CachedRates>,
}

impl<C: Clock> RateCache<C> {
    pub fn new(clock: C, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn with_default_ttl(clock: C) -> Self {
        Self::new(clock, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn is_fresh(&self, entry: &CachedRates) -> bool {
        self.clock.now() - entry.fetched_at < self.ttl
    }

    /// Fresh snapshot for `base`, if any.
    pub fn get(&self, base: &str) -> Option<&RateSnapshot> {
        self.entries
            .get(&normalize_code(base))
            .filter(|e| self.is_fresh(e))
            .map(|e| &e.snapshot)
    }

    pub fn is_stale(&self, base: &str) -> bool {
        self.get(base).is_none()
    }

    pub fn insert(&mut self, snapshot: RateSnapshot) {
        self.insert_entry(snapshot, false);
    }

    fn insert_entry(&mut self, snapshot: RateSnapshot, is_fallback: bool) {
        let fetched_at = self.clock.now();
        self.entries.insert(
            snapshot.base.clone(),
            CachedRates {
                snapshot,
                fetched_at,
                is_fallback,
            },
        );
    }

    pub fn invalidate(&mut self, base: &str) {
        self.entries.remove(&normalize_code(base));
    }

    /// Drop every expired entry.
    pub fn cleanup_stale(&mut self) {
        let now = self.clock.now();
        let ttl = self.ttl;
        self.entries.retain(|_, e| now - e.fetched_at < ttl);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached rates for `base`, fetching on a miss. A provider failure falls
    /// back to the hardcoded table, which is cached like any other answer.
    pub fn get_or_fetch(
        &mut self,
        base: &str,
        provider: &dyn RateProvider,
    ) -> CalcResult<(RateSnapshot, RateSource)> {
        let key = normalize_code(base);

        if let Some(entry) = self.entries.get(&key).filter(|e| self.is_fresh(e)) {
            log::trace!("fx cache hit for {key}");
            let source = if entry.is_fallback {
                RateSource::Fallback
            } else {
                RateSource::Cached
            };
            return Ok((entry.snapshot.clone(), source));
        }

        log::trace!("fx cache miss for {key}");
        match provider.fetch(&key) {
            Ok(snapshot) => {
                self.insert_entry(snapshot.clone(), false);
                Ok((snapshot, RateSource::Live))
            }
            Err(e) => {
                log::warn!("rate provider failed for {key}: {e}; using fallback table");
                let snapshot = FallbackRateProvider::snapshot(self.clock.now()).rebase(&key)?;
                self.insert_entry(snapshot.clone(), true);
                Ok((snapshot, RateSource::Fallback))
            }
        }
    }
}
