//! Last-fetch cache with a freshness window.
//!
//! The cache is a plain value owned by whoever drives the refresh cycle
//! (the CLI `watch` loop, the web server). Time is passed in as an
//! [`Instant`] so tests control it.

use std::time::{Duration, Instant};

use crate::error::FetchError;
use crate::records::RawCallRecord;

/// Default freshness window in seconds.
pub const DEFAULT_FRESHNESS_SECS: u64 = 30;

/// How the rows handed back by [`FetchCache::get_or_fetch`] were obtained.
#[derive(Debug)]
pub enum CacheStatus {
    /// Served from the cache; the source was not contacted.
    Fresh,
    /// Fetched from the source just now.
    Fetched,
    /// The fetch failed; these are the last good rows.
    Stale(FetchError),
}

impl CacheStatus {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Rows plus how they were obtained.
#[derive(Debug)]
pub struct CachedFetch<'a> {
    pub rows: &'a [RawCallRecord],
    pub status: CacheStatus,
}

#[derive(Debug)]
struct CachedEntry {
    rows: Vec<RawCallRecord>,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct FetchCache {
    entry: Option<CachedEntry>,
    freshness: Duration,
}

impl FetchCache {
    /// Create an empty cache. A zero window disables caching but keeps
    /// stale fallback.
    pub fn new(freshness_secs: u64) -> Self {
        Self {
            entry: None,
            freshness: Duration::from_secs(freshness_secs),
        }
    }

    /// Whether cached rows exist and are younger than the window at `now`.
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| now.saturating_duration_since(e.fetched_at) < self.freshness)
    }

    /// Age of the cached rows at `now`.
    pub fn age(&self, now: Instant) -> Option<Duration> {
        self.entry
            .as_ref()
            .map(|e| now.saturating_duration_since(e.fetched_at))
    }

    /// Return fresh cached rows, or call `fetch` and cache its result.
    ///
    /// When `fetch` fails the last good rows are served with
    /// [`CacheStatus::Stale`]. With nothing cached the error is returned.
    pub fn get_or_fetch<F>(&mut self, now: Instant, fetch: F) -> Result<CachedFetch<'_>, FetchError>
    where
        F: FnOnce() -> Result<Vec<RawCallRecord>, FetchError>,
    {
        if self.is_fresh(now) {
            let rows = self.entry.as_ref().map(|e| e.rows.as_slice()).unwrap_or_default();
            return Ok(CachedFetch {
                rows,
                status: CacheStatus::Fresh,
            });
        }

        match fetch() {
            Ok(rows) => {
                let entry = self.entry.insert(CachedEntry {
                    rows,
                    fetched_at: now,
                });
                Ok(CachedFetch {
                    rows: &entry.rows,
                    status: CacheStatus::Fetched,
                })
            }
            Err(err) => match &self.entry {
                Some(entry) => Ok(CachedFetch {
                    rows: &entry.rows,
                    status: CacheStatus::Stale(err),
                }),
                None => Err(err),
            },
        }
    }

    /// Drop the cached rows.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_SECS)
    }
}
