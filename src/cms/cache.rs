//! Time-bounded cache for the aggregated story list.
//!
//! The cache holds at most one snapshot: the full result of the last
//! successful fetch and the time it completed. It never holds a partial
//! fetch.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use super::models::Story;

/// Age after which a snapshot is stale (5 minutes).
pub const CACHE_TTL_SECS: i64 = 300;

/// Source of the current time.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and pass
/// another to a fetcher.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A complete story list and when it was fetched.
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    /// Every story from the fetch, in fetch order.
    pub stories: Arc<Vec<Story>>,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

impl CacheSnapshot {
    /// Returns the snapshot age at `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.fetched_at)
    }

    /// Returns true if the snapshot is older than the TTL at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > Duration::seconds(CACHE_TTL_SECS)
    }
}

/// Cache for the aggregated story list.
#[derive(Debug, Default)]
pub struct StoryCache {
    snapshot: Option<CacheSnapshot>,
}

impl StoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache ready to be shared between fetchers.
    pub fn shared() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Returns the snapshot if one exists and is not stale at `now`.
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<&CacheSnapshot> {
        self.snapshot.as_ref().filter(|s| !s.is_stale(now))
    }

    /// Returns the snapshot regardless of age.
    pub fn snapshot(&self) -> Option<&CacheSnapshot> {
        self.snapshot.as_ref()
    }

    /// Replaces the snapshot with a completed fetch.
    pub fn store(&mut self, stories: Vec<Story>, fetched_at: DateTime<Utc>) -> CacheSnapshot {
        let snapshot = CacheSnapshot {
            stories: Arc::new(stories),
            fetched_at,
        };
        self.snapshot = Some(snapshot.clone());
        snapshot
    }

    /// Drops the snapshot.
    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_cache_has_no_snapshot() {
        let cache = StoryCache::new();
        assert!(cache.fresh(t0()).is_none());
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_snapshot_fresh_until_ttl_elapses() {
        let mut cache = StoryCache::new();
        cache.store(Vec::new(), t0());

        assert!(cache.fresh(t0() + Duration::seconds(300)).is_some());
        assert!(cache.fresh(t0() + Duration::seconds(301)).is_none());
        // Stale snapshots remain stored
        assert!(cache.snapshot().is_some());
    }

    #[test]
    fn test_clear_drops_snapshot() {
        let mut cache = StoryCache::new();
        cache.store(Vec::new(), t0());
        cache.clear();
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(t0());
        let handle = clock.clone();
        handle.advance(Duration::seconds(90));
        assert_eq!(clock.now(), t0() + Duration::seconds(90));
    }
}
