//! Time-bounded memoization of normalized record sets.
//!
//! One entry per [`ServiceKind`]. An entry is served until its TTL runs out;
//! the next call after that fetches again and replaces it. A failed fetch
//! clears the entry for that kind, so stale data is never served past
//! expiry. [`RecordCache::invalidate`] drops both entries at once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use fsdash_core::{ServiceKind, ServiceRecord};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::FeedError;
use crate::source::RecordSource;

/// Monotonic time source, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Arc<[ServiceRecord]>,
    fetched_at: Instant,
    fetched_at_utc: DateTime<Utc>,
}

/// A cached record set together with when it was fetched.
#[derive(Debug, Clone)]
pub struct CachedRecords {
    pub kind: ServiceKind,
    pub records: Arc<[ServiceRecord]>,
    pub fetched_at: DateTime<Utc>,
}

/// Per-kind cache state, as reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub kind: ServiceKind,
    pub cached: bool,
    pub record_count: usize,
    pub fetched_at: Option<DateTime<Utc>>,
    pub age_secs: Option<u64>,
}

pub struct RecordCache<S, C = SystemClock> {
    source: S,
    clock: C,
    ttl: Duration,
    // One slot per kind. A slot's lock is held across that kind's fetch so
    // concurrent callers never double-fetch, while the other kind stays
    // readable.
    ambulance: Mutex<Option<CacheEntry>>,
    fire_station: Mutex<Option<CacheEntry>>,
}

impl<S: RecordSource> RecordCache<S, SystemClock> {
    #[must_use]
    pub fn new(source: S, ttl: Duration) -> Self {
        Self::with_clock(source, ttl, SystemClock)
    }
}

impl<S: RecordSource, C: Clock> RecordCache<S, C> {
    #[must_use]
    pub fn with_clock(source: S, ttl: Duration, clock: C) -> Self {
        Self {
            source,
            clock,
            ttl,
            ambulance: Mutex::new(None),
            fire_station: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    fn slot(&self, kind: ServiceKind) -> &Mutex<Option<CacheEntry>> {
        match kind {
            ServiceKind::AmbulanceDepot => &self.ambulance,
            ServiceKind::FireStation => &self.fire_station,
        }
    }

    /// Returns the records for `kind`, fetching only when there is no entry
    /// or the entry is older than the TTL.
    ///
    /// # Errors
    ///
    /// Propagates the [`FeedError`] of a failed fetch. The entry for `kind`
    /// is cleared in that case.
    pub async fn get_or_fetch(&self, kind: ServiceKind) -> Result<Arc<[ServiceRecord]>, FeedError> {
        self.snapshot(kind).await.map(|cached| cached.records)
    }

    /// Like [`Self::get_or_fetch`], but also returns the fetch timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_or_fetch`].
    pub async fn snapshot(&self, kind: ServiceKind) -> Result<CachedRecords, FeedError> {
        let mut slot = self.slot(kind).lock().await;
        let now = self.clock.now();

        if let Some(entry) = slot.as_ref() {
            if now.saturating_duration_since(entry.fetched_at) < self.ttl {
                tracing::debug!(%kind, records = entry.records.len(), "cache hit");
                return Ok(CachedRecords {
                    kind,
                    records: Arc::clone(&entry.records),
                    fetched_at: entry.fetched_at_utc,
                });
            }
            tracing::debug!(%kind, "cache entry expired");
        }

        match self.source.fetch_records(kind).await {
            Ok(records) => {
                let entry = CacheEntry {
                    records: records.into(),
                    fetched_at: self.clock.now(),
                    fetched_at_utc: Utc::now(),
                };
                tracing::info!(%kind, records = entry.records.len(), "cache refreshed");
                let cached = CachedRecords {
                    kind,
                    records: Arc::clone(&entry.records),
                    fetched_at: entry.fetched_at_utc,
                };
                *slot = Some(entry);
                Ok(cached)
            }
            Err(e) => {
                *slot = None;
                tracing::warn!(%kind, error = %e, "cache refresh failed; entry cleared");
                Err(e)
            }
        }
    }

    /// Drops the entries for both kinds; the next lookup of each re-fetches.
    pub async fn invalidate(&self) {
        for kind in ServiceKind::ALL {
            *self.slot(kind).lock().await = None;
        }
        tracing::info!("cache invalidated");
    }

    /// Invalidates, then fetches both kinds. Failures are logged and left as
    /// empty entries for the next caller to retry.
    pub async fn refresh_all(&self) {
        self.invalidate().await;
        for kind in ServiceKind::ALL {
            if let Err(e) = self.get_or_fetch(kind).await {
                tracing::error!(%kind, error = %e, "background refresh failed");
            }
        }
    }

    pub async fn status(&self) -> Vec<CacheStatus> {
        let mut statuses = Vec::with_capacity(ServiceKind::ALL.len());
        for kind in ServiceKind::ALL {
            let slot = self.slot(kind).lock().await;
            let now = self.clock.now();
            statuses.push(match slot.as_ref() {
                Some(entry) => CacheStatus {
                    kind,
                    cached: true,
                    record_count: entry.records.len(),
                    fetched_at: Some(entry.fetched_at_utc),
                    age_secs: Some(now.saturating_duration_since(entry.fetched_at).as_secs()),
                },
                None => CacheStatus {
                    kind,
                    cached: false,
                    record_count: 0,
                    fetched_at: None,
                    age_secs: None,
                },
            });
        }
        statuses
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    #[derive(Clone)]
    struct ManualClock {
        now: Arc<std::sync::Mutex<Instant>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Arc::new(std::sync::Mutex::new(Instant::now())),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    #[derive(Clone, Default)]
    struct CountingSource {
        ambulance_calls: Arc<AtomicUsize>,
        fire_calls: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
        /// When set, fire-station fetches wait here until released.
        fire_gate: Option<Arc<Notify>>,
    }

    impl CountingSource {
        fn calls(&self, kind: ServiceKind) -> usize {
            match kind {
                ServiceKind::AmbulanceDepot => self.ambulance_calls.load(Ordering::SeqCst),
                ServiceKind::FireStation => self.fire_calls.load(Ordering::SeqCst),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    impl RecordSource for CountingSource {
        async fn fetch_records(&self, kind: ServiceKind) -> Result<Vec<ServiceRecord>, FeedError> {
            let counter = match kind {
                ServiceKind::AmbulanceDepot => &self.ambulance_calls,
                ServiceKind::FireStation => &self.fire_calls,
            };
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if let (ServiceKind::FireStation, Some(gate)) = (kind, &self.fire_gate) {
                gate.notified().await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(FeedError::Upstream {
                    status: 503,
                    url: "http://feed.test".to_owned(),
                });
            }
            Ok(vec![record(i64::try_from(call).unwrap(), kind)])
        }
    }

    fn record(id: i64, kind: ServiceKind) -> ServiceRecord {
        ServiceRecord {
            id,
            agency_code: String::new(),
            name: format!("site {id}"),
            name_en: String::new(),
            address: String::new(),
            address_en: String::new(),
            district: "灣仔".to_owned(),
            district_en: String::new(),
            phone: String::new(),
            latitude: None,
            longitude: None,
            kind,
        }
    }

    const TTL: Duration = Duration::from_secs(3600);

    fn cache() -> (RecordCache<CountingSource, ManualClock>, CountingSource, ManualClock) {
        let source = CountingSource::default();
        let clock = ManualClock::new();
        let cache = RecordCache::with_clock(source.clone(), TTL, clock.clone());
        (cache, source, clock)
    }

    #[tokio::test]
    async fn calls_within_ttl_fetch_once_per_kind() {
        let (cache, source, clock) = cache();

        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();
        cache.get_or_fetch(ServiceKind::FireStation).await.unwrap();
        clock.advance(Duration::from_secs(1800));
        let again = cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();
        cache.get_or_fetch(ServiceKind::FireStation).await.unwrap();

        assert_eq!(source.calls(ServiceKind::AmbulanceDepot), 1);
        assert_eq!(source.calls(ServiceKind::FireStation), 1);
        assert_eq!(again[0].id, 1, "served from cache");
    }

    #[tokio::test]
    async fn expired_entry_is_refetched_and_replaced() {
        let (cache, source, clock) = cache();

        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();
        clock.advance(TTL);
        let refreshed = cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();

        assert_eq!(source.calls(ServiceKind::AmbulanceDepot), 2);
        assert_eq!(refreshed[0].id, 2);

        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();
        assert_eq!(source.calls(ServiceKind::AmbulanceDepot), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_exactly_one_new_fetch() {
        let (cache, source, _clock) = cache();

        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();
        cache.get_or_fetch(ServiceKind::FireStation).await.unwrap();
        cache.invalidate().await;
        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();
        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();
        cache.get_or_fetch(ServiceKind::FireStation).await.unwrap();

        assert_eq!(source.calls(ServiceKind::AmbulanceDepot), 2);
        assert_eq!(source.calls(ServiceKind::FireStation), 2);
    }

    #[tokio::test]
    async fn failed_refresh_clears_stale_entry() {
        let (cache, source, clock) = cache();

        cache.get_or_fetch(ServiceKind::FireStation).await.unwrap();
        clock.advance(TTL + Duration::from_secs(1));
        source.set_failing(true);

        let err = cache.get_or_fetch(ServiceKind::FireStation).await.unwrap_err();
        assert!(matches!(err, FeedError::Upstream { status: 503, .. }));

        let status = cache.status().await;
        let fire = status
            .iter()
            .find(|s| s.kind == ServiceKind::FireStation)
            .unwrap();
        assert!(!fire.cached, "stale entry must not survive a failed refresh");

        source.set_failing(false);
        let records = cache.get_or_fetch(ServiceKind::FireStation).await.unwrap();
        assert_eq!(records[0].id, 3);
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let (cache, source, _clock) = cache();
        source.set_failing(true);

        assert!(cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.is_err());
        assert!(cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.is_err());
        assert_eq!(source.calls(ServiceKind::AmbulanceDepot), 2);
    }

    #[tokio::test]
    async fn refresh_all_refetches_both_kinds() {
        let (cache, source, _clock) = cache();
        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();

        cache.refresh_all().await;

        assert_eq!(source.calls(ServiceKind::AmbulanceDepot), 2);
        assert_eq!(source.calls(ServiceKind::FireStation), 1);
        assert!(cache.status().await.iter().all(|s| s.cached));
    }

    #[tokio::test]
    async fn status_reports_age_and_counts() {
        let (cache, _source, clock) = cache();
        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();
        clock.advance(Duration::from_secs(90));

        let status = cache.status().await;
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].kind, ServiceKind::AmbulanceDepot);
        assert!(status[0].cached);
        assert_eq!(status[0].record_count, 1);
        assert_eq!(status[0].age_secs, Some(90));
        assert!(!status[1].cached);
        assert!(status[1].age_secs.is_none());
    }

    #[tokio::test]
    async fn snapshot_keeps_fetch_timestamp_on_hits() {
        let (cache, _source, clock) = cache();
        let first = cache.snapshot(ServiceKind::FireStation).await.unwrap();
        clock.advance(Duration::from_secs(5));
        let second = cache.snapshot(ServiceKind::FireStation).await.unwrap();
        assert_eq!(first.fetched_at, second.fetched_at);
        assert!(Arc::ptr_eq(&first.records, &second.records));
    }

    #[tokio::test]
    async fn slow_fetch_of_one_kind_does_not_block_the_other() {
        let gate = Arc::new(Notify::new());
        let source = CountingSource {
            fire_gate: Some(Arc::clone(&gate)),
            ..CountingSource::default()
        };
        let cache = Arc::new(RecordCache::with_clock(
            source.clone(),
            TTL,
            ManualClock::new(),
        ));
        cache.get_or_fetch(ServiceKind::AmbulanceDepot).await.unwrap();

        let pending = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move { cache.get_or_fetch(ServiceKind::FireStation).await }
        });
        while source.calls(ServiceKind::FireStation) == 0 {
            tokio::task::yield_now().await;
        }

        let hit = tokio::time::timeout(
            Duration::from_millis(500),
            cache.get_or_fetch(ServiceKind::AmbulanceDepot),
        )
        .await
        .expect("ambulance hit must not wait on the fire-station fetch")
        .unwrap();
        assert_eq!(hit[0].id, 1);
        assert_eq!(source.calls(ServiceKind::AmbulanceDepot), 1);

        gate.notify_one();
        let fire = pending.await.unwrap().unwrap();
        assert_eq!(fire.len(), 1);
    }
}
