//! Cache-first fetching with cancellation and latest-wins sequencing.
//!
//! Every refresh of a widget begins a [`RequestTicket`]. Beginning a ticket
//! cancels the previous ticket's token and bumps the sequence number, so a
//! slow response for an old window can neither write the cache nor reach the
//! day cells once a newer request exists.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use availcal_core::{CacheKey, DateRange, DayRecords, RequestCache, WidgetConfig};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::AvailabilitySource;

/// Result of a coordinated fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Records to paint. Empty when the endpoint failed.
    Data(DayRecords),
    /// The request was superseded before its response arrived.
    Cancelled,
}

impl FetchOutcome {
    pub fn into_data(self) -> Option<DayRecords> {
        match self {
            FetchOutcome::Data(records) => Some(records),
            FetchOutcome::Cancelled => None,
        }
    }
}

/// Handle for one logical request issued by a widget.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    seq: u64,
    token: CancellationToken,
}

impl RequestTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Fronts an [`AvailabilitySource`] with the request cache and request ordering.
pub struct FetchCoordinator<S> {
    source: S,
    cache: Mutex<RequestCache<DayRecords>>,
    ttl: Duration,
    latest_seq: AtomicU64,
    active: Mutex<Option<CancellationToken>>,
}

impl<S: AvailabilitySource> FetchCoordinator<S> {
    /// Create a coordinator with the given cache capacity and entry TTL.
    pub fn new(source: S, capacity: usize, ttl: Duration) -> Self {
        Self {
            source,
            cache: Mutex::new(RequestCache::new(capacity)),
            ttl,
            latest_seq: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// Create a coordinator sized from widget configuration.
    pub fn from_config(source: S, config: &WidgetConfig) -> Self {
        Self::new(source, config.max_cache_size, config.cache_ttl())
    }

    /// Begin a new logical request, cancelling the previous one.
    pub async fn begin(&self) -> RequestTicket {
        let token = CancellationToken::new();
        let previous = self.active.lock().await.replace(token.clone());
        if let Some(previous) = previous {
            previous.cancel();
        }
        let seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(seq, "request issued");
        RequestTicket { seq, token }
    }

    /// Whether `ticket` is still the most recently issued request.
    pub fn is_latest(&self, ticket: &RequestTicket) -> bool {
        ticket.seq == self.latest_seq.load(Ordering::SeqCst) && !ticket.is_cancelled()
    }

    /// Highest sequence number issued so far.
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq.load(Ordering::SeqCst)
    }

    /// Fetch day records for one property, room type and window.
    ///
    /// Serves from the cache when possible. Endpoint failures are logged and
    /// reported as an empty mapping. When `token` is cancelled before the
    /// response resolves the response is discarded and nothing is cached.
    pub async fn fetch_range(
        &self, property_id: &str, room_type_id: &str, range: DateRange, token: Option<&CancellationToken>,
    ) -> FetchOutcome {
        let key = CacheKey::new(property_id, room_type_id, range);

        if let Some(records) = self.cache.lock().await.get(&key) {
            tracing::debug!("cache hit for {}", key);
            return FetchOutcome::Data(records);
        }

        if token.is_some_and(CancellationToken::is_cancelled) {
            tracing::debug!("request for {} cancelled before send", key);
            return FetchOutcome::Cancelled;
        }

        tracing::debug!("cache miss for {}, fetching", key);
        let result = match token {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("request for {} cancelled in flight", key);
                        return FetchOutcome::Cancelled;
                    }
                    result = self.source.fetch_dates(&key) => result,
                }
            }
            None => self.source.fetch_dates(&key).await,
        };

        if token.is_some_and(CancellationToken::is_cancelled) {
            tracing::debug!("discarding late response for {}", key);
            return FetchOutcome::Cancelled;
        }

        match result {
            Ok(records) => {
                self.cache.lock().await.put(key, records.clone(), self.ttl);
                FetchOutcome::Data(records)
            }
            Err(e) => {
                tracing::error!(code = e.code(), "availability fetch for {} failed: {}", key, e);
                FetchOutcome::Data(DayRecords::new())
            }
        }
    }

    /// Number of entries currently held by the request cache.
    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Whether a live cache entry exists for `key`.
    pub async fn is_cached(&self, key: &CacheKey) -> bool {
        self.cache.lock().await.contains(key)
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use availcal_core::dates::visible_range;
    use availcal_core::{DayRecord, Error};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Source answering per start date after a scripted delay.
    #[derive(Default)]
    struct ScriptedSource {
        delays: HashMap<NaiveDate, Duration>,
        failing: bool,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn with_delay(mut self, start: NaiveDate, delay: Duration) -> Self {
            self.delays.insert(start, delay);
            self
        }
    }

    #[async_trait::async_trait]
    impl AvailabilitySource for ScriptedSource {
        async fn fetch_dates(&self, key: &CacheKey) -> Result<DayRecords, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(&key.range.start()) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing {
                return Err(Error::NetworkFailure("status 500: boom".into()));
            }
            let mut records = DayRecords::new();
            records.insert(key.start_param(), DayRecord::priced(120));
            Ok(records)
        }
    }

    fn may() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    fn june() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn coordinator(source: ScriptedSource) -> FetchCoordinator<ScriptedSource> {
        FetchCoordinator::new(source, 12, Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_second_fetch_served_from_cache() {
        let coordinator = coordinator(ScriptedSource::default());
        let range = visible_range(may(), 2).unwrap();

        let first = coordinator.fetch_range("123", "456", range, None).await;
        let second = coordinator.fetch_range("123", "456", range, None).await;

        assert_eq!(first, second);
        assert_eq!(coordinator.source().calls.load(Ordering::SeqCst), 1);
        assert!(coordinator.is_cached(&CacheKey::new("123", "456", range)).await);
    }

    #[tokio::test]
    async fn test_distinct_rooms_are_distinct_keys() {
        let coordinator = coordinator(ScriptedSource::default());
        let range = visible_range(may(), 2).unwrap();

        coordinator.fetch_range("123", "456", range, None).await;
        coordinator.fetch_range("123", "789", range, None).await;

        assert_eq!(coordinator.source().calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.cached_entries().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_expiry_refetches() {
        let coordinator = FetchCoordinator::new(ScriptedSource::default(), 12, Duration::from_secs(60));
        let range = visible_range(may(), 2).unwrap();

        coordinator.fetch_range("123", "456", range, None).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        coordinator.fetch_range("123", "456", range, None).await;

        assert_eq!(coordinator.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_returns_empty_and_is_not_cached() {
        let coordinator = coordinator(ScriptedSource { failing: true, ..Default::default() });
        let range = visible_range(may(), 2).unwrap();

        let outcome = coordinator.fetch_range("123", "456", range, None).await;
        assert_eq!(outcome, FetchOutcome::Data(DayRecords::new()));
        assert_eq!(coordinator.cached_entries().await, 0);

        coordinator.fetch_range("123", "456", range, None).await;
        assert_eq!(coordinator.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_send_skips_network() {
        let coordinator = coordinator(ScriptedSource::default());
        let range = visible_range(may(), 2).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = coordinator.fetch_range("123", "456", range, Some(&token)).await;
        assert_eq!(outcome, FetchOutcome::Cancelled);
        assert_eq!(coordinator.source().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_in_flight_is_discarded_and_not_cached() {
        let source = ScriptedSource::default().with_delay(may(), Duration::from_millis(500));
        let coordinator = Arc::new(coordinator(source));
        let range = visible_range(may(), 2).unwrap();

        let first = coordinator.begin().await;
        let task = {
            let coordinator = Arc::clone(&coordinator);
            let token = first.token().clone();
            tokio::spawn(async move { coordinator.fetch_range("123", "456", range, Some(&token)).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = coordinator.begin().await;

        assert_eq!(task.await.unwrap(), FetchOutcome::Cancelled);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(coordinator.cached_entries().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_wins_without_transport_cancellation() {
        let source = ScriptedSource::default()
            .with_delay(may(), Duration::from_millis(400))
            .with_delay(june(), Duration::from_millis(50));
        let coordinator = coordinator(source);
        let range_a = visible_range(may(), 2).unwrap();
        let range_b = visible_range(june(), 2).unwrap();

        let ticket_a = coordinator.begin().await;
        let ticket_b = coordinator.begin().await;

        let (a, b) = tokio::join!(
            coordinator.fetch_range("123", "456", range_a, None),
            coordinator.fetch_range("123", "456", range_b, None),
        );

        assert!(a.into_data().is_some());
        assert!(b.into_data().is_some());
        assert!(!coordinator.is_latest(&ticket_a));
        assert!(coordinator.is_latest(&ticket_b));
        assert_eq!(coordinator.latest_seq(), 2);
    }

    #[tokio::test]
    async fn test_sequence_is_monotonic() {
        let coordinator = coordinator(ScriptedSource::default());
        let mut last = 0;
        for _ in 0..5 {
            let ticket = coordinator.begin().await;
            assert!(ticket.seq() > last);
            last = ticket.seq();
        }
    }
}
