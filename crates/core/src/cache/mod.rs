//! Bounded, time-expiring cache for availability responses.
//!
//! Entries are keyed by [`CacheKey`] and expire `ttl` after insertion. Expired
//! entries are dropped lazily, on the lookup that finds them stale. When an
//! insert pushes the cache past capacity the oldest *inserted* entry is
//! evicted; reads never refresh an entry's position (FIFO, not LRU).
//!
//! Time is read from `tokio::time::Instant` so tests can pause and advance
//! the clock.

pub mod key;

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

pub use key::CacheKey;

use crate::model::DayRecords;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 12;

/// Default entry lifetime (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cached payload with its expiry.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    data: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Insertion-ordered cache with a hard size bound and per-entry TTL.
#[derive(Debug)]
pub struct RequestCache<V = DayRecords> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl<V: Clone> RequestCache<V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: HashMap::with_capacity(capacity), order: VecDeque::with_capacity(capacity), capacity }
    }

    /// Return the cached payload if present and not expired.
    ///
    /// A stale entry is removed as a side effect.
    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.data.clone()),
            Some(_) => {
                tracing::debug!("cache entry expired for {}", key);
                self.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite `key`, expiring `ttl` from now.
    ///
    /// Overwriting keeps the key's original insertion position. Inserting a
    /// new key past capacity evicts the oldest inserted entry.
    pub fn put(&mut self, key: CacheKey, data: V, ttl: Duration) {
        let entry = CacheEntry { data, expires_at: Instant::now() + ttl };

        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = entry;
            return;
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, entry);

        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else { break };
            tracing::debug!("cache full, evicting {}", oldest);
            self.entries.remove(&oldest);
        }
    }

    /// Whether a live entry exists for `key`. Does not evict.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.get(key).is_some_and(|e| !e.is_expired(Instant::now()))
    }

    /// Drop `key` if present.
    pub fn remove(&mut self, key: &CacheKey) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(entry.data)
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of stored entries, including expired ones not yet looked up.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.order.iter()
    }
}

impl<V: Clone> Default for RequestCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
