//! TTL + LRU cache
//!
//! One mutex guards the entry map and the counters. Expired entries are
//! dropped lazily when a lookup touches them (or in bulk via
//! `purge_expired`). When a new key arrives at capacity, the entry with the
//! oldest access is evicted; an access sequence number breaks ties between
//! entries touched within the same clock tick.

use crate::config::CacheConfig;
use crate::error::CacheError;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Memoized value plus access bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
    access_count: u64,
    last_access: Instant,
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration, seq: u64) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            ttl,
            access_count: 0,
            last_access: now,
            seq,
        }
    }

    /// Cached value
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Insertion instant
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time-to-live from `created_at`
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of successful lookups
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    /// Instant of the most recent insertion or hit
    pub fn last_access(&self) -> Instant {
        self.last_access
    }

    /// Whether the entry has outlived its TTL at `now`
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }

    fn touch(&mut self, now: Instant, seq: u64) {
        self.access_count += 1;
        self.last_access = now;
        self.seq = seq;
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that returned a live entry
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries currently stored
    pub size: usize,
    /// Configured capacity
    pub max_size: usize,
    /// `hits / (hits + misses)`
    pub hit_rate: f64,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: FxHashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    next_seq: u64,
}

impl<V> CacheState<V> {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    fn evict_lru(&mut self) -> Option<String> {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_access, entry.seq))
            .map(|(key, _)| key.clone())?;
        self.entries.remove(&victim);
        self.evictions += 1;
        Some(victim)
    }
}

/// Bounded TTL + LRU cache keyed by string
#[derive(Debug)]
pub struct HighPerformanceCache<V> {
    config: CacheConfig,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> HighPerformanceCache<V> {
    /// Build a cache from a validated configuration
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self {
            config,
            state: Mutex::new(CacheState {
                entries: FxHashMap::default(),
                hits: 0,
                misses: 0,
                evictions: 0,
                next_seq: 0,
            }),
        })
    }

    /// Cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up `key`, counting a hit or a miss
    ///
    /// An expired entry counts as a miss and is removed.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let expired = state.entries.get(key).map(|entry| entry.is_expired_at(now));
        if expired.is_none() {
            state.misses += 1;
            return None;
        }
        if expired == Some(true) {
            state.entries.remove(key);
            state.misses += 1;
            trace!(key, "expired entry dropped");
            return None;
        }

        let seq = state.next_seq();
        state.hits += 1;
        let entry = state.entries.get_mut(key)?;
        entry.touch(now, seq);
        Some(entry.value.clone())
    }

    /// Inspect the entry under `key` without counting a lookup
    ///
    /// Leaves hit/miss counters and recency untouched; an expired entry reads
    /// as absent but stays stored until the next `get` or purge.
    pub fn peek(&self, key: &str) -> Option<CacheEntry<V>> {
        let now = Instant::now();
        let state = self.state.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .cloned()
    }

    /// Store `value` under `key`, evicting the least recently used entry if a
    /// new key would exceed capacity
    ///
    /// `ttl` falls back to the configured default. Replacing an existing key
    /// never evicts.
    pub fn put(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let mut state = self.state.lock();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.config.max_size {
            if let Some(victim) = state.evict_lru() {
                debug!(key = %victim, "evicted least recently used entry");
            }
        }

        let seq = state.next_seq();
        state.entries.insert(key, CacheEntry::new(value, ttl, seq));
    }

    /// Remove `key`; returns whether it was present
    pub fn evict(&self, key: &str) -> bool {
        self.state.lock().entries.remove(key).is_some()
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - state.entries.len()
    }

    /// Number of stored entries (expired ones included until touched)
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `hits / (hits + misses)`, 0 before any lookup
    pub fn get_hit_rate(&self) -> f64 {
        self.state.lock().hit_rate()
    }

    /// Counter snapshot
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            size: state.entries.len(),
            max_size: self.config.max_size,
            hit_rate: state.hit_rate(),
        }
    }

    /// Remove all entries and zero the counters
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        state.evictions = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn cache(max_size: usize) -> HighPerformanceCache<String> {
        HighPerformanceCache::new(CacheConfig {
            max_size,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_lru_eviction() {
        let cache = cache(3);
        cache.put("k1", "v1".to_string(), None);
        cache.put("k2", "v2".to_string(), None);
        cache.put("k3", "v3".to_string(), None);
        assert_eq!(cache.get("k1").as_deref(), Some("v1"));

        cache.put("k4", "v4".to_string(), None);

        assert_eq!(cache.len(), 3);
        assert!(cache.get("k2").is_none());
        assert_eq!(cache.get("k1").as_deref(), Some("v1"));
        assert_eq!(cache.get("k3").as_deref(), Some("v3"));
        assert_eq!(cache.get("k4").as_deref(), Some("v4"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = cache(10);
        cache.put("key", "val".to_string(), Some(Duration::from_millis(100)));
        assert_eq!(cache.get("key").as_deref(), Some("val"));

        std::thread::sleep(Duration::from_millis(150));
        assert!(cache.get("key").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_replace_existing_key_does_not_evict() {
        let cache = cache(2);
        cache.put("a", "1".to_string(), None);
        cache.put("b", "2".to_string(), None);
        cache.put("a", "3".to_string(), None);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get("a").as_deref(), Some("3"));
        assert_eq!(cache.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn test_hit_rate() {
        let cache = cache(10);
        assert_eq!(cache.get_hit_rate(), 0.0);

        cache.put("a", "1".to_string(), None);
        cache.get("a");
        cache.get("a");
        cache.get("a");
        cache.get("missing");
        assert!((cache.get_hit_rate() - 0.75).abs() < 1e-12);

        let stats = cache.stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.max_size, 10);
    }

    #[test]
    fn test_clear_resets_counters() {
        let cache = cache(1);
        cache.put("a", "1".to_string(), None);
        cache.put("b", "2".to_string(), None);
        cache.get("b");
        cache.get("a");

        cache.clear();
        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.size, 0);
        assert_eq!(cache.get_hit_rate(), 0.0);
    }

    #[test]
    fn test_explicit_evict_and_purge() {
        let cache = cache(10);
        cache.put("short", "1".to_string(), Some(Duration::ZERO));
        cache.put("long", "2".to_string(), None);

        assert!(cache.evict("long"));
        assert!(!cache.evict("long"));

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_access_bookkeeping() {
        let cache = cache(4);
        cache.put("a", "1".to_string(), None);
        cache.get("a");
        cache.get("a");

        let entry = cache.peek("a").unwrap();
        assert_eq!(entry.access_count(), 2);
        assert!(entry.last_access() >= entry.created_at());
        assert_eq!(entry.ttl(), Duration::from_secs(300));
        assert_eq!(entry.value(), "1");
    }

    #[test]
    fn test_peek_leaves_counters_and_recency() {
        let cache = cache(2);
        cache.put("a", "1".to_string(), None);
        cache.put("b", "2".to_string(), None);

        assert_eq!(cache.peek("a").unwrap().access_count(), 0);
        assert!(cache.peek("missing").is_none());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (0, 0));

        // "a" is still least recently used, so it is the one evicted
        cache.put("c", "3".to_string(), None);
        assert!(cache.peek("a").is_none());
        assert!(cache.peek("b").is_some());
    }

    #[test]
    fn test_peek_hides_expired_entry() {
        let cache = cache(4);
        cache.put("a", "1".to_string(), Some(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(2));
        assert!(cache.peek("a").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_capacity_never_exceeded_under_contention() {
        let cache = Arc::new(cache(16));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        cache.put(format!("{t}-{i}"), i.to_string(), None);
                        cache.get(&format!("{t}-{}", i / 2));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = cache.stats();
        assert_eq!(stats.size, 16);
        assert_eq!(stats.hits + stats.misses, 800);
    }

    #[test]
    fn test_stats_serialize() {
        let cache = cache(2);
        cache.put("a", "1".to_string(), None);
        let json = serde_json::to_value(cache.stats()).unwrap();
        assert_eq!(json["size"], 1);
        assert_eq!(json["max_size"], 2);
    }
}
