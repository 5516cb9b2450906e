//! Bounded in-memory cache with LRU eviction, TTL expiry and an optional
//! durable mirror.
//!
//! # Responsibility
//! - Serve hot values (topic trees, rendered content) within one session.
//! - Mirror writes to a `CacheStore` on a best-effort basis.
//!
//! # Invariants
//! - `len() <= max_size` after every public call.
//! - Entries older than `ttl` read as misses even before eviction.
//! - The in-memory map is authoritative; store failures are logged only.

pub mod store;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use store::{CacheStore, CacheStoreError, StoredCacheEntry};

/// Millisecond time source used for TTL and recency bookkeeping.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        crate::model::now_epoch_ms()
    }
}

/// Manually advanced clock; clones share one timeline.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<i64>>,
}

impl ManualClock {
    pub fn starting_at(now_ms: i64) -> Self {
        let clock = Self::default();
        clock.set(now_ms);
        clock
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by.as_millis() as i64);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

/// Size and expiry bounds of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    pub max_size: usize,
    pub ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_size: 100,
            ttl: Duration::from_secs(300),
        }
    }
}

/// One cached value with bookkeeping metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    pub data: V,
    /// Epoch ms when the value was written.
    pub timestamp: i64,
    pub access_count: u64,
    /// Epoch ms of the latest read or write.
    pub last_accessed: i64,
}

/// Named LRU cache.
pub struct LruCache<V, C = SystemClock> {
    name: String,
    options: CacheOptions,
    entries: HashMap<String, CacheEntry<V>>,
    store: Option<Box<dyn CacheStore>>,
    clock: C,
}

impl<V> LruCache<V, SystemClock>
where
    V: Serialize + DeserializeOwned,
{
    /// Creates a memory-only cache on the system clock.
    pub fn new(name: impl Into<String>, options: CacheOptions) -> Self {
        Self::with_clock(name, options, SystemClock)
    }
}

impl<V, C> LruCache<V, C>
where
    V: Serialize + DeserializeOwned,
    C: Clock,
{
    pub fn with_clock(name: impl Into<String>, options: CacheOptions, clock: C) -> Self {
        Self {
            name: name.into(),
            options: CacheOptions {
                max_size: options.max_size.max(1),
                ttl: options.ttl,
            },
            entries: HashMap::new(),
            store: None,
            clock,
        }
    }

    /// Attaches a durable mirror. Call [`LruCache::restore`] to load it.
    pub fn with_store(mut self, store: Box<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> CacheOptions {
        self.options
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Metadata view without touching recency.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    /// Returns the live value for `key`, or `None` on miss.
    ///
    /// Expired entries are evicted on read.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => self.is_expired(entry, now),
        };
        if expired {
            self.entries.remove(key);
            self.forget(key);
            debug!("event=cache_get module=cache status=expired cache={}", self.name);
            return None;
        }

        let (access_count, last_accessed) = {
            let entry = self.entries.get_mut(key)?;
            entry.access_count += 1;
            entry.last_accessed = now;
            (entry.access_count, entry.last_accessed)
        };
        if let Some(store) = &self.store {
            if let Err(err) = store.touch(key, access_count, last_accessed) {
                self.log_store_failure("touch", &err);
            }
        }
        self.entries.get(key).map(|entry| &entry.data)
    }

    /// Inserts or overwrites `key`; overwrites reset access metadata.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now_ms();
        let entry = CacheEntry {
            data: value,
            timestamp: now,
            access_count: 1,
            last_accessed: now,
        };
        self.persist(&key, &entry);
        self.entries.insert(key, entry);
        self.evict_overflow();
    }

    /// Removes `key`, or every entry when `key` is `None`.
    pub fn invalidate(&mut self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.entries.remove(key);
                self.forget(key);
            }
            None => {
                self.entries.clear();
                if let Some(store) = &self.store {
                    if let Err(err) = store.clear() {
                        self.log_store_failure("clear", &err);
                    }
                }
            }
        }
    }

    /// Loads the durable mirror into memory.
    ///
    /// Expired or undecodable records are dropped from the store. Returns the
    /// number of entries restored.
    pub fn restore(&mut self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };
        let records = match store.load_all() {
            Ok(records) => records,
            Err(err) => {
                self.log_store_failure("load", &err);
                return 0;
            }
        };

        let now = self.clock.now_ms();
        let mut stale = Vec::new();
        for record in records {
            if now - record.timestamp > self.ttl_ms() {
                stale.push(record.key);
                continue;
            }
            match serde_json::from_str::<V>(&record.data) {
                Ok(data) => {
                    self.entries.insert(
                        record.key,
                        CacheEntry {
                            data,
                            timestamp: record.timestamp,
                            access_count: record.access_count,
                            last_accessed: record.last_accessed,
                        },
                    );
                }
                Err(err) => {
                    warn!(
                        "event=cache_restore module=cache status=error cache={} error_code=decode_failed error={}",
                        self.name, err
                    );
                    stale.push(record.key);
                }
            }
        }
        for key in &stale {
            self.forget(key);
        }
        self.evict_overflow();

        debug!(
            "event=cache_restore module=cache status=ok cache={} restored={} dropped={}",
            self.name,
            self.entries.len(),
            stale.len()
        );
        self.entries.len()
    }

    fn ttl_ms(&self) -> i64 {
        self.options.ttl.as_millis() as i64
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: i64) -> bool {
        now - entry.timestamp > self.ttl_ms()
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.options.max_size {
            let Some(victim) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone())
            else {
                return;
            };
            self.entries.remove(&victim);
            self.forget(&victim);
            debug!("event=cache_evict module=cache status=ok cache={}", self.name);
        }
    }

    fn persist(&self, key: &str, entry: &CacheEntry<V>) {
        let Some(store) = &self.store else {
            return;
        };
        let result = serde_json::to_string(&entry.data)
            .map_err(CacheStoreError::from)
            .and_then(|data| {
                store.put(&StoredCacheEntry {
                    key: key.to_string(),
                    data,
                    timestamp: entry.timestamp,
                    access_count: entry.access_count,
                    last_accessed: entry.last_accessed,
                })
            });
        if let Err(err) = result {
            self.log_store_failure("put", &err);
        }
    }

    fn forget(&self, key: &str) {
        if let Some(store) = &self.store {
            if let Err(err) = store.delete(key) {
                self.log_store_failure("delete", &err);
            }
        }
    }

    fn log_store_failure(&self, op: &str, err: &CacheStoreError) {
        warn!(
            "event=cache_persist module=cache status=error cache={} op={} error={}",
            self.name, op, err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheOptions, LruCache, ManualClock};
    use std::time::Duration;

    fn cache(max_size: usize, clock: &ManualClock) -> LruCache<String, ManualClock> {
        LruCache::with_clock(
            "unit",
            CacheOptions {
                max_size,
                ttl: Duration::from_secs(60),
            },
            clock.clone(),
        )
    }

    #[test]
    fn overwrite_resets_access_count() {
        let clock = ManualClock::starting_at(1_000);
        let mut cache = cache(4, &clock);
        cache.set("k", "one".to_string());
        cache.get("k");
        cache.get("k");
        assert_eq!(cache.entry("k").map(|e| e.access_count), Some(3));

        cache.set("k", "two".to_string());
        assert_eq!(cache.entry("k").map(|e| e.access_count), Some(1));
        assert_eq!(cache.get("k").map(String::as_str), Some("two"));
    }

    #[test]
    fn read_refreshes_recency() {
        let clock = ManualClock::starting_at(0);
        let mut cache = cache(2, &clock);
        cache.set("a", "a".to_string());
        clock.advance(Duration::from_millis(1));
        cache.set("b", "b".to_string());
        clock.advance(Duration::from_millis(1));
        cache.get("a");
        clock.advance(Duration::from_millis(1));
        cache.set("c", "c".to_string());

        assert!(cache.entry("a").is_some());
        assert!(cache.entry("b").is_none());
        assert!(cache.entry("c").is_some());
    }

    #[test]
    fn entry_at_exact_ttl_is_still_live() {
        let clock = ManualClock::starting_at(0);
        let mut cache = cache(2, &clock);
        cache.set("a", "a".to_string());
        clock.advance(Duration::from_secs(60));
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn zero_max_size_is_clamped_to_one() {
        let clock = ManualClock::default();
        let cache = cache(0, &clock);
        assert_eq!(cache.options().max_size, 1);
    }
}
