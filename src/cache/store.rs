//! Cache Store Module
//!
//! Main eviction engine combining a key index with the recency list and
//! lazy TTL expiration.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::entry::{deadline, Entry};
use crate::cache::lru::{RecencyList, SlotId};
use crate::config::CacheConfig;
use crate::error::{ConfigError, Result};

/// Callback fired with the key and value of every entry physically removed
/// from the cache.
pub type EvictCallback<K, V> = Box<dyn FnMut(&K, &V) + Send>;

// == LRU Cache ==
/// Fixed-capacity LRU cache with optional per-entry and cache-wide TTL.
///
/// Not thread-safe. Callers sharing one cache across threads wrap it in
/// their own `Mutex`.
///
/// Expired entries are reaped lazily: they are hidden from reads, still
/// counted by [`len`](Self::len), and physically dropped only by
/// [`remove`](Self::remove), [`remove_oldest`](Self::remove_oldest),
/// [`get_oldest`](Self::get_oldest), capacity eviction,
/// [`resize`](Self::resize) or [`purge`](Self::purge).
pub struct LruCache<K, V> {
    /// Key to recency-list slot
    index: HashMap<K, SlotId>,
    /// Entries ordered from most to least recently used
    list: RecencyList<Entry<K, V>>,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL for entries written without an explicit one
    default_ttl: Option<Duration>,
    on_evict: Option<EvictCallback<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructors ==
    /// Creates a cache whose entries never expire unless written with
    /// [`put_with_ttl`](Self::put_with_ttl).
    ///
    /// Fails with [`ConfigError::ZeroCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize, on_evict: Option<EvictCallback<K, V>>) -> Result<Self> {
        Self::with_expiry(capacity, Duration::ZERO, on_evict)
    }

    /// Creates a cache applying `default_ttl` to entries written without
    /// their own TTL. A zero `default_ttl` disables default expiry.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries, must be positive
    /// * `default_ttl` - Cache-wide TTL
    /// * `on_evict` - Optional callback fired on every removal
    pub fn with_expiry(
        capacity: usize,
        default_ttl: Duration,
        on_evict: Option<EvictCallback<K, V>>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        let default_ttl = (!default_ttl.is_zero()).then_some(default_ttl);
        debug!(
            "LRU cache created: capacity={}, default_ttl={:?}",
            capacity, default_ttl
        );
        Ok(Self {
            index: HashMap::new(),
            list: RecencyList::new(),
            capacity,
            default_ttl,
            on_evict,
        })
    }

    /// Creates a cache from a validated [`CacheConfig`].
    pub fn from_config(
        config: &CacheConfig,
        on_evict: Option<EvictCallback<K, V>>,
    ) -> Result<Self> {
        config.validate()?;
        Self::with_expiry(
            config.capacity,
            config.default_ttl().unwrap_or_default(),
            on_evict,
        )
    }

    // == Put ==
    /// Stores a key-value pair using the default TTL.
    ///
    /// Returns true if an older entry was evicted to make room.
    pub fn put(&mut self, key: K, value: V) -> bool {
        self.insert(key, value, None)
    }

    /// Stores a key-value pair expiring after `ttl`.
    ///
    /// A zero `ttl` falls back to the default TTL. Returns true if an older
    /// entry was evicted to make room.
    pub fn put_with_ttl(&mut self, key: K, value: V, ttl: Duration) -> bool {
        self.insert(key, value, Some(ttl))
    }

    fn insert(&mut self, key: K, value: V, ttl: Option<Duration>) -> bool {
        let expires_at = deadline(ttl, self.default_ttl);

        // Overwrite in place, no capacity change
        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            if let Some(entry) = self.list.get_mut(id) {
                entry.value = value;
                entry.expires_at = expires_at;
            }
            return false;
        }

        let id = self.list.push_front(Entry::new(key.clone(), value, expires_at));
        self.index.insert(key, id);

        // Size grows by at most one per call, so one eviction is enough
        let evict = self.list.len() > self.capacity;
        if evict {
            self.evict_oldest();
            trace!("Capacity eviction: len={}, capacity={}", self.len(), self.capacity);
        }
        evict
    }

    // == Get ==
    /// Retrieves a value and marks it as most recently used.
    ///
    /// An expired entry is reported as a miss. It is neither promoted nor
    /// removed here.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        if self.list.get(id)?.is_expired() {
            return None;
        }
        self.list.move_to_front(id);
        self.list.get(id).map(|entry| &entry.value)
    }

    // == Peek ==
    /// Retrieves a value without touching recency order.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key).map(|entry| &entry.value)
    }

    // == Contains ==
    /// Checks if a key is present and not expired, without touching
    /// recency order.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key).is_some()
    }

    /// Returns how long a live entry has left, or None if it is absent,
    /// expired, or never expires.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key).and_then(Entry::ttl_remaining)
    }

    // == Remove ==
    /// Removes an entry by key, expired or not.
    ///
    /// Returns true if the key was present. The eviction callback fires for
    /// the removed entry.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&id) = self.index.get(key) else {
            return false;
        };
        self.remove_slot(id);
        true
    }

    // == Remove Oldest ==
    /// Removes the least recently used live entry and returns it.
    ///
    /// Expired entries found at the back on the way are removed too (and
    /// reported to the eviction callback) but never returned.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let mut reaped = 0usize;
        let mut found = None;
        while let Some(id) = self.list.back_id() {
            let Some(entry) = self.remove_slot(id) else {
                break;
            };
            if entry.is_expired() {
                reaped += 1;
                continue;
            }
            found = Some((entry.key, entry.value));
            break;
        }
        if reaped > 0 {
            debug!("remove_oldest: reaped {} expired entries", reaped);
        }
        found
    }

    // == Get Oldest ==
    /// Returns the least recently used live entry without promoting it.
    ///
    /// This is a read with cleanup: expired entries sitting at the back are
    /// physically removed (firing the eviction callback) until a live entry
    /// or an empty cache is reached. That is why it takes `&mut self`.
    pub fn get_oldest(&mut self) -> Option<(&K, &V)> {
        let mut reaped = 0usize;
        while let Some(id) = self.list.back_id() {
            match self.list.get(id) {
                Some(entry) if entry.is_expired() => {}
                _ => break,
            }
            self.remove_slot(id);
            reaped += 1;
        }
        if reaped > 0 {
            debug!("get_oldest: reaped {} expired entries", reaped);
        }
        self.list.back().map(|entry| (&entry.key, &entry.value))
    }

    // == Keys ==
    /// Returns a snapshot of live keys, oldest first.
    ///
    /// Expired entries are skipped but left in place.
    pub fn keys(&self) -> Vec<K> {
        let now = Instant::now();
        self.list
            .iter_oldest_first()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.key.clone())
            .collect()
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones that
    /// have not been reaped yet.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    // == Resize ==
    /// Changes the capacity, evicting from the back until the cache fits.
    ///
    /// Returns the number of evicted entries. `new_capacity` is not
    /// validated: with a capacity of zero every later `put` of a new key
    /// evicts straight away.
    pub fn resize(&mut self, new_capacity: usize) -> usize {
        let diff = self.len().saturating_sub(new_capacity);
        for _ in 0..diff {
            self.evict_oldest();
        }
        debug!(
            "Cache resized: capacity {} -> {}, evicted {}",
            self.capacity, new_capacity, diff
        );
        self.capacity = new_capacity;
        diff
    }

    // == Purge ==
    /// Removes every entry, firing the eviction callback for each one from
    /// oldest to newest.
    pub fn purge(&mut self) {
        let count = self.list.len();
        // Detach each entry before reporting it
        while let Some(entry) = self.list.pop_back() {
            self.forget(&entry);
        }
        self.list.clear();
        debug!("Cache purged: removed {} entries", count);
    }

    fn live_entry<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = *self.index.get(key)?;
        self.list.get(id).filter(|entry| !entry.is_expired())
    }

    /// Drops the back entry regardless of expiry.
    fn evict_oldest(&mut self) {
        if let Some(entry) = self.list.pop_back() {
            self.forget(&entry);
        }
    }

    /// Detaches a slot from both the list and the index.
    fn remove_slot(&mut self, id: SlotId) -> Option<Entry<K, V>> {
        let entry = self.list.remove(id)?;
        self.forget(&entry);
        Some(entry)
    }

    fn forget(&mut self, entry: &Entry<K, V>) {
        self.index.remove(&entry.key);
        if let Some(on_evict) = self.on_evict.as_mut() {
            on_evict(&entry.key, &entry.value);
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.list.check_invariants();
        assert_eq!(self.index.len(), self.list.len(), "index/list size mismatch");
        for (key, &id) in &self.index {
            let entry = self.list.get(id).expect("indexed slot must be live");
            assert!(entry.key == *key, "index points at a foreign entry");
        }
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("len", &self.list.len())
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("on_evict", &self.on_evict.is_some())
            .finish()
    }
}
