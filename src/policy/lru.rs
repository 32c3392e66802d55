//! # Size-Bounded LRU Engine
//!
//! The core of the library: a capacity-bounded mapping from key to value with
//! O(1) access, recency reordering, and tail eviction. Capacity is a budget
//! in abstract size units reported by the values themselves
//! ([`Cacheable::size`]), not an item count.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                       LruCache<K, V>                         │
//!   │                 Arc<parking_lot::Mutex<...>>                 │
//!   │                            │                                 │
//!   │                            ▼                                 │
//!   │   ┌────────────────────────────────────────────────────────┐ │
//!   │   │                    LruCore<K, V>                       │ │
//!   │   │                                                        │ │
//!   │   │  FxHashMap<K, NonNull<Node>>   (key → node index)      │ │
//!   │   │                                                        │ │
//!   │   │  head ──► ┌──────┐ ◄──► ┌──────┐ ◄──► ┌──────┐ ◄── tail│ │
//!   │   │    (MRU)  │ Node │      │ Node │      │ Node │  (LRU)  │ │
//!   │   │           └──────┘      └──────┘      └──────┘         │ │
//!   │   │                                                        │ │
//!   │   │  size: Σ node.size    capacity: i64    on_miss loader  │ │
//!   │   └────────────────────────────────────────────────────────┘ │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Method            | Complexity | Description                              |
//! |-------------------|------------|------------------------------------------|
//! | `get(&k)`         | O(1)       | Promote to MRU; consult loader on miss   |
//! | `set(k, v)`       | O(1)*      | Insert/replace, then evict until it fits |
//! | `set_if_absent`   | O(1)       | Insert, or promote-only when present     |
//! | `delete(&k)`      | O(1)       | Remove, fire `Delete` notification       |
//! | `clear()`         | O(n)       | Fire `ClearAll` per entry, then empty    |
//! | `set_capacity(c)` | O(evicted) | Shrink may evict several entries         |
//! | `keys/values/items` | O(n)     | MRU-first snapshots, never live views    |
//!
//! \* amortized; one oversized insert may evict several small entries.
//!
//! ## Eviction
//!
//! After any operation that can grow `size` (fresh insert, in-place update
//! growth, capacity shrink) the engine pops the tail, unindexes it, subtracts
//! its size, and fires [`PurgeReason::CacheFull`], repeating until
//! `size <= capacity` or the list is empty. Zero or negative capacity is not
//! special-cased: a new entry is inserted, indexed, and purged again within
//! the same call.
//!
//! ## Concurrency Model
//!
//! `LruCore` is single-threaded. [`LruCache`] guards it with one exclusive
//! `parking_lot::Mutex` held for the full duration of every operation,
//! including purge notifications and the miss loader. At most one operation
//! runs against an engine at any instant, so no partial-update races are
//! possible; the flip side is that a slow loader or purge observer stalls
//! every other caller of that engine until it returns. That trade (strict
//! consistency over throughput) is part of the contract — callbacks that need
//! to do slow work should hand it off and return. Callbacks must not call
//! back into the same cache instance: the lock is not reentrant and the call
//! will deadlock.
//!
//! ## Safety
//!
//! Nodes are heap-allocated and tracked via `NonNull` pointers; the map owns
//! the key→node association and the list owns the ordering. All pointer
//! manipulation is confined to `detach`/`attach_front`/`pop_tail`, and
//! `check_invariants` verifies the bijection between index and list in debug
//! builds after every mutation.

use std::fmt;
use std::hash::Hash;
use std::ptr::NonNull;
use std::sync::Arc;

#[cfg(feature = "concurrency")]
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::InvariantError;
#[cfg(feature = "metrics")]
use crate::metrics::{CacheMetricsSnapshot, EngineMetrics};
use crate::stats::{CacheStats, StatsSource};
use crate::traits::{Cache, Cacheable, Item, MissHandler, PurgeReason};

/// Node in the recency list.
///
/// List pointers first for traversal locality; the key is needed to unindex
/// during eviction, and the size is captured once at insert/update time.
#[repr(C)]
struct Node<K, V> {
    prev: Option<NonNull<Node<K, V>>>,
    next: Option<NonNull<Node<K, V>>>,
    key: K,
    value: Arc<V>,
    size: i64,
}

/// Single-threaded LRU engine: `FxHashMap` index + raw-pointer recency list.
///
/// Values are held as `Arc<V>`, so `get` and the snapshot accessors hand out
/// cheap clones and an evicted value can still be observed by its purge
/// callback without copying the payload.
///
/// Not thread-safe on its own; wrap in [`LruCache`] for concurrent use.
///
/// # Example
///
/// ```
/// use lrukit::policy::lru::LruCore;
///
/// let mut cache: LruCore<u64, String> = LruCore::new(2);
/// cache.set(1, "one".to_string().into());
/// cache.set(2, "two".to_string().into());
/// cache.set(3, "three".to_string().into());
///
/// // Unit sizes, capacity 2: key 1 was least recently used and is gone.
/// assert!(cache.get(&1).is_none());
/// assert_eq!(cache.keys(), vec![3, 2]);
/// ```
pub struct LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    map: FxHashMap<K, NonNull<Node<K, V>>>,
    head: Option<NonNull<Node<K, V>>>,
    tail: Option<NonNull<Node<K, V>>>,
    size: i64,
    capacity: i64,
    on_miss: Option<MissHandler<K, V>>,
    #[cfg(feature = "metrics")]
    metrics: EngineMetrics,
}

// SAFETY: the raw pointers only reference heap nodes owned by this struct,
// and Arc<V> requires V: Send + Sync to cross threads.
unsafe impl<K, V> Send for LruCore<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Cacheable + Send + Sync,
{
}

// SAFETY: &self methods only read through the node pointers; mutation
// requires &mut self and is serialized by the wrapper's lock.
unsafe impl<K, V> Sync for LruCore<K, V>
where
    K: Eq + Hash + Clone + Sync,
    V: Cacheable + Send + Sync,
{
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    /// Creates a new empty engine with the given capacity in size units.
    ///
    /// Zero or negative capacity is accepted; such an engine purges every
    /// insertion immediately (see the module docs on eviction).
    pub fn new(capacity: i64) -> Self {
        LruCore {
            map: FxHashMap::default(),
            head: None,
            tail: None,
            size: 0,
            capacity,
            on_miss: None,
            #[cfg(feature = "metrics")]
            metrics: EngineMetrics::default(),
        }
    }

    /// Looks up `key`, promoting the entry to MRU on a hit.
    ///
    /// On a miss with a registered loader, the loader is invoked; a `Some`
    /// result is inserted as a fresh entry (capacity enforcement included)
    /// and returned. Without a loader, a miss is just `None`.
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        #[cfg(feature = "metrics")]
        self.metrics.record_get_call();

        if let Some(&node_ptr) = self.map.get(key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_hit();

            self.detach(node_ptr);
            self.attach_front(node_ptr);

            #[cfg(debug_assertions)]
            self.validate_invariants();

            return Some(unsafe { Arc::clone(&(*node_ptr.as_ptr()).value) });
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_get_miss();

        let loader = self.on_miss.clone()?;
        let value = loader(key)?;

        #[cfg(feature = "metrics")]
        self.metrics.record_miss_load();

        // Inserted as if via set; may be evicted again in the same call if
        // it overflows capacity, but the caller still receives it.
        self.add_new(key.clone(), Arc::clone(&value));
        Some(value)
    }

    /// Inserts or replaces the value for `key`, then enforces capacity.
    pub fn set(&mut self, key: K, value: Arc<V>) {
        #[cfg(feature = "metrics")]
        self.metrics.record_set_call();

        if let Some(&node_ptr) = self.map.get(&key) {
            self.update_inplace(node_ptr, value);
        } else {
            self.add_new(key, value);
        }
    }

    /// Inserts only if `key` is absent; a present entry is promoted to MRU
    /// and `value` is discarded without any purge notification.
    pub fn set_if_absent(&mut self, key: K, value: Arc<V>) {
        if let Some(&node_ptr) = self.map.get(&key) {
            self.detach(node_ptr);
            self.attach_front(node_ptr);

            #[cfg(debug_assertions)]
            self.validate_invariants();
        } else {
            self.add_new(key, value);
        }
    }

    /// Removes `key`, firing [`PurgeReason::Delete`] on its value.
    ///
    /// Returns whether the key was present; absent keys fire nothing.
    pub fn delete(&mut self, key: &K) -> bool {
        let Some(node_ptr) = self.map.remove(key) else {
            return false;
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_delete();

        self.detach(node_ptr);
        let node = unsafe { Box::from_raw(node_ptr.as_ptr()) };
        self.size -= node.size;
        node.value.on_purge(PurgeReason::Delete);

        #[cfg(debug_assertions)]
        self.validate_invariants();

        true
    }

    /// Removes every entry.
    ///
    /// All [`PurgeReason::ClearAll`] notifications fire first, scanning MRU
    /// to LRU, and only then is the structure emptied.
    pub fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        self.metrics.record_clear();

        let mut current = self.head;
        while let Some(ptr) = current {
            let node = unsafe { ptr.as_ref() };
            node.value.on_purge(PurgeReason::ClearAll);
            current = node.next;
        }

        while self.pop_tail().is_some() {}
        self.map.clear();
        self.size = 0;
    }

    /// Replaces the capacity, evicting from the LRU end until the running
    /// size fits the new budget.
    pub fn set_capacity(&mut self, capacity: i64) {
        self.capacity = capacity;
        self.enforce_capacity();

        #[cfg(debug_assertions)]
        self.validate_invariants();
    }

    /// Registers the miss loader consulted by [`get`](LruCore::get).
    pub fn on_miss(&mut self, handler: MissHandler<K, V>) {
        self.on_miss = Some(handler);
    }

    /// Snapshot of the keys, MRU first. Later mutation does not affect a
    /// previously returned snapshot.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut current = self.head;
        while let Some(ptr) = current {
            let node = unsafe { ptr.as_ref() };
            keys.push(node.key.clone());
            current = node.next;
        }
        keys
    }

    /// Snapshot of the values, MRU first.
    pub fn values(&self) -> Vec<Arc<V>> {
        let mut values = Vec::with_capacity(self.map.len());
        let mut current = self.head;
        while let Some(ptr) = current {
            let node = unsafe { ptr.as_ref() };
            values.push(Arc::clone(&node.value));
            current = node.next;
        }
        values
    }

    /// Snapshot of key/value pairs, MRU first.
    pub fn items(&self) -> Vec<Item<K, V>> {
        let mut items = Vec::with_capacity(self.map.len());
        let mut current = self.head;
        while let Some(ptr) = current {
            let node = unsafe { ptr.as_ref() };
            items.push(Item {
                key: node.key.clone(),
                value: Arc::clone(&node.value),
            });
            current = node.next;
        }
        items
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the engine holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Running sum of the entries' reported sizes.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// The configured size budget.
    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    /// The length/size/capacity triple.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            length: self.map.len() as i64,
            size: self.size,
            capacity: self.capacity,
        }
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            get_calls: self.metrics.get_calls,
            get_hits: self.metrics.get_hits,
            get_misses: self.metrics.get_misses,
            miss_loads: self.metrics.miss_loads,
            set_calls: self.metrics.set_calls,
            set_new: self.metrics.set_new,
            set_updates: self.metrics.set_updates,
            evictions: self.metrics.evictions,
            deletes: self.metrics.deletes,
            clears: self.metrics.clears,
            length: self.map.len(),
            size: self.size,
            capacity: self.capacity,
        }
    }

    /// Verifies the index/list bijection and the size accounting.
    ///
    /// The invariants checked: every listed node is indexed at its own
    /// pointer and vice versa, the list is acyclic, `size` equals the sum of
    /// entry sizes, and `size` does not exceed the capacity at rest (clamped
    /// at zero: a negative budget can never be "filled").
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.map.is_empty() {
            if self.head.is_some() || self.tail.is_some() {
                return Err(InvariantError::new("empty index but non-empty list"));
            }
            if self.size != 0 {
                return Err(InvariantError::new(format!(
                    "empty cache with running size {}",
                    self.size
                )));
            }
            return Ok(());
        }

        let mut count = 0usize;
        let mut sum = 0i64;
        let mut current = self.head;
        while let Some(ptr) = current {
            count += 1;
            if count > self.map.len() {
                return Err(InvariantError::new("cycle detected in recency list"));
            }
            let node = unsafe { ptr.as_ref() };
            match self.map.get(&node.key) {
                Some(&indexed) if indexed == ptr => {}
                Some(_) => {
                    return Err(InvariantError::new(
                        "index points at a different node for a listed key",
                    ))
                }
                None => return Err(InvariantError::new("listed key missing from index")),
            }
            sum += node.size;
            current = node.next;
        }

        if count != self.map.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but list holds {}",
                self.map.len(),
                count
            )));
        }
        if sum != self.size {
            return Err(InvariantError::new(format!(
                "running size {} != entry sum {}",
                self.size, sum
            )));
        }
        if self.size > self.capacity.max(0) {
            return Err(InvariantError::new(format!(
                "size {} exceeds capacity {} at rest",
                self.size, self.capacity
            )));
        }
        Ok(())
    }

    #[cfg(debug_assertions)]
    fn validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("lru invariant violated: {err}");
        }
    }

    /// Detach a node from the list without removing it from the index.
    #[inline(always)]
    fn detach(&mut self, node_ptr: NonNull<Node<K, V>>) {
        unsafe {
            let node = node_ptr.as_ref();
            let prev = node.prev;
            let next = node.next;

            match prev {
                Some(mut p) => p.as_mut().next = next,
                None => self.head = next,
            }

            match next {
                Some(mut n) => n.as_mut().prev = prev,
                None => self.tail = prev,
            }
        }
    }

    /// Attach a node at the front (MRU position).
    #[inline(always)]
    fn attach_front(&mut self, mut node_ptr: NonNull<Node<K, V>>) {
        unsafe {
            let node = node_ptr.as_mut();
            node.prev = None;
            node.next = self.head;

            match self.head {
                Some(mut h) => h.as_mut().prev = Some(node_ptr),
                None => self.tail = Some(node_ptr),
            }

            self.head = Some(node_ptr);
        }
    }

    /// Pop the tail node (LRU) and return it, reclaiming ownership.
    #[inline(always)]
    fn pop_tail(&mut self) -> Option<Box<Node<K, V>>> {
        self.tail.map(|tail_ptr| unsafe {
            let node = Box::from_raw(tail_ptr.as_ptr());

            self.tail = node.prev;
            match self.tail {
                Some(mut t) => t.as_mut().next = None,
                None => self.head = None,
            }

            node
        })
    }

    /// Replace an existing entry's value and size in place.
    ///
    /// The superseded value is notified with `Update` before replacement,
    /// matching the order purge observers see everywhere else: the reason
    /// describes what is about to happen to the value receiving it.
    fn update_inplace(&mut self, node_ptr: NonNull<Node<K, V>>, value: Arc<V>) {
        #[cfg(feature = "metrics")]
        self.metrics.record_set_update();

        let new_size = value.size();
        unsafe {
            let node = &mut *node_ptr.as_ptr();
            node.value.on_purge(PurgeReason::Update);
            let delta = new_size - node.size;
            node.value = value;
            node.size = new_size;
            self.size += delta;
        }

        self.detach(node_ptr);
        self.attach_front(node_ptr);
        self.enforce_capacity();

        #[cfg(debug_assertions)]
        self.validate_invariants();
    }

    /// Insert a fresh entry at MRU, then enforce capacity.
    fn add_new(&mut self, key: K, value: Arc<V>) {
        #[cfg(feature = "metrics")]
        self.metrics.record_set_new();

        let size = value.size();
        let node = Box::new(Node {
            prev: None,
            next: None,
            key: key.clone(),
            value,
            size,
        });
        let node_ptr = NonNull::new(Box::into_raw(node)).unwrap();

        self.map.insert(key, node_ptr);
        self.attach_front(node_ptr);
        self.size += size;
        self.enforce_capacity();

        #[cfg(debug_assertions)]
        self.validate_invariants();
    }

    /// Evict from the LRU end until the running size fits the capacity.
    ///
    /// A loop, not a single eviction: one oversized insert or one large
    /// capacity reduction may displace several small entries. Terminates when
    /// the list is empty, which is how zero and negative capacities resolve.
    fn enforce_capacity(&mut self) {
        while self.size > self.capacity {
            let Some(node) = self.pop_tail() else {
                break;
            };

            #[cfg(feature = "metrics")]
            self.metrics.record_eviction();

            self.map.remove(&node.key);
            self.size -= node.size;
            node.value.on_purge(PurgeReason::CacheFull);
        }
    }
}

// Dropping the engine frees all entries without purge notifications: there
// is no teardown protocol, release of the last reference is the teardown.
impl<K, V> Drop for LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn drop(&mut self) {
        while self.pop_tail().is_some() {}
    }
}

impl<K, V> fmt::Debug for LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.len())
            .field("size", &self.size)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Thread-safe LRU engine: [`LruCore`] behind one exclusive lock.
///
/// Cloning is shallow; clones share the same engine. Every operation —
/// including `get`, which reorders recency — acquires the same mutex for its
/// full duration, purge callbacks and miss loader included. See the module
/// docs for the consequences.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lrukit::policy::lru::LruCache;
/// use lrukit::traits::Cache;
///
/// let cache: LruCache<u64, i64> = LruCache::new(3);
/// cache.on_miss(|k: &u64| Some(Arc::new(*k as i64 * 2)));
///
/// // Miss consults the loader, inserts, and returns the loaded value.
/// assert_eq!(cache.get(&7).as_deref(), Some(&14));
/// assert_eq!(cache.length(), 1);
/// ```
#[cfg(feature = "concurrency")]
pub struct LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    inner: Arc<Mutex<LruCore<K, V>>>,
}

#[cfg(feature = "concurrency")]
impl<K, V> Clone for LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> fmt::Debug for LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.inner.lock();
        f.debug_struct("LruCache")
            .field("len", &core.len())
            .field("size", &core.size())
            .field("capacity", &core.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    /// Creates a new empty cache with the given capacity in size units.
    pub fn new(capacity: i64) -> Self {
        LruCache {
            inner: Arc::new(Mutex::new(LruCore::new(capacity))),
        }
    }

    /// Registers an already-shared miss loader.
    ///
    /// [`Cache::on_miss`] wraps a closure for the common case; this form lets
    /// a router hand the same `Arc` handler to every shard.
    pub fn on_miss_handler(&self, handler: MissHandler<K, V>) {
        self.inner.lock().on_miss(handler);
    }

    /// Runs the engine's invariant check under the lock.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.inner.lock().metrics_snapshot()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> StatsSource for LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }
}

#[cfg(feature = "concurrency")]
impl<K, V> Cache<K, V> for LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Cacheable,
{
    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.inner.lock().get(key)
    }

    fn set_arc(&self, key: K, value: Arc<V>) {
        self.inner.lock().set(key, value);
    }

    fn set_if_absent_arc(&self, key: K, value: Arc<V>) {
        self.inner.lock().set_if_absent(key, value);
    }

    fn delete(&self, key: &K) -> bool {
        self.inner.lock().delete(key)
    }

    fn clear(&self) {
        self.inner.lock().clear();
    }

    fn set_capacity(&self, capacity: i64) {
        self.inner.lock().set_capacity(capacity);
    }

    fn on_miss<F>(&self, loader: F)
    where
        F: Fn(&K) -> Option<Arc<V>> + Send + Sync + 'static,
    {
        self.on_miss_handler(Arc::new(loader));
    }

    fn keys(&self) -> Vec<K> {
        self.inner.lock().keys()
    }

    fn values(&self) -> Vec<Arc<V>> {
        self.inner.lock().values()
    }

    fn items(&self) -> Vec<Item<K, V>> {
        self.inner.lock().items()
    }

    fn length(&self) -> i64 {
        self.inner.lock().len() as i64
    }

    fn size(&self) -> i64 {
        self.inner.lock().size()
    }

    fn capacity(&self) -> i64 {
        self.inner.lock().capacity()
    }
}
