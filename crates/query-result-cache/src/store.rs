//! Weight-aware LRU store.

use ahash::RandomState;
use lru::LruCache;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// External weight function for stored values.
pub trait Weigher<V>: Send + Sync {
    fn weight(&self, value: &V) -> usize;
}

struct Slot<V> {
    value: Arc<V>,
    /// Weight last accounted into the cumulative counter. Values can grow
    /// in place, so the accounted figure is what must be subtracted on
    /// eviction, not a fresh measurement.
    weight: usize,
}

struct Inner<K: Hash + Eq, V> {
    map: LruCache<K, Slot<V>, RandomState>,
    current_weight: usize,
}

/// Size-bounded associative store with least-recently-used eviction.
///
/// All operations serialize on one mutex. Values are handed out as `Arc`s,
/// so a holder keeps a consistent view of a value even after it is evicted
/// from the store.
pub struct WeightedStore<K: Hash + Eq, V, W: Weigher<V>> {
    inner: Mutex<Inner<K, V>>,
    weigher: W,
    max_total_weight: usize,
    max_entries: usize,
    evictions: AtomicU64,
}

impl<K: Hash + Eq, V, W: Weigher<V>> WeightedStore<K, V, W> {
    pub fn new(max_total_weight: usize, max_entries: usize, weigher: W) -> Self {
        Self {
            inner: Mutex::new(Inner {
                map: LruCache::unbounded_with_hasher(RandomState::new()),
                current_weight: 0,
            }),
            weigher,
            max_total_weight,
            max_entries,
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a value, promoting the key to most recently used.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut guard = self.inner.lock();
        guard.map.get(key).map(|slot| Arc::clone(&slot.value))
    }

    /// Look up a value without touching the LRU order.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        let inner = self.inner.lock();
        inner.map.peek(key).map(|slot| Arc::clone(&slot.value))
    }

    /// Return the existing value for `key`, or insert the one produced by
    /// `factory` and return it with `true`.
    ///
    /// The factory runs under the store lock, at most once, and only when
    /// the key is vacant; it must be cheap and must not call back into the
    /// store. A panicking factory unwinds through the guard and leaves no
    /// partial insertion behind.
    pub fn get_or_set(&self, key: &K, factory: impl FnOnce() -> Arc<V>) -> (Arc<V>, bool)
    where
        K: Clone,
    {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(slot) = inner.map.get(key) {
            return (Arc::clone(&slot.value), false);
        }

        let value = factory();
        let weight = self.weigher.weight(&value);
        inner.map.put(
            key.clone(),
            Slot {
                value: Arc::clone(&value),
                weight,
            },
        );
        inner.current_weight += weight;
        self.evict_to_budget(inner);
        (value, true)
    }

    /// Insert or replace a mapping, then evict from the LRU end until the
    /// weight and entry-count budgets hold again.
    pub fn set(&self, key: K, value: Arc<V>) {
        let weight = self.weigher.weight(&value);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(old) = inner.map.put(key, Slot { value, weight }) {
            inner.current_weight = inner.current_weight.saturating_sub(old.weight);
        }
        inner.current_weight += weight;
        self.evict_to_budget(inner);
    }

    /// Re-account a value that was mutated in place.
    ///
    /// Only acts when the mapping still points at the same allocation as
    /// `value`; returns whether the value is still resident afterwards.
    /// Re-accounting can itself trigger eviction, including of `key`.
    pub fn refresh(&self, key: &K, value: &Arc<V>) -> bool {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.map.get_mut(key) {
            Some(slot) if Arc::ptr_eq(&slot.value, value) => {
                let old = slot.weight;
                let new = self.weigher.weight(value);
                slot.weight = new;
                inner.current_weight = inner.current_weight.saturating_sub(old) + new;
            }
            _ => return false,
        }
        self.evict_to_budget(inner);
        inner.map.contains(key)
    }

    /// Remove a mapping; absent keys are a no-op.
    pub fn remove(&self, key: &K) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if let Some(slot) = inner.map.pop(key) {
            inner.current_weight = inner.current_weight.saturating_sub(slot.weight);
        }
    }

    /// Drop all entries.
    pub fn reset(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.map.clear();
        inner.current_weight = 0;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().map.is_empty()
    }

    /// Cumulative accounted weight of resident entries.
    pub fn weight(&self) -> usize {
        self.inner.lock().current_weight
    }

    pub fn max_total_weight(&self) -> usize {
        self.max_total_weight
    }

    /// Entries evicted to satisfy the budgets since construction.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    fn evict_to_budget(&self, inner: &mut Inner<K, V>) {
        while (inner.current_weight > self.max_total_weight || inner.map.len() > self.max_entries)
            && !inner.map.is_empty()
        {
            if let Some((_, slot)) = inner.map.pop_lru() {
                inner.current_weight = inner.current_weight.saturating_sub(slot.weight);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(
                    evicted_bytes = slot.weight,
                    resident_bytes = inner.current_weight,
                    "evicted least recently used entry"
                );
            }
        }
    }
}
