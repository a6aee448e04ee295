//! A monotonic "lookup then insert, never invalidate" cache (§5, §9). The
//! Env's specialization/impCache tables never evict an entry once inserted
//! within a single compilation unit, so a plain `HashMap` behind a lock
//! suffices; this wrapper exists to make that contract explicit at the type
//! level and to avoid double-computing a value when two passes race on the
//! same key.
//!
//! `loomc-imp::ImpBuilder` uses this to memoize `(AddressSpace, BaseType) ->
//! IType` pointer-layout construction, which is pure and safe to share
//! across an entire compilation unit's worth of repeated pointer
//! allocations.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::hash::Hash;

pub struct LazyMap<K, V> {
    entries: Mutex<FxHashMap<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> LazyMap<K, V> {
    pub fn new() -> Self {
        LazyMap { entries: Mutex::new(FxHashMap::default()) }
    }

    /// Returns the cached value for `key`, computing and storing it via
    /// `compute` on first access. `compute` must be pure with respect to
    /// `key` — callers may legitimately observe it skipped entirely if
    /// another thread already populated the entry (no guarantee it runs
    /// exactly once under contention, only that all readers converge to
    /// the same stored value).
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(v) = self.entries.lock().get(&key) {
            return v.clone();
        }
        let value = compute();
        self.entries.lock().entry(key).or_insert(value).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for LazyMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn second_lookup_does_not_recompute() {
        let calls = AtomicUsize::new(0);
        let cache: LazyMap<&str, i32> = LazyMap::new();
        let a = cache.get_or_insert_with("k", || {
            calls.fetch_add(1, Ordering::SeqCst);
            42
        });
        let b = cache.get_or_insert_with("k", || {
            calls.fetch_add(1, Ordering::SeqCst);
            99
        });
        assert_eq!(a, 42);
        assert_eq!(b, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_keys_cache_independently() {
        let cache: LazyMap<&str, i32> = LazyMap::new();
        cache.get_or_insert_with("a", || 1);
        cache.get_or_insert_with("b", || 2);
        assert_eq!(cache.len(), 2);
    }
}
