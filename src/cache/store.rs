//! Cache Store Module
//!
//! Fixed array of slots with approximate LRU eviction driven by per-slot
//! recency counters.

use crate::cache::{CacheCounters, CacheSlot, CacheStats, SlotSnapshot};
use crate::config::Config;
use crate::error::{ProxyError, Result};

// == Cache Entry View ==
/// Occupied slot as reported by [`CacheStore::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryView {
    pub slot: usize,
    pub uri: String,
    pub size: usize,
    pub recency: u64,
}

// == Cache Store ==
/// Process-wide response cache shared by all worker threads.
///
/// There is no store-wide lock. Each slot synchronizes its own content, and
/// the recency scan in `lookup`/`insert` runs without any slot gate, so the
/// LRU order can be slightly stale under contention. Two concurrent inserts
/// may pick the same victim; the slot's write gate serializes them and the
/// later write wins.
#[derive(Debug)]
pub struct CacheStore {
    slots: Box<[CacheSlot]>,
    max_object_size: usize,
    counters: CacheCounters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store of `slot_count` slots, each caching objects strictly
    /// smaller than `max_object_size` bytes.
    ///
    /// # Panics
    /// Panics if `slot_count` is zero.
    pub fn new(slot_count: usize, max_object_size: usize) -> Self {
        assert!(slot_count > 0, "cache needs at least one slot");
        let slots = (0..slot_count)
            .map(|_| CacheSlot::new(max_object_size))
            .collect();
        Self {
            slots,
            max_object_size,
            counters: CacheCounters::default(),
        }
    }

    /// Creates a store sized from the configured cache budget.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.slot_count(), config.max_object_size)
    }

    // == Lookup ==
    /// Finds the slot holding `uri` and marks it most recently used.
    ///
    /// On a hit every other occupied slot ages by one.
    pub fn lookup(&self, uri: &str) -> Option<usize> {
        let index = self.slots.iter().position(|slot| slot.matches(uri))?;
        self.promote(index);
        Some(index)
    }

    // == Read ==
    /// Runs `f` over the object in slot `index` under reader access.
    ///
    /// Returns `None` if the slot no longer holds `uri`.
    pub fn read<R>(&self, index: usize, uri: &str, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        self.slots.get(index)?.read(uri, f)
    }

    // == Fetch ==
    /// Lookup followed by a read, recording the hit or miss.
    pub fn fetch<R>(&self, uri: &str, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let result = self
            .lookup(uri)
            .and_then(|index| self.read(index, uri, f));
        match result {
            Some(_) => self.counters.record_hit(),
            None => self.counters.record_miss(),
        }
        result
    }

    // == Insert ==
    /// Stores `bytes` under `uri`, evicting the least recently used entry
    /// when no slot is free.
    ///
    /// Returns the slot index written, or `ObjectTooLarge` when the object
    /// is not strictly below the ceiling.
    pub fn insert(&self, uri: &str, bytes: &[u8]) -> Result<usize> {
        if bytes.len() >= self.max_object_size {
            self.counters.record_uncacheable();
            return Err(ProxyError::ObjectTooLarge {
                size: bytes.len(),
                limit: self.max_object_size,
            });
        }

        let index = self.select_target(uri);
        if let Some(evicted) = self.slots[index].write(uri, bytes) {
            tracing::debug!(slot = index, evicted = %evicted, "Evicted cache entry");
            self.counters.record_eviction();
        }
        self.age_others(index);
        self.counters.record_insertion();

        Ok(index)
    }

    /// Slot already holding `uri`, else the first empty slot, else the
    /// occupied slot with the highest recency (lowest index on ties).
    fn select_target(&self, uri: &str) -> usize {
        if let Some(index) = self.slots.iter().position(|slot| slot.matches(uri)) {
            return index;
        }
        if let Some(index) = self.slots.iter().position(|slot| !slot.is_occupied()) {
            return index;
        }

        let mut victim = 0;
        let mut oldest = self.slots[0].recency();
        for (index, slot) in self.slots.iter().enumerate().skip(1) {
            let recency = slot.recency();
            if recency > oldest {
                oldest = recency;
                victim = index;
            }
        }
        victim
    }

    fn promote(&self, index: usize) {
        self.slots[index].touch();
        self.age_others(index);
    }

    fn age_others(&self, index: usize) {
        self.slots
            .iter()
            .enumerate()
            .filter(|(i, slot)| *i != index && slot.is_occupied())
            .for_each(|(_, slot)| slot.age());
    }

    // == Entries ==
    /// Snapshot of every occupied slot, in slot order.
    pub fn entries(&self) -> Vec<CacheEntryView> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, cell)| {
                cell.snapshot().map(|SlotSnapshot { uri, size, recency }| CacheEntryView {
                    slot,
                    uri,
                    size,
                    recency,
                })
            })
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len(), self.slot_count())
    }

    /// Counts an oversized response the pipeline declined to buffer.
    pub fn record_uncacheable(&self) {
        self.counters.record_uncacheable();
    }

    // == Accessors ==
    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_occupied()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn recency_of(store: &CacheStore, uri: &str) -> u64 {
        store
            .entries()
            .into_iter()
            .find(|e| e.uri == uri)
            .map(|e| e.recency)
            .unwrap()
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(10, 1024);
        assert_eq!(store.slot_count(), 10);
        assert_eq!(store.max_object_size(), 1024);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_from_config() {
        let store = CacheStore::from_config(&Config::default());
        assert_eq!(store.slot_count(), 10);
        assert_eq!(store.max_object_size(), 102_400);
    }

    #[test]
    fn test_store_insert_and_fetch() {
        let store = CacheStore::new(4, 1024);
        let index = store.insert("http://a/", b"body").unwrap();

        assert_eq!(store.lookup("http://a/"), Some(index));
        assert_eq!(
            store.fetch("http://a/", |b| b.to_vec()),
            Some(b"body".to_vec())
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_lookup_miss() {
        let store = CacheStore::new(4, 1024);
        assert_eq!(store.lookup("http://missing/"), None);
        assert_eq!(store.fetch("http://missing/", |b| b.len()), None);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_store_fills_empty_slots_in_order() {
        let store = CacheStore::new(3, 1024);
        assert_eq!(store.insert("a", b"1").unwrap(), 0);
        assert_eq!(store.insert("b", b"2").unwrap(), 1);
        assert_eq!(store.insert("c", b"3").unwrap(), 2);
    }

    #[test]
    fn test_store_insert_ages_other_entries() {
        let store = CacheStore::new(3, 1024);
        store.insert("a", b"1").unwrap();
        store.insert("b", b"2").unwrap();
        store.insert("c", b"3").unwrap();

        assert_eq!(recency_of(&store, "a"), 2);
        assert_eq!(recency_of(&store, "b"), 1);
        assert_eq!(recency_of(&store, "c"), 0);
    }

    #[test]
    fn test_store_lru_eviction() {
        let store = CacheStore::new(3, 1024);
        store.insert("a", b"1").unwrap();
        store.insert("b", b"2").unwrap();
        store.insert("c", b"3").unwrap();

        // "a" is oldest and is displaced by "d" in its slot.
        assert_eq!(store.insert("d", b"4").unwrap(), 0);
        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup("a"), None);
        assert_eq!(store.stats().evictions, 1);
    }

    #[test]
    fn test_store_lookup_refreshes_recency() {
        let store = CacheStore::new(3, 1024);
        store.insert("a", b"1").unwrap();
        store.insert("b", b"2").unwrap();
        store.insert("c", b"3").unwrap();

        store.lookup("a").unwrap();
        assert_eq!(recency_of(&store, "a"), 0);

        // "b" is now the oldest.
        assert_eq!(store.insert("d", b"4").unwrap(), 1);
        assert!(store.lookup("a").is_some());
        assert!(store.lookup("b").is_none());
    }

    #[test]
    fn test_store_eviction_tie_prefers_lowest_index() {
        let store = CacheStore::new(2, 1024);
        store.insert("a", b"1").unwrap();
        store.insert("b", b"2").unwrap();
        // Equalize recency: a=1, b=0 -> bump b once.
        store.slots[1].age();
        assert_eq!(store.insert("c", b"3").unwrap(), 0);
    }

    #[test]
    fn test_store_reinsert_same_uri_reuses_slot() {
        let store = CacheStore::new(3, 1024);
        store.insert("a", b"old").unwrap();
        store.insert("b", b"2").unwrap();

        assert_eq!(store.insert("a", b"new").unwrap(), 0);
        assert_eq!(store.len(), 2);
        assert_eq!(store.fetch("a", |b| b.to_vec()), Some(b"new".to_vec()));
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_rejects_object_at_ceiling() {
        let store = CacheStore::new(3, 8);
        let result = store.insert("big", &[0u8; 8]);
        assert!(matches!(
            result,
            Err(ProxyError::ObjectTooLarge { size: 8, limit: 8 })
        ));
        assert!(store.is_empty());
        assert_eq!(store.stats().uncacheable, 1);

        assert!(store.insert("fits", &[0u8; 7]).is_ok());
    }

    #[test]
    fn test_store_preserves_binary_objects() {
        let store = CacheStore::new(2, 64);
        let body = [b'a', 0, b'b', 0, 0, b'c'];
        store.insert("bin", &body).unwrap();
        assert_eq!(store.fetch("bin", |b| b.to_vec()), Some(body.to_vec()));
    }

    #[test]
    fn test_store_stale_index_reads_as_miss() {
        let store = CacheStore::new(1, 64);
        store.insert("a", b"1").unwrap();
        let index = store.lookup("a").unwrap();

        store.insert("b", b"2").unwrap();
        assert_eq!(store.read(index, "a", |b| b.to_vec()), None);
        assert_eq!(store.read(99, "a", |b| b.to_vec()), None);
    }

    #[test]
    fn test_store_stats() {
        let store = CacheStore::new(4, 64);
        store.insert("a", b"1").unwrap();
        store.fetch("a", |_| ()).unwrap();
        let _ = store.fetch("z", |_| ());

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.insertions, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.slot_count, 4);
    }

    #[test]
    fn test_readers_never_observe_torn_objects() {
        const OBJECT_LEN: usize = 4096;
        let store = Arc::new(CacheStore::new(1, OBJECT_LEN + 1));
        store.insert("k", &[0u8; OBJECT_LEN]).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let done = Arc::clone(&done);
                thread::spawn(move || {
                    let mut reads = 0usize;
                    loop {
                        let finished = done.load(Ordering::Acquire);
                        let uniform = store.fetch("k", |bytes| {
                            bytes.len() == OBJECT_LEN && bytes.iter().all(|b| *b == bytes[0])
                        });
                        if let Some(uniform) = uniform {
                            assert!(uniform, "reader observed a partially written object");
                            reads += 1;
                        }
                        if finished {
                            break;
                        }
                    }
                    reads
                })
            })
            .collect();

        for round in 1..=200u32 {
            let fill = (round % 251) as u8;
            store.insert("k", &[fill; OBJECT_LEN]).unwrap();
        }
        done.store(true, Ordering::Release);

        let total: usize = readers.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(total > 0);
    }
}
