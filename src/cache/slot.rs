//! Cache Slot Module
//!
//! One fixed-capacity storage unit of the cache, synchronized with a
//! reader-priority readers/writer discipline.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use crate::sync::{self, Semaphore};

// == Slot Content ==
/// Key and object bytes; always replaced together under the write gate.
#[derive(Debug, Default)]
struct SlotContent {
    uri: String,
    object: Vec<u8>,
}

// == Slot Snapshot ==
/// Point-in-time view of an occupied slot, used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSnapshot {
    pub uri: String,
    pub size: usize,
    pub recency: u64,
}

// == Cache Slot ==
/// A single cache entry.
///
/// Readers and writers coordinate through `readers` and `write_gate`: the
/// first reader in takes the gate and the last reader out returns it, so any
/// number of readers overlap while a writer waits for all of them. The
/// `content` RwLock is only ever contended by short key comparisons, since
/// the gate already serializes writers against readers.
///
/// `recency` and `occupied` are bookkeeping read and bumped without the gate.
#[derive(Debug)]
pub struct CacheSlot {
    content: RwLock<SlotContent>,
    readers: Mutex<usize>,
    write_gate: Semaphore,
    recency: AtomicU64,
    occupied: AtomicBool,
}

/// Marks one active reader; the last one out reopens the write gate.
struct ReaderPresence<'a> {
    slot: &'a CacheSlot,
}

impl<'a> ReaderPresence<'a> {
    fn enter(slot: &'a CacheSlot) -> Self {
        let mut readers = sync::lock(&slot.readers);
        *readers += 1;
        if *readers == 1 {
            slot.write_gate.acquire();
        }
        Self { slot }
    }
}

impl Drop for ReaderPresence<'_> {
    fn drop(&mut self) {
        let mut readers = sync::lock(&self.slot.readers);
        *readers -= 1;
        if *readers == 0 {
            self.slot.write_gate.release();
        }
    }
}

/// Holds the write gate for the duration of a write.
struct WriterPresence<'a> {
    gate: &'a Semaphore,
}

impl<'a> WriterPresence<'a> {
    fn enter(gate: &'a Semaphore) -> Self {
        gate.acquire();
        Self { gate }
    }
}

impl Drop for WriterPresence<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

impl CacheSlot {
    // == Constructor ==
    /// Creates an empty slot with room for `object_capacity` bytes.
    pub fn new(object_capacity: usize) -> Self {
        Self {
            content: RwLock::new(SlotContent {
                uri: String::new(),
                object: Vec::with_capacity(object_capacity),
            }),
            readers: Mutex::new(0),
            write_gate: Semaphore::new(1),
            recency: AtomicU64::new(0),
            occupied: AtomicBool::new(false),
        }
    }

    // == Bookkeeping ==
    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }

    pub fn recency(&self) -> u64 {
        self.recency.load(Ordering::Relaxed)
    }

    /// Marks the slot as most recently used.
    pub fn touch(&self) {
        self.recency.store(0, Ordering::Relaxed);
    }

    /// Pushes the slot one step further from most recently used.
    pub fn age(&self) {
        self.recency.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns true if the slot currently holds `uri`.
    pub fn matches(&self, uri: &str) -> bool {
        self.is_occupied() && sync::read(&self.content).uri == uri
    }

    /// Number of readers currently inside `read`.
    pub fn active_readers(&self) -> usize {
        *sync::lock(&self.readers)
    }

    // == Read ==
    /// Runs `f` over the cached object if the slot still holds `uri`.
    ///
    /// Other readers may run concurrently; writers are held off until the
    /// last reader returns. Yields `None` when the slot was overwritten with
    /// a different key after the caller's lookup.
    pub fn read<R>(&self, uri: &str, f: impl FnOnce(&[u8]) -> R) -> Option<R> {
        let _presence = ReaderPresence::enter(self);
        let content = sync::read(&self.content);
        if !self.is_occupied() || content.uri != uri {
            return None;
        }
        Some(f(&content.object))
    }

    // == Write ==
    /// Replaces key and object, waiting for in-flight readers to finish.
    ///
    /// Returns the key that was displaced, if the slot held a different one.
    pub fn write(&self, uri: &str, bytes: &[u8]) -> Option<String> {
        let _presence = WriterPresence::enter(&self.write_gate);
        let mut content = sync::write(&self.content);

        let displaced = (self.is_occupied() && content.uri != uri)
            .then(|| std::mem::take(&mut content.uri));

        content.uri.clear();
        content.uri.push_str(uri);
        content.object.clear();
        content.object.extend_from_slice(bytes);

        self.occupied.store(true, Ordering::Release);
        self.touch();
        displaced
    }

    // == Snapshot ==
    /// Key, size and recency of an occupied slot.
    pub fn snapshot(&self) -> Option<SlotSnapshot> {
        if !self.is_occupied() {
            return None;
        }
        let content = sync::read(&self.content);
        Some(SlotSnapshot {
            uri: content.uri.clone(),
            size: content.object.len(),
            recency: self.recency(),
        })
    }
}
