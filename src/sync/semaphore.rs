//! Counting Semaphore
//!
//! A classic P/V semaphore built from a mutex-protected counter and a
//! condition variable.

use std::sync::{Condvar, Mutex};

use super::lock;

// == Semaphore ==
/// Counting semaphore with blocking `acquire` and non-blocking `release`.
///
/// Unlike a mutex guard, a permit is not tied to the acquiring thread: one
/// thread may acquire and another release, which the reader-priority slot
/// discipline relies on.
#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    // == Constructor ==
    /// Creates a semaphore holding `permits` initial permits.
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    // == Acquire (P) ==
    /// Blocks until a permit is available, then takes it.
    pub fn acquire(&self) {
        let mut permits = lock(&self.permits);
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *permits -= 1;
    }

    // == Try Acquire ==
    /// Takes a permit if one is available without blocking.
    pub fn try_acquire(&self) -> bool {
        let mut permits = lock(&self.permits);
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }

    // == Release (V) ==
    /// Returns a permit and wakes one waiter.
    pub fn release(&self) {
        let mut permits = lock(&self.permits);
        *permits += 1;
        drop(permits);
        self.available.notify_one();
    }

    // == Available ==
    /// Current number of free permits (a snapshot, may be stale immediately).
    pub fn available(&self) -> usize {
        *lock(&self.permits)
    }
}
