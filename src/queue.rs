//! Bounded Queue Module
//!
//! Fixed-capacity FIFO ring buffer used to hand accepted connections from the
//! listener to the worker threads.

use std::sync::Mutex;

use crate::sync::{lock, Semaphore};

// == Ring ==
/// Ring storage; `front` and `rear` point at the last removed and last
/// inserted positions, so the next item lives at `(front + 1) % n`.
#[derive(Debug)]
struct Ring<T> {
    buf: Vec<Option<T>>,
    front: usize,
    rear: usize,
}

// == Bounded Queue ==
/// Blocking producer/consumer queue.
///
/// `slots` counts free positions and `items` counts filled ones; the mutex
/// only guards the ring indices and is never held while waiting on either
/// semaphore, so producers and consumers cannot deadlock each other.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    slots: Semaphore,
    items: Semaphore,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    // == Constructor ==
    /// Creates an empty queue holding at most `capacity` items.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be non-zero");

        let mut buf = Vec::with_capacity(capacity);
        buf.resize_with(capacity, || None);

        Self {
            ring: Mutex::new(Ring {
                buf,
                front: 0,
                rear: 0,
            }),
            slots: Semaphore::new(capacity),
            items: Semaphore::new(0),
            capacity,
        }
    }

    // == Insert ==
    /// Appends `item`, blocking while the queue is full.
    pub fn insert(&self, item: T) {
        self.slots.acquire();
        {
            let mut ring = lock(&self.ring);
            ring.rear = (ring.rear + 1) % self.capacity;
            let rear = ring.rear;
            ring.buf[rear] = Some(item);
        }
        self.items.release();
    }

    // == Remove ==
    /// Takes the oldest item, blocking while the queue is empty.
    pub fn remove(&self) -> T {
        self.items.acquire();
        let item = {
            let mut ring = lock(&self.ring);
            ring.front = (ring.front + 1) % self.capacity;
            let front = ring.front;
            ring.buf[front].take()
        };
        self.slots.release();
        item.expect("items permit guarantees an occupied ring position")
    }

    // == Capacity ==
    /// Maximum number of queued items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Length ==
    /// Number of items ready for removal (a snapshot).
    pub fn len(&self) -> usize {
        self.items.available()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_queue_fifo_single_thread() {
        let queue = BoundedQueue::new(4);
        for i in 0..4 {
            queue.insert(i);
        }
        assert_eq!(queue.len(), 4);
        for i in 0..4 {
            assert_eq!(queue.remove(), i);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_wraps_around() {
        let queue = BoundedQueue::new(3);
        for round in 0..5 {
            queue.insert(round * 10);
            queue.insert(round * 10 + 1);
            assert_eq!(queue.remove(), round * 10);
            assert_eq!(queue.remove(), round * 10 + 1);
        }
        assert_eq!(queue.capacity(), 3);
    }

    #[test]
    fn test_insert_blocks_when_full() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.insert(1);

        let inserted = Arc::new(AtomicBool::new(false));
        let handle = {
            let queue = Arc::clone(&queue);
            let inserted = Arc::clone(&inserted);
            thread::spawn(move || {
                queue.insert(2);
                inserted.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!inserted.load(Ordering::SeqCst), "insert should block on a full queue");

        assert_eq!(queue.remove(), 1);
        handle.join().unwrap();
        assert!(inserted.load(Ordering::SeqCst));
        assert_eq!(queue.remove(), 2);
    }

    #[test]
    fn test_remove_blocks_when_empty() {
        let queue = Arc::new(BoundedQueue::new(2));
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.remove())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!consumer.is_finished());

        queue.insert("conn");
        assert_eq!(consumer.join().unwrap(), "conn");
    }

    #[test]
    #[should_panic(expected = "queue capacity must be non-zero")]
    fn test_zero_capacity_rejected() {
        let _ = BoundedQueue::<u8>::new(0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        // One producer, several consumers: every item is delivered exactly
        // once and each consumer sees its items in insertion order.
        #[test]
        fn prop_single_producer_multi_consumer_fifo(
            capacity in 1usize..8,
            consumers in 1usize..5,
            count in 1usize..300,
        ) {
            let queue = Arc::new(BoundedQueue::new(capacity));

            let handles: Vec<_> = (0..consumers)
                .map(|c| {
                    let queue = Arc::clone(&queue);
                    // Spread `count` items over the consumers.
                    let share = count / consumers + usize::from(c < count % consumers);
                    thread::spawn(move || {
                        (0..share).map(|_| queue.remove()).collect::<Vec<usize>>()
                    })
                })
                .collect();

            for i in 0..count {
                queue.insert(i);
            }

            let mut seen = HashSet::new();
            for handle in handles {
                let received = handle.join().unwrap();
                prop_assert!(
                    received.windows(2).all(|w| w[0] < w[1]),
                    "consumer saw items out of order: {:?}",
                    received
                );
                for item in received {
                    prop_assert!(seen.insert(item), "item {} delivered twice", item);
                }
            }
            prop_assert_eq!(seen.len(), count);
            prop_assert!(queue.is_empty());
        }
    }
}
