//! Worker Pool
//!
//! Fixed set of long-lived threads draining the bounded connection queue.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, info};

use crate::queue::BoundedQueue;

/// Handle describing a running pool.
///
/// Workers are detached: there is no join or shutdown path, the threads live
/// until the process exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPool {
    size: usize,
}

impl WorkerPool {
    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Spawns `size` workers that each remove one item at a time from `queue`
/// and pass it to `handler` along with the worker's index.
///
/// The item is owned by the handler call and dropped when it returns, so a
/// connection is closed on every exit path. A panicking handler is caught
/// and logged, and the worker carries on with the next item.
///
/// # Arguments
/// * `size` - Number of threads to start
/// * `queue` - Shared queue the workers drain
/// * `handler` - Called once per removed item
///
/// # Example
/// ```ignore
/// let queue = Arc::new(BoundedQueue::new(16));
/// let pool = spawn_worker_pool(8, queue.clone(), |worker, conn| serve(worker, conn))?;
/// ```
pub fn spawn_worker_pool<T, F>(
    size: usize,
    queue: Arc<BoundedQueue<T>>,
    handler: F,
) -> io::Result<WorkerPool>
where
    T: Send + 'static,
    F: Fn(usize, T) + Send + Sync + 'static,
{
    let handler = Arc::new(handler);

    for worker in 0..size {
        let queue = Arc::clone(&queue);
        let handler = Arc::clone(&handler);

        thread::Builder::new()
            .name(format!("proxy-worker-{worker}"))
            .spawn(move || worker_loop(worker, &queue, handler.as_ref()))?;
    }

    info!("Started {} worker threads", size);
    Ok(WorkerPool { size })
}

fn worker_loop<T, F>(worker: usize, queue: &BoundedQueue<T>, handler: &F)
where
    F: Fn(usize, T),
{
    loop {
        let item = queue.remove();
        debug!(worker, "Picked up connection");

        if panic::catch_unwind(AssertUnwindSafe(|| handler(worker, item))).is_err() {
            error!(worker, "Connection handler panicked; connection dropped");
        }
    }
}
