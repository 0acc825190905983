//! Background worker that fetches neighbor pages off the caller's thread.

use crate::source::PageDataSource;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// One speculative fetch scheduled by the controller.
#[derive(Debug)]
pub(crate) struct PrefetchJob {
    /// Cache generation the job was scheduled under; results from an older
    /// generation are dropped on arrival.
    pub generation: u64,
    pub page_index: usize,
    pub start_index: usize,
    pub count: usize,
}

/// Completed prefetch, ready to be applied to the cache.
#[derive(Debug)]
pub(crate) struct PrefetchResult<T> {
    pub generation: u64,
    pub page_index: usize,
    pub items: Vec<T>,
}

/// Handle for enqueueing jobs to, and draining results from, the worker.
///
/// Dropping the handle closes the job channel and lets the worker thread
/// exit.
pub(crate) struct PrefetchHandle<T> {
    job_tx: Sender<PrefetchJob>,
    result_rx: Receiver<PrefetchResult<T>>,
}

impl<T> PrefetchHandle<T> {
    pub fn enqueue(&self, job: PrefetchJob) {
        let _ = self.job_tx.send(job);
    }

    /// Drain every completed prefetch without blocking.
    pub fn drain(&self) -> Vec<PrefetchResult<T>> {
        self.result_rx.try_iter().collect()
    }
}

/// Spawn the prefetch worker thread.
///
/// Prefetch is a performance optimization, not a correctness requirement:
/// a failed job is logged at debug level and discarded, and never surfaces
/// to the foreground caller.
///
/// # Panics
/// Panics if the worker thread cannot be spawned.
pub(crate) fn spawn_prefetch_worker<T: Send + 'static>(
    source: Arc<dyn PageDataSource<T>>,
) -> PrefetchHandle<T> {
    let (job_tx, job_rx) = unbounded::<PrefetchJob>();
    let (result_tx, result_rx) = unbounded::<PrefetchResult<T>>();

    thread::Builder::new()
        .name("pageflow-prefetch".to_string())
        .spawn(move || {
            for job in job_rx.iter() {
                match source.fetch(job.start_index, job.count) {
                    Ok(items) => {
                        let _ = result_tx.send(PrefetchResult {
                            generation: job.generation,
                            page_index: job.page_index,
                            items,
                        });
                    }
                    Err(err) => {
                        debug!(
                            target: "pageflow::prefetch",
                            page_index = job.page_index,
                            error = %err,
                            "prefetch failed, discarding"
                        );
                    }
                }
            }
        })
        .expect("failed to spawn pageflow-prefetch worker thread");

    PrefetchHandle { job_tx, result_rx }
}
