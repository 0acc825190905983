//! Data-source seam between the paging engine and concrete stores.

use crate::error::PagingError;
use std::sync::RwLock;

/// Windowed read access to an ordered logical dataset.
///
/// Implementations back onto anything that can answer "how many items" and
/// "give me `count` items starting at `start_index`": an in-memory list, a
/// database range query, a remote service. Ordering stability across
/// successive fetches for the same logical query is the implementation's
/// responsibility.
///
/// Implementations must bound their own blocking time; a fetch that cannot
/// answer in time fails with [`PagingError::DataUnavailable`] rather than
/// blocking the caller indefinitely.
pub trait PageDataSource<T>: Send + Sync {
    /// Current item count. Expected to be O(1) or cached by the
    /// implementation; the controller re-reads it on every navigation.
    fn total_count(&self) -> usize;

    /// Return up to `count` items starting at `start_index`, clipped to the
    /// dataset tail. Fewer than `count` items are returned only at the tail.
    ///
    /// # Errors
    /// [`PagingError::DataUnavailable`] when the backing store cannot
    /// answer; the failure is retryable.
    fn fetch(&self, start_index: usize, count: usize) -> Result<Vec<T>, PagingError>;
}

/// In-memory [`PageDataSource`] over a shared vector.
///
/// The backing store sits behind a lock so a host (or test) can mutate the
/// dataset out-of-band and then drive the controller's structural-change
/// reload path.
#[derive(Debug, Default)]
pub struct SliceSource<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Clone + Send + Sync> SliceSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    /// Replace the backing dataset. Callers must follow up with a
    /// controller reload so cached pages are not served for stale offsets.
    pub fn replace(&self, items: Vec<T>) {
        match self.items.write() {
            Ok(mut guard) => *guard = items,
            Err(poisoned) => *poisoned.into_inner() = items,
        }
    }
}

impl<T: Clone + Send + Sync> PageDataSource<T> for SliceSource<T> {
    fn total_count(&self) -> usize {
        match self.items.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn fetch(&self, start_index: usize, count: usize) -> Result<Vec<T>, PagingError> {
        let guard = match self.items.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let start = start_index.min(guard.len());
        let end = start.saturating_add(count).min(guard.len());
        Ok(guard[start..end].to_vec())
    }
}
