//! Bounded LRU cache of fetched pages.

use std::collections::HashMap;
use std::time::Instant;

/// A contiguous chunk of the logical dataset, as returned by one fetch.
///
/// Pages are immutable once cached: a changed underlying dataset must
/// invalidate and refetch, never patch items in place.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub index: usize,
    pub items: Vec<T>,
    pub fetched_at: Instant,
}

/// Hit/miss/eviction counters for diagnostics and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

#[derive(Debug)]
struct CacheEntry<T> {
    page: Page<T>,
    last_access: u64,
}

/// Page-index-keyed cache holding at most `max_cached_pages` entries.
///
/// Recency is tracked with a monotonic access stamp; `get` bumps it, and
/// inserting a new page counts as an access. Capacity is small (default 20
/// pages), so eviction scans the map rather than maintaining an ordered
/// structure.
#[derive(Debug)]
pub struct PageCache<T> {
    entries: HashMap<usize, CacheEntry<T>>,
    max_cached_pages: usize,
    clock: u64,
    stats: CacheStats,
}

impl<T> PageCache<T> {
    pub fn new(max_cached_pages: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(max_cached_pages),
            max_cached_pages: max_cached_pages.max(1),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// Look up a page, bumping its recency on a hit.
    pub fn get(&mut self, page_index: usize) -> Option<&Page<T>> {
        self.clock += 1;
        match self.entries.get_mut(&page_index) {
            Some(entry) => {
                entry.last_access = self.clock;
                self.stats.hits = self.stats.hits.saturating_add(1);
                Some(&entry.page)
            }
            None => {
                self.stats.misses = self.stats.misses.saturating_add(1);
                None
            }
        }
    }

    /// Whether a page is cached, without touching recency or counters.
    pub fn contains(&self, page_index: usize) -> bool {
        self.entries.contains_key(&page_index)
    }

    /// Look up a page without touching recency or hit/miss counters.
    pub fn peek(&self, page_index: usize) -> Option<&Page<T>> {
        self.entries.get(&page_index).map(|entry| &entry.page)
    }

    /// Insert (or replace) a page, evicting the least-recently-accessed
    /// entry if the capacity would be exceeded.
    ///
    /// # Returns
    /// The index of the evicted page, if eviction occurred.
    pub fn put(&mut self, page_index: usize, items: Vec<T>) -> Option<usize> {
        self.clock += 1;
        let entry = CacheEntry {
            page: Page {
                index: page_index,
                items,
                fetched_at: Instant::now(),
            },
            last_access: self.clock,
        };
        self.entries.insert(page_index, entry);

        if self.entries.len() <= self.max_cached_pages {
            return None;
        }
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(&index, _)| index)?;
        self.entries.remove(&victim);
        self.stats.evictions = self.stats.evictions.saturating_add(1);
        Some(victim)
    }

    /// Drop a single page, e.g. for a forced refresh.
    pub fn invalidate(&mut self, page_index: usize) -> bool {
        self.entries.remove(&page_index).is_some()
    }

    /// Drop every page. Called on page-size changes and structural changes
    /// in the underlying data source.
    pub fn invalidate_all(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.stats.invalidations = self.stats.invalidations.saturating_add(1);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
