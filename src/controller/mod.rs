//! Root orchestrator for windowed navigation over a paged data source.
//!
//! The controller owns all mutable paging state (viewport, cache, sampler,
//! sizer) and is driven entirely through `&mut self`, so it is the single
//! writer by construction. Foreground fetches block until resolved; the
//! only other thread is the prefetch worker, whose completions are applied
//! by [`PagingController::tick`]. A navigation call therefore always
//! returns a viewport that reflects its own outcome, and no intermediate
//! loading state is observable between calls.

mod prefetch;


use crate::cache::{CacheStats, PageCache};
use crate::config::PagingConfig;
use crate::error::PagingError;
use crate::events::{EventHub, PagingEvent};
use crate::sampler::PerformanceSampler;
use crate::settings::{SettingsStore, PAGE_SIZE_KEY};
use crate::sizer::AdaptiveSizer;
use crate::source::PageDataSource;
use crate::viewport::{self, ViewportState};
use crossbeam_channel::Receiver;
use prefetch::{spawn_prefetch_worker, PrefetchHandle, PrefetchJob};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, trace, warn};

/// Load timing for a fetch whose render leg has not been reported yet.
#[derive(Debug, Clone, Copy)]
struct PendingSample {
    page_index: usize,
    load_duration: Duration,
}

/// Windowed, cached, adaptively sized view over a [`PageDataSource`].
///
/// Construction validates the configuration; an invalid configuration
/// never yields a usable controller. After construction the viewport is
/// empty until the first navigation call establishes it.
pub struct PagingController<T: Send + 'static> {
    config: PagingConfig,
    source: Arc<dyn PageDataSource<T>>,
    viewport: ViewportState,
    cache: PageCache<T>,
    sampler: PerformanceSampler,
    sizer: AdaptiveSizer,
    events: EventHub,
    settings: Option<Box<dyn SettingsStore>>,
    prefetch: PrefetchHandle<T>,
    /// Bumped on every whole-cache invalidation; prefetch results carry the
    /// generation they were scheduled under and are dropped on mismatch.
    generation: u64,
    pending_sample: Option<PendingSample>,
    last_adaptation: Instant,
}

impl<T: Send + 'static> PagingController<T> {
    /// Build a controller over `source` with the given configuration.
    ///
    /// # Errors
    /// [`PagingError::InvalidConfiguration`] if the configuration fails
    /// validation.
    pub fn new(
        source: Arc<dyn PageDataSource<T>>,
        config: PagingConfig,
    ) -> Result<Self, PagingError> {
        Self::build(source, config, None)
    }

    /// Build a controller that restores its page size from, and persists
    /// page-size changes to, the given settings store.
    ///
    /// A stored value that fails to parse is ignored; a stored value
    /// outside the configured bounds is clamped.
    ///
    /// # Errors
    /// [`PagingError::InvalidConfiguration`] if the configuration fails
    /// validation.
    pub fn with_settings(
        source: Arc<dyn PageDataSource<T>>,
        config: PagingConfig,
        settings: Box<dyn SettingsStore>,
    ) -> Result<Self, PagingError> {
        Self::build(source, config, Some(settings))
    }

    fn build(
        source: Arc<dyn PageDataSource<T>>,
        config: PagingConfig,
        settings: Option<Box<dyn SettingsStore>>,
    ) -> Result<Self, PagingError> {
        config.validate()?;

        let mut page_size = config.initial_page_size;
        if let Some(store) = settings.as_deref() {
            if let Some(saved) = store
                .get(PAGE_SIZE_KEY)
                .and_then(|value| value.parse::<usize>().ok())
            {
                page_size = config.clamp_page_size(saved);
            }
        }

        Ok(Self {
            viewport: ViewportState::new(page_size),
            cache: PageCache::new(config.max_cached_pages),
            sampler: PerformanceSampler::new(config.rolling_window_size),
            sizer: AdaptiveSizer::new(&config),
            events: EventHub::new(),
            settings,
            prefetch: spawn_prefetch_worker(source.clone()),
            generation: 0,
            pending_sample: None,
            last_adaptation: Instant::now(),
            source,
            config,
        })
    }

    // ---- navigation -----------------------------------------------------

    /// Navigate to a 1-based page.
    ///
    /// On success the returned viewport covers the requested page and its
    /// neighbors have been scheduled for prefetch. On failure the viewport
    /// is unchanged and no partial page has entered the cache.
    ///
    /// # Errors
    /// - [`PagingError::OutOfRange`] if `page` is outside `1..=total_pages`.
    /// - [`PagingError::DataUnavailable`] if the source failed; retryable.
    pub fn go_to_page(&mut self, page: usize) -> Result<ViewportState, PagingError> {
        let total_items = self.source.total_count();
        let total_pages = viewport::total_pages(total_items, self.viewport.page_size);
        if page == 0 || page > total_pages {
            return Err(PagingError::OutOfRange { page, total_pages });
        }
        self.load_page(page, total_items)?;
        Ok(self.viewport)
    }

    /// Navigate to page 1.
    pub fn go_to_first_page(&mut self) -> Result<ViewportState, PagingError> {
        self.go_to_page(1)
    }

    /// Navigate to the last page.
    pub fn go_to_last_page(&mut self) -> Result<ViewportState, PagingError> {
        let total_items = self.source.total_count();
        let total_pages = viewport::total_pages(total_items, self.viewport.page_size);
        self.go_to_page(total_pages)
    }

    /// Navigate one page forward; silently a no-op on the last page.
    pub fn go_to_next_page(&mut self) -> Result<ViewportState, PagingError> {
        let total_items = self.source.total_count();
        let total_pages = viewport::total_pages(total_items, self.viewport.page_size);
        let current = self.viewport.current_page();
        if current >= total_pages {
            return Ok(self.viewport);
        }
        self.load_page(current + 1, total_items)?;
        Ok(self.viewport)
    }

    /// Navigate one page back; silently a no-op on page 1.
    pub fn go_to_previous_page(&mut self) -> Result<ViewportState, PagingError> {
        let current = self.viewport.current_page();
        if current <= 1 {
            return Ok(self.viewport);
        }
        self.go_to_page(current - 1)
    }

    /// Refetch the current page, bypassing the cache.
    ///
    /// Used when the caller knows items on the current page changed. The
    /// fresh page replaces the cached one only after a successful fetch, so
    /// a failure leaves the last-known-good data renderable.
    ///
    /// # Errors
    /// [`PagingError::DataUnavailable`] if the source failed; retryable.
    pub fn refresh_current_page(&mut self) -> Result<ViewportState, PagingError> {
        let total_items = self.source.total_count();
        if total_items == 0 {
            self.generation += 1;
            self.cache.invalidate_all();
            self.update_viewport(0, 0, 0);
            return Ok(self.viewport);
        }

        let total_pages = viewport::total_pages(total_items, self.viewport.page_size);
        let page = self.viewport.current_page().min(total_pages);
        let (start, end) = viewport::page_bounds(page, self.viewport.page_size, total_items);

        let items = self.timed_fetch(page, start)?;
        if let Some(evicted) = self.cache.put(page, items) {
            self.note_eviction(evicted);
        }
        self.update_viewport(start, end, total_items);
        Ok(self.viewport)
    }

    /// Re-sync with the data source after a structural change (sort,
    /// filter, insert/delete upstream of the viewport).
    ///
    /// Clears the cache, clamps the current page into the new page count,
    /// and refetches.
    ///
    /// # Errors
    /// [`PagingError::DataUnavailable`] if the refetch failed; retryable.
    pub fn reload(&mut self) -> Result<ViewportState, PagingError> {
        let total_items = self.source.total_count();
        self.generation += 1;
        self.cache.invalidate_all();

        let total_pages = viewport::total_pages(total_items, self.viewport.page_size);
        let page = self.viewport.current_page().min(total_pages);
        self.load_page(page, total_items)?;
        Ok(self.viewport)
    }

    /// Change the page size, clamped to the configured bounds.
    ///
    /// A change clears the cache and reloads the viewport at the new size;
    /// the first visible item is preserved by recomputing its page index.
    /// A request that clamps to the current size is a no-op.
    ///
    /// # Errors
    /// [`PagingError::DataUnavailable`] if the reload fetch failed. The new
    /// page size is kept; the caller can retry via [`Self::go_to_page`].
    pub fn set_page_size(&mut self, size: usize) -> Result<ViewportState, PagingError> {
        let clamped = self.config.clamp_page_size(size);
        if clamped == self.viewport.page_size {
            return Ok(self.viewport);
        }
        self.apply_page_size(clamped)?;
        Ok(self.viewport)
    }

    // ---- cooperative pump -----------------------------------------------

    /// Apply prefetch completions and run adaptation when due.
    ///
    /// Hosts call this from their frame/timer loop. Adaptation only ever
    /// runs from here, so an inactive viewport (one nobody is pumping) is
    /// never resized behind the host's back.
    pub fn tick(&mut self) {
        self.drain_prefetch();
        self.maybe_adapt();
    }

    /// Report how long the host took to render the most recent foreground
    /// fetch.
    ///
    /// Pairs the render duration with the pending load sample. A fetch
    /// whose render is never reported is flushed with a zero render
    /// duration when the next sample needs the slot.
    pub fn complete_render(&mut self, render_duration: Duration) {
        if let Some(pending) = self.pending_sample.take() {
            self.sampler
                .record(pending.page_index, pending.load_duration, render_duration);
        }
    }

    // ---- accessors ------------------------------------------------------

    /// Snapshot of the current viewport.
    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    /// 1-based current page, as of the last navigation.
    pub fn current_page(&self) -> usize {
        self.viewport.current_page()
    }

    /// Total page count, as of the last navigation.
    pub fn total_pages(&self) -> usize {
        self.viewport.total_pages()
    }

    pub fn page_size(&self) -> usize {
        self.viewport.page_size
    }

    /// Items of the current page, if loaded.
    pub fn page_items(&self) -> Option<&[T]> {
        if self.viewport.total_items == 0 {
            return Some(&[]);
        }
        self.cache
            .peek(self.viewport.current_page())
            .map(|page| page.items.as_slice())
    }

    /// Whether a page is resident in the cache.
    pub fn is_cached(&self, page: usize) -> bool {
        self.cache.contains(page)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of pages currently resident in the cache.
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    /// Register an event subscriber; see [`PagingEvent`].
    pub fn subscribe(&mut self) -> Receiver<PagingEvent> {
        self.events.subscribe()
    }

    // ---- internals ------------------------------------------------------

    /// Bring `page` into the viewport, fetching on a cache miss.
    ///
    /// `page` must already be validated against `total_items`.
    fn load_page(&mut self, page: usize, total_items: usize) -> Result<(), PagingError> {
        if total_items == 0 {
            // Single empty page: nothing to fetch.
            self.update_viewport(0, 0, 0);
            return Ok(());
        }

        let (start, end) = viewport::page_bounds(page, self.viewport.page_size, total_items);
        if self.cache.get(page).is_none() {
            let items = self.timed_fetch(page, start)?;
            if let Some(evicted) = self.cache.put(page, items) {
                self.note_eviction(evicted);
            }
        }

        self.update_viewport(start, end, total_items);
        self.schedule_prefetch(page, total_items);
        Ok(())
    }

    /// Foreground fetch with load timing; the sample stays pending until
    /// the host reports its render duration.
    fn timed_fetch(&mut self, page: usize, start: usize) -> Result<Vec<T>, PagingError> {
        let started = Instant::now();
        let items = self.source.fetch(start, self.viewport.page_size)?;
        let load_duration = started.elapsed();
        self.flush_pending_sample();
        self.pending_sample = Some(PendingSample {
            page_index: page,
            load_duration,
        });
        Ok(items)
    }

    fn update_viewport(&mut self, start: usize, end: usize, total_items: usize) {
        let next = ViewportState {
            start_index: start,
            end_index: end,
            total_items,
            page_size: self.viewport.page_size,
        };
        if next != self.viewport {
            self.viewport = next;
            self.events
                .emit(PagingEvent::ViewportChanged { viewport: next });
        }
    }

    fn schedule_prefetch(&mut self, page: usize, total_items: usize) {
        if self.config.prefetch_radius == 0 {
            return;
        }
        let total_pages = viewport::total_pages(total_items, self.viewport.page_size);
        for offset in 1..=self.config.prefetch_radius {
            if page > offset {
                self.enqueue_prefetch(page - offset, total_items);
            }
            if page + offset <= total_pages {
                self.enqueue_prefetch(page + offset, total_items);
            }
        }
    }

    fn enqueue_prefetch(&mut self, page: usize, total_items: usize) {
        if self.cache.contains(page) {
            return;
        }
        let (start, end) = viewport::page_bounds(page, self.viewport.page_size, total_items);
        if start == end {
            return;
        }
        self.prefetch.enqueue(PrefetchJob {
            generation: self.generation,
            page_index: page,
            start_index: start,
            count: end - start,
        });
    }

    fn drain_prefetch(&mut self) {
        for result in self.prefetch.drain() {
            if result.generation != self.generation {
                continue;
            }
            // A page fetched in the foreground meanwhile wins; re-inserting
            // would only churn recency.
            if self.cache.contains(result.page_index) {
                continue;
            }
            let page_index = result.page_index;
            if let Some(evicted) = self.cache.put(page_index, result.items) {
                self.note_eviction(evicted);
            }
        }
    }

    fn maybe_adapt(&mut self) {
        if self.last_adaptation.elapsed() < self.config.adaptation_cadence {
            return;
        }
        self.flush_pending_sample();
        if self.sampler.is_empty() {
            // No data yet: no adaptation decision is possible.
            return;
        }
        self.last_adaptation = Instant::now();

        let decision = self.sizer.evaluate(
            self.viewport.page_size,
            self.sampler.average_load(),
            self.sampler.average_render(),
        );
        if !decision.is_change() {
            return;
        }
        info!(
            target: "pageflow::adapt",
            previous_size = decision.previous_size,
            new_size = decision.new_size,
            reason = ?decision.reason,
            "adapting page size"
        );
        if let Err(err) = self.apply_page_size(decision.new_size) {
            warn!(
                target: "pageflow::adapt",
                error = %err,
                "reload after adaptation failed; will retry on next navigation"
            );
        }
    }

    /// Switch to `new_size` (already clamped), preserving the first visible
    /// item, and reload the viewport.
    fn apply_page_size(&mut self, new_size: usize) -> Result<(), PagingError> {
        let previous_size = self.viewport.page_size;
        let first_visible = self.viewport.start_index;

        self.generation += 1;
        self.cache.invalidate_all();
        // Samples taken at the old size are not comparable.
        self.sampler.clear();
        self.sizer.reset();
        self.pending_sample = None;
        self.viewport.page_size = new_size;

        if let Some(store) = self.settings.as_deref_mut() {
            store.set(PAGE_SIZE_KEY, new_size.to_string());
        }
        self.events.emit(PagingEvent::SizeAdapted {
            previous_size,
            new_size,
        });

        let total_items = self.source.total_count();
        let total_pages = viewport::total_pages(total_items, new_size);
        let page = viewport::page_for_index(first_visible, new_size).min(total_pages);
        self.load_page(page, total_items)
    }

    fn flush_pending_sample(&mut self) {
        if let Some(pending) = self.pending_sample.take() {
            self.sampler
                .record(pending.page_index, pending.load_duration, Duration::ZERO);
        }
    }

    fn note_eviction(&mut self, page_index: usize) {
        trace!(target: "pageflow::cache", page_index, "evicted least-recently-used page");
        self.events.emit(PagingEvent::CacheEvicted { page_index });
    }
}
