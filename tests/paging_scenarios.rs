//! End-to-end paging scenarios over scripted data sources.

use pageflow::{
    PageDataSource, PagingConfig, PagingController, PagingError, PagingEvent, SliceSource,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Install a compact subscriber so `RUST_LOG=pageflow=debug` surfaces the
/// engine's prefetch/adaptation logs while debugging a failing scenario.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_test_writer()
        .try_init();
}

/// Source with scripted latency, failure injection, and a fetch counter.
struct ScriptedSource {
    items: Vec<u64>,
    fetch_calls: AtomicUsize,
    failing: AtomicBool,
    latency: Duration,
}

impl ScriptedSource {
    fn new(len: u64) -> Self {
        Self {
            items: (0..len).collect(),
            fetch_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            latency: Duration::ZERO,
        }
    }

    fn with_latency(len: u64, latency: Duration) -> Self {
        Self {
            latency,
            ..Self::new(len)
        }
    }

    fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl PageDataSource<u64> for ScriptedSource {
    fn total_count(&self) -> usize {
        self.items.len()
    }

    fn fetch(&self, start_index: usize, count: usize) -> Result<Vec<u64>, PagingError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PagingError::DataUnavailable("backing store offline".to_string()));
        }
        let start = start_index.min(self.items.len());
        let end = start.saturating_add(count).min(self.items.len());
        Ok(self.items[start..end].to_vec())
    }
}

fn foreground_only_config() -> PagingConfig {
    PagingConfig {
        prefetch_radius: 0,
        adaptation_cadence: Duration::from_secs(3600),
        ..PagingConfig::default()
    }
}

/// Pump `tick` until `done` holds or the deadline passes.
fn pump_until(
    controller: &mut PagingController<u64>,
    done: impl Fn(&PagingController<u64>) -> bool,
) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        controller.tick();
        if done(controller) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn empty_dataset_yields_one_empty_page_without_fetching() {
    let source = Arc::new(ScriptedSource::new(0));
    let mut controller =
        PagingController::new(source.clone(), foreground_only_config()).expect("config");

    let viewport = controller.go_to_first_page().expect("navigate");
    assert_eq!(controller.total_pages(), 1);
    assert_eq!(controller.current_page(), 1);
    assert_eq!(viewport.start_index, 0);
    assert_eq!(viewport.end_index, 0);
    assert_eq!(controller.page_items(), Some(&[] as &[u64]));
    assert_eq!(source.fetches(), 0, "empty page must be short-circuited");
}

#[test]
fn page_range_is_validated_against_the_dataset() {
    let source = Arc::new(ScriptedSource::new(1000));
    let mut controller =
        PagingController::new(source, foreground_only_config()).expect("config");

    let viewport = controller.go_to_page(20).expect("last page is reachable");
    assert_eq!(viewport.start_index, 950);
    assert_eq!(controller.total_pages(), 20);

    let err = controller.go_to_page(21).expect_err("page 21 of 20");
    assert!(
        matches!(err, PagingError::OutOfRange { page: 21, total_pages: 20 }),
        "unexpected error: {err}"
    );
    assert_eq!(controller.current_page(), 20, "failed navigation must not move");

    let err = controller.go_to_page(0).expect_err("page 0 is invalid");
    assert!(matches!(err, PagingError::OutOfRange { page: 0, .. }));
}

#[test]
fn sequential_walk_evicts_the_oldest_page() {
    let source = Arc::new(ScriptedSource::new(200));
    let config = PagingConfig {
        max_cached_pages: 3,
        ..foreground_only_config()
    };
    let mut controller = PagingController::new(source.clone(), config).expect("config");
    let events = controller.subscribe();

    for page in 1..=4 {
        controller.go_to_page(page).expect("navigate");
    }

    assert!(!controller.is_cached(1), "page 1 must be evicted (LRU)");
    assert!(controller.is_cached(2));
    assert!(controller.is_cached(3));
    assert!(controller.is_cached(4));
    assert_eq!(controller.cache_stats().evictions, 1);

    let evictions: Vec<_> = events
        .try_iter()
        .filter(|event| matches!(event, PagingEvent::CacheEvicted { .. }))
        .collect();
    assert_eq!(evictions, vec![PagingEvent::CacheEvicted { page_index: 1 }]);

    // Going back to page 1 is a forced miss.
    let misses_before = controller.cache_stats().misses;
    controller.go_to_page(1).expect("navigate");
    assert_eq!(controller.cache_stats().misses, misses_before + 1);
}

#[test]
fn failed_page_five_recovers_on_retry() {
    let source = Arc::new(ScriptedSource::new(1000));
    let mut controller =
        PagingController::new(source.clone(), foreground_only_config()).expect("config");

    controller.go_to_page(4).expect("navigate");
    source.set_failing(true);

    let err = controller.go_to_page(5).expect_err("fetch must fail");
    assert!(matches!(err, PagingError::DataUnavailable(_)));
    assert_eq!(controller.current_page(), 4);

    source.set_failing(false);
    controller.go_to_page(5).expect("retry succeeds");
    assert_eq!(controller.current_page(), 5);
}

#[test]
fn neighbors_are_prefetched_in_the_background() {
    init_tracing();
    let source = Arc::new(ScriptedSource::new(500));
    let config = PagingConfig {
        adaptation_cadence: Duration::from_secs(3600),
        ..PagingConfig::default()
    };
    let mut controller = PagingController::new(source.clone(), config).expect("config");

    controller.go_to_page(3).expect("navigate");
    let populated = pump_until(&mut controller, |c| c.is_cached(2) && c.is_cached(4));
    assert!(populated, "neighbor pages never arrived");

    // Moving onto a prefetched page is a cache hit, not a foreground fetch.
    let misses = controller.cache_stats().misses;
    controller.go_to_page(4).expect("navigate");
    assert_eq!(controller.cache_stats().misses, misses);
}

#[test]
fn prefetch_failures_never_surface() {
    init_tracing();
    let source = Arc::new(ScriptedSource::new(500));
    let config = PagingConfig {
        adaptation_cadence: Duration::from_secs(3600),
        ..PagingConfig::default()
    };
    let mut controller = PagingController::new(source.clone(), config).expect("config");

    controller.go_to_page(3).expect("navigate");
    let populated = pump_until(&mut controller, |c| c.is_cached(2) && c.is_cached(4));
    assert!(populated, "neighbor pages never arrived");

    source.set_failing(true);
    controller.go_to_page(4).expect("cached page, no foreground fetch");

    // Give failed prefetches time to drain; the controller stays healthy.
    let deadline = Instant::now() + Duration::from_millis(100);
    while Instant::now() < deadline {
        controller.tick();
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(controller.current_page(), 4);

    source.set_failing(false);
    controller.go_to_page(10).expect("navigation still works");
}

#[test]
fn slow_source_shrinks_the_page_size() {
    init_tracing();
    let source = Arc::new(ScriptedSource::with_latency(
        10_000,
        Duration::from_millis(4),
    ));
    let config = PagingConfig {
        prefetch_radius: 0,
        adaptation_cadence: Duration::ZERO,
        max_load_threshold: Duration::from_millis(1),
        ..PagingConfig::default()
    };
    let mut controller = PagingController::new(source, config).expect("config");

    controller.go_to_first_page().expect("navigate");
    controller.tick();
    assert_eq!(
        controller.page_size(),
        35,
        "one adaptation cycle shrinks 50 by the load factor"
    );

    // Under sustained pressure the size keeps falling but never crosses the
    // configured floor.
    for page in 2..=8 {
        controller.go_to_page(page).expect("navigate");
        controller.tick();
    }
    assert!(controller.page_size() >= 10);
    assert!(controller.page_size() < 35);
}

#[test]
fn fast_source_grows_after_two_agreeing_cycles() {
    init_tracing();
    let source = Arc::new(ScriptedSource::new(10_000));
    let config = PagingConfig {
        prefetch_radius: 0,
        adaptation_cadence: Duration::ZERO,
        // An in-memory fetch is far below half of these thresholds.
        max_load_threshold: Duration::from_secs(1),
        max_render_threshold: Duration::from_secs(1),
        ..PagingConfig::default()
    };
    let mut controller = PagingController::new(source, config).expect("config");

    controller.go_to_first_page().expect("navigate");
    controller.tick();
    assert_eq!(controller.page_size(), 50, "first grow verdict is held back");

    controller.go_to_page(2).expect("navigate");
    controller.tick();
    assert_eq!(controller.page_size(), 65, "second verdict applies the grow");
}

#[test]
fn viewport_and_size_events_are_published() {
    let source = Arc::new(ScriptedSource::new(300));
    let mut controller =
        PagingController::new(source, foreground_only_config()).expect("config");
    let events = controller.subscribe();

    controller.go_to_page(2).expect("navigate");
    match events.try_recv() {
        Ok(PagingEvent::ViewportChanged { viewport }) => {
            assert_eq!(viewport.start_index, 50);
            assert_eq!(viewport.end_index, 100);
        }
        other => panic!("expected ViewportChanged, got {other:?}"),
    }

    controller.set_page_size(75).expect("resize");
    match events.try_recv() {
        Ok(PagingEvent::SizeAdapted {
            previous_size,
            new_size,
        }) => {
            assert_eq!((previous_size, new_size), (50, 75));
        }
        other => panic!("expected SizeAdapted, got {other:?}"),
    }
    // The reload after the size change republishes the viewport.
    assert!(matches!(
        events.try_recv(),
        Ok(PagingEvent::ViewportChanged { .. })
    ));
}

#[test]
fn resize_reload_keeps_the_anchor_row_visible() {
    let source = Arc::new(ScriptedSource::new(1000));
    let mut controller =
        PagingController::new(source, foreground_only_config()).expect("config");

    controller.go_to_page(7).expect("navigate");
    let anchor = controller.viewport().start_index;
    assert_eq!(anchor, 300);

    controller.set_page_size(25).expect("resize");
    let viewport = controller.viewport();
    assert!(viewport.start_index <= anchor && anchor < viewport.end_index);

    controller.set_page_size(50).expect("resize back");
    let viewport = controller.viewport();
    assert!(viewport.start_index <= anchor && anchor < viewport.end_index);
    assert_eq!(controller.current_page(), 7);
}

#[test]
fn structural_reload_drops_every_cached_page() {
    let source = Arc::new(SliceSource::new((0..400u64).collect::<Vec<_>>()));
    let mut controller =
        PagingController::new(source.clone(), foreground_only_config()).expect("config");

    for page in 1..=3 {
        controller.go_to_page(page).expect("navigate");
    }
    assert!(controller.is_cached(1));

    source.replace((1000..1400).collect());
    controller.reload().expect("reload");

    // Only the refetched current page is resident, and it serves new data.
    assert_eq!(controller.cache_stats().invalidations, 1);
    assert!(controller.is_cached(3));
    assert!(!controller.is_cached(1));
    let items = controller.page_items().expect("loaded");
    assert_eq!(items.first(), Some(&1100));
}

#[test]
fn cache_capacity_invariant_holds_under_random_walk() {
    let source = Arc::new(ScriptedSource::new(2000));
    let config = PagingConfig {
        max_cached_pages: 5,
        ..foreground_only_config()
    };
    let mut controller = PagingController::new(source, config).expect("config");

    // Deterministic pseudo-random walk over the page range.
    let mut state = 0x2545f491u64;
    for _ in 0..200 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let page = (state >> 33) as usize % controller.total_pages() + 1;
        controller.go_to_page(page).expect("navigate");

        assert!(controller.cached_pages() <= 5);
        let viewport = controller.viewport();
        assert!(viewport.start_index <= viewport.end_index);
        assert!(viewport.end_index <= viewport.total_items);
        assert!((1..=controller.total_pages()).contains(&controller.current_page()));
    }
}
