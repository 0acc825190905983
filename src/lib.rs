//! Adaptive virtual paging engine for large scrollable datasets.
//!
//! Renders tens of thousands of rows smoothly by fetching only the visible
//! page (plus prefetched neighbors) through a [`PageDataSource`], caching
//! pages under an LRU bound, and adaptively resizing the page from measured
//! load/render latency.

/// Bounded LRU page cache.
pub mod cache;
/// Construction-time configuration.
pub mod config;
/// Paging controller and navigation API.
pub mod controller;
/// Error types.
pub mod error;
/// Event subscription surface.
pub mod events;
/// Rolling performance sample window.
pub mod sampler;
/// Injected settings capability.
pub mod settings;
/// Latency-driven page-size adaptation.
pub mod sizer;
/// Data-source seam and in-memory implementation.
pub mod source;
/// Viewport state and page arithmetic.
pub mod viewport;

pub use cache::{CacheStats, Page, PageCache};
pub use config::PagingConfig;
pub use controller::PagingController;
pub use error::PagingError;
pub use events::PagingEvent;
pub use sampler::PerformanceSampler;
pub use settings::{MemorySettings, SettingsStore, PAGE_SIZE_KEY};
pub use sizer::{AdaptiveSizer, SizeReason, SizingDecision};
pub use source::{PageDataSource, SliceSource};
pub use viewport::ViewportState;
