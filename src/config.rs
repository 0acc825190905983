//! Construction-time configuration for the paging engine.

use crate::error::PagingError;
use serde::Deserialize;
use std::time::Duration;

/// Tuning knobs for the paging controller and its collaborators.
///
/// Passed at construction; the engine reads no environment variables and
/// exposes no CLI surface. All fields have workable defaults, and an
/// embedding application can deserialize the struct from its own config
/// file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size used before any adaptation or stored preference applies.
    pub initial_page_size: usize,
    /// Lower bound for the page size, adaptive or manual.
    pub min_page_size: usize,
    /// Upper bound for the page size, adaptive or manual.
    pub max_page_size: usize,
    /// Maximum number of pages held in the cache before LRU eviction.
    pub max_cached_pages: usize,
    /// Average load duration above which the page size shrinks.
    pub max_load_threshold: Duration,
    /// Average render duration above which the page size shrinks.
    pub max_render_threshold: Duration,
    /// Minimum wall-clock gap between adaptation evaluations.
    pub adaptation_cadence: Duration,
    /// Number of performance samples retained for averaging.
    pub rolling_window_size: usize,
    /// How many pages on each side of the current page to prefetch.
    pub prefetch_radius: usize,
    /// Multiplier applied when shrinking due to slow loads.
    pub load_shrink_factor: f64,
    /// Multiplier applied when shrinking due to slow renders.
    pub render_shrink_factor: f64,
    /// Multiplier applied when growing under performance headroom.
    pub grow_factor: f64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            initial_page_size: 50,
            min_page_size: 10,
            max_page_size: 1000,
            max_cached_pages: 20,
            max_load_threshold: Duration::from_millis(100),
            max_render_threshold: Duration::from_millis(50),
            adaptation_cadence: Duration::from_secs(5),
            rolling_window_size: 50,
            prefetch_radius: 1,
            load_shrink_factor: 0.7,
            render_shrink_factor: 0.8,
            grow_factor: 1.3,
        }
    }
}

impl PagingConfig {
    /// Validate the configuration before any controller is built on it.
    ///
    /// # Errors
    /// Returns [`PagingError::InvalidConfiguration`] describing the first
    /// violated rule. A controller must never be constructed from a
    /// configuration that fails here.
    pub fn validate(&self) -> Result<(), PagingError> {
        if self.min_page_size == 0 {
            return Err(invalid("min_page_size must be at least 1"));
        }
        if self.min_page_size > self.max_page_size {
            return Err(invalid(&format!(
                "min_page_size ({}) exceeds max_page_size ({})",
                self.min_page_size, self.max_page_size
            )));
        }
        if self.initial_page_size < self.min_page_size
            || self.initial_page_size > self.max_page_size
        {
            return Err(invalid(&format!(
                "initial_page_size ({}) outside [{}, {}]",
                self.initial_page_size, self.min_page_size, self.max_page_size
            )));
        }
        if self.max_cached_pages == 0 {
            return Err(invalid("max_cached_pages must be at least 1"));
        }
        if self.rolling_window_size == 0 {
            return Err(invalid("rolling_window_size must be at least 1"));
        }
        if !(self.load_shrink_factor > 0.0 && self.load_shrink_factor < 1.0) {
            return Err(invalid("load_shrink_factor must be in (0, 1)"));
        }
        if !(self.render_shrink_factor > 0.0 && self.render_shrink_factor < 1.0) {
            return Err(invalid("render_shrink_factor must be in (0, 1)"));
        }
        if self.grow_factor <= 1.0 {
            return Err(invalid("grow_factor must be greater than 1"));
        }
        Ok(())
    }

    /// Clamp a requested page size into the configured bounds.
    pub fn clamp_page_size(&self, size: usize) -> usize {
        size.clamp(self.min_page_size, self.max_page_size)
    }
}

fn invalid(message: &str) -> PagingError {
    PagingError::InvalidConfiguration(message.to_string())
}
