//! Latency-driven page-size adaptation.

use crate::config::PagingConfig;
use std::time::Duration;

/// Why the sizer chose (or declined) a new page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeReason {
    TooSlowLoad,
    TooSlowRender,
    HeadroomAvailable,
    NoChange,
}

/// Outcome of one adaptation evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingDecision {
    pub previous_size: usize,
    pub new_size: usize,
    pub reason: SizeReason,
}

impl SizingDecision {
    /// Whether the decision calls for an actual size change.
    pub fn is_change(&self) -> bool {
        self.new_size != self.previous_size
    }

    fn hold(size: usize) -> Self {
        Self {
            previous_size: size,
            new_size: size,
            reason: SizeReason::NoChange,
        }
    }
}

/// Decides whether to grow, shrink, or hold the page size from measured
/// load/render averages.
///
/// Rules are evaluated in priority order, first match wins:
/// 1. average load over threshold: shrink by the load factor;
/// 2. average render over threshold: shrink by the render factor;
/// 3. both averages under half their thresholds: grow by the grow factor.
///
/// Shrinks apply immediately. A grow needs two consecutive grow verdicts,
/// which keeps a single noisy sample from toggling the size back and forth
/// between evaluations. The caller owns the evaluation cadence and must not
/// call [`AdaptiveSizer::evaluate`] on an empty sample window.
#[derive(Debug)]
pub struct AdaptiveSizer {
    min_page_size: usize,
    max_page_size: usize,
    max_load_threshold: Duration,
    max_render_threshold: Duration,
    load_shrink_factor: f64,
    render_shrink_factor: f64,
    grow_factor: f64,
    grow_streak: u32,
}

impl AdaptiveSizer {
    pub fn new(config: &PagingConfig) -> Self {
        Self {
            min_page_size: config.min_page_size,
            max_page_size: config.max_page_size,
            max_load_threshold: config.max_load_threshold,
            max_render_threshold: config.max_render_threshold,
            load_shrink_factor: config.load_shrink_factor,
            render_shrink_factor: config.render_shrink_factor,
            grow_factor: config.grow_factor,
            grow_streak: 0,
        }
    }

    /// Evaluate one adaptation step against the current averages.
    pub fn evaluate(
        &mut self,
        current_size: usize,
        average_load: Duration,
        average_render: Duration,
    ) -> SizingDecision {
        if average_load > self.max_load_threshold {
            self.grow_streak = 0;
            return self.scaled(current_size, self.load_shrink_factor, SizeReason::TooSlowLoad);
        }
        if average_render > self.max_render_threshold {
            self.grow_streak = 0;
            return self.scaled(
                current_size,
                self.render_shrink_factor,
                SizeReason::TooSlowRender,
            );
        }
        if average_load < self.max_load_threshold / 2
            && average_render < self.max_render_threshold / 2
        {
            self.grow_streak += 1;
            if self.grow_streak < 2 {
                return SizingDecision::hold(current_size);
            }
            self.grow_streak = 0;
            return self.scaled(current_size, self.grow_factor, SizeReason::HeadroomAvailable);
        }
        self.grow_streak = 0;
        SizingDecision::hold(current_size)
    }

    /// Forget any pending grow streak, e.g. after a manual size change.
    pub fn reset(&mut self) {
        self.grow_streak = 0;
    }

    fn scaled(&self, current_size: usize, factor: f64, reason: SizeReason) -> SizingDecision {
        let scaled = (current_size as f64 * factor).round() as usize;
        let new_size = scaled.clamp(self.min_page_size, self.max_page_size);
        if new_size == current_size {
            return SizingDecision::hold(current_size);
        }
        SizingDecision {
            previous_size: current_size,
            new_size,
            reason,
        }
    }
}
