//! Rolling window of per-fetch performance samples.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One observation of how long a page took to load and render.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceSample {
    pub page_index: usize,
    pub load_duration: Duration,
    pub render_duration: Duration,
    pub recorded_at: Instant,
}

/// Bounded FIFO window of [`PerformanceSample`]s with mean accessors.
///
/// Samples are never persisted; once the window is full the oldest entry is
/// dropped on every append.
#[derive(Debug)]
pub struct PerformanceSampler {
    window: VecDeque<PerformanceSample>,
    capacity: usize,
}

impl PerformanceSampler {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a sample, trimming the window to capacity (oldest first).
    pub fn record(&mut self, page_index: usize, load_duration: Duration, render_duration: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(PerformanceSample {
            page_index,
            load_duration,
            render_duration,
            recorded_at: Instant::now(),
        });
    }

    /// Mean load duration over the window; zero when no samples exist.
    ///
    /// Callers must treat a zero average from an empty window as "no data
    /// yet", not as a fast source.
    pub fn average_load(&self) -> Duration {
        self.average(|sample| sample.load_duration)
    }

    /// Mean render duration over the window; zero when no samples exist.
    pub fn average_render(&self) -> Duration {
        self.average(|sample| sample.render_duration)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Drop every sample, e.g. after a page-size change makes old timings
    /// incomparable.
    pub fn clear(&mut self) {
        self.window.clear();
    }

    fn average(&self, pick: impl Fn(&PerformanceSample) -> Duration) -> Duration {
        if self.window.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.window.iter().map(pick).sum();
        total / self.window.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_averages_to_zero() {
        let sampler = PerformanceSampler::new(8);
        assert!(sampler.is_empty());
        assert_eq!(sampler.average_load(), Duration::ZERO);
        assert_eq!(sampler.average_render(), Duration::ZERO);
    }

    #[test]
    fn averages_are_arithmetic_means() {
        let mut sampler = PerformanceSampler::new(8);
        sampler.record(0, Duration::from_millis(10), Duration::from_millis(2));
        sampler.record(1, Duration::from_millis(30), Duration::from_millis(6));
        assert_eq!(sampler.average_load(), Duration::from_millis(20));
        assert_eq!(sampler.average_render(), Duration::from_millis(4));
    }

    #[test]
    fn window_trims_oldest_first() {
        let mut sampler = PerformanceSampler::new(3);
        for page in 0..5 {
            sampler.record(page, Duration::from_millis(page as u64), Duration::ZERO);
        }
        assert_eq!(sampler.len(), 3);
        // Pages 0 and 1 were dropped; mean over 2, 3, 4 ms.
        assert_eq!(sampler.average_load(), Duration::from_millis(3));
    }

    #[test]
    fn clear_empties_the_window() {
        let mut sampler = PerformanceSampler::new(4);
        sampler.record(0, Duration::from_millis(5), Duration::ZERO);
        sampler.clear();
        assert!(sampler.is_empty());
        assert_eq!(sampler.average_load(), Duration::ZERO);
    }

    #[test]
    fn zero_capacity_still_holds_one_sample() {
        let mut sampler = PerformanceSampler::new(0);
        sampler.record(0, Duration::from_millis(7), Duration::ZERO);
        assert_eq!(sampler.len(), 1);
        sampler.record(1, Duration::from_millis(9), Duration::ZERO);
        assert_eq!(sampler.len(), 1);
        assert_eq!(sampler.average_load(), Duration::from_millis(9));
    }
}
