//! Bounded sample window and the verdict computed from it.

use clmm_rebalancer_domain::enums::TrendDirection;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of samples kept per pair.
pub const MAX_SAMPLES: usize = 100;

/// Tick spacing the caller-supplied threshold is expressed against.
pub const REFERENCE_SPACING: f64 = 40.0;

/// A single observation of the pool tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSample {
    /// Unix timestamp in milliseconds.
    pub timestamp_ms: i64,
    /// Observed tick index.
    pub tick: i32,
}

/// Result of a volatility check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityVerdict {
    /// Whether the rate of change reached the scaled threshold.
    pub is_volatile: bool,
    /// Signed rate of change in ticks per second.
    pub delta: f64,
    /// Not enough samples to judge.
    pub is_loading: bool,
    /// Trend direction, absent while loading.
    pub direction: Option<TrendDirection>,
}

impl VolatilityVerdict {
    /// Verdict returned while the window is still filling.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_volatile: false,
            delta: 0.0,
            is_loading: true,
            direction: None,
        }
    }
}

/// Scales a per-40-tick threshold to the pool's spacing.
pub fn scaled_threshold(threshold: f64, tick_spacing: i32) -> f64 {
    threshold * f64::from(tick_spacing) / REFERENCE_SPACING
}

/// Insertion-ordered window capped at [`MAX_SAMPLES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleWindow {
    samples: VecDeque<TickSample>,
}

impl SampleWindow {
    /// Creates an empty window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample, evicting the oldest when full.
    pub fn push(&mut self, sample: TickSample) {
        while self.samples.len() >= MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TickSample> {
        self.samples.iter()
    }

    /// Computes the verdict from samples no older than `window_ms` at `now_ms`.
    ///
    /// The rate is the slope between the two most recent samples in the
    /// window. Depends only on the stored samples and the given `now_ms`.
    pub fn verdict(
        &self,
        now_ms: i64,
        window_ms: i64,
        tick_spacing: i32,
        threshold: f64,
    ) -> VolatilityVerdict {
        let mut recent = self
            .samples
            .iter()
            .rev()
            .filter(|sample| now_ms - sample.timestamp_ms <= window_ms);

        let (Some(last), Some(previous)) = (recent.next(), recent.next()) else {
            return VolatilityVerdict::loading();
        };

        let elapsed_ms = last.timestamp_ms - previous.timestamp_ms;
        if elapsed_ms <= 0 {
            return VolatilityVerdict::loading();
        }

        let delta = f64::from(last.tick - previous.tick) / (elapsed_ms as f64 / 1000.0);
        let direction = if delta >= 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };

        VolatilityVerdict {
            is_volatile: delta.abs() >= scaled_threshold(threshold, tick_spacing),
            delta,
            is_loading: false,
            direction: Some(direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp_ms: i64, tick: i32) -> TickSample {
        TickSample { timestamp_ms, tick }
    }

    #[test]
    fn test_window_bound_and_fifo() {
        let mut window = SampleWindow::new();
        for i in 0..250 {
            window.push(sample(i, i as i32));
            assert!(window.len() <= MAX_SAMPLES);
        }
        let ticks: Vec<i32> = window.iter().map(|s| s.tick).collect();
        let expected: Vec<i32> = (150..250).collect();
        assert_eq!(ticks, expected);
    }

    #[test]
    fn test_volatile_up_scenario() {
        let mut window = SampleWindow::new();
        window.push(sample(0, 100));
        window.push(sample(10_000, 130));

        let verdict = window.verdict(10_000, 60_000, 40, 3.0);
        assert!(!verdict.is_loading);
        assert!(verdict.is_volatile);
        assert!((verdict.delta - 3.0).abs() < f64::EPSILON);
        assert_eq!(verdict.direction, Some(TrendDirection::Up));
    }

    #[test]
    fn test_single_sample_is_loading() {
        let mut window = SampleWindow::new();
        window.push(sample(0, 100));
        let verdict = window.verdict(0, 60_000, 40, 3.0);
        assert!(verdict.is_loading);
        assert!(!verdict.is_volatile);
    }

    #[test]
    fn test_samples_outside_window_are_ignored() {
        let mut window = SampleWindow::new();
        window.push(sample(0, 100));
        window.push(sample(50_000, 90));
        // only the second sample is within 30s of now
        assert!(window.verdict(70_000, 30_000, 40, 3.0).is_loading);

        window.push(sample(60_000, 70));
        let verdict = window.verdict(70_000, 30_000, 40, 3.0);
        assert_eq!(verdict.direction, Some(TrendDirection::Down));
        assert!((verdict.delta + 2.0).abs() < 1e-9);
        assert!(!verdict.is_volatile);
    }

    #[test]
    fn test_same_timestamp_is_loading() {
        let mut window = SampleWindow::new();
        window.push(sample(5, 100));
        window.push(sample(5, 200));
        assert!(window.verdict(5, 60_000, 40, 3.0).is_loading);
    }

    #[test]
    fn test_threshold_scales_with_spacing() {
        assert!((scaled_threshold(3.0, 40) - 3.0).abs() < f64::EPSILON);
        assert!((scaled_threshold(3.0, 200) - 15.0).abs() < f64::EPSILON);

        let mut window = SampleWindow::new();
        window.push(sample(0, 0));
        window.push(sample(1_000, 10));
        assert!(window.verdict(1_000, 60_000, 40, 3.0).is_volatile);
        assert!(!window.verdict(1_000, 60_000, 200, 3.0).is_volatile);
    }

    #[test]
    fn test_raising_threshold_never_creates_volatility() {
        let mut window = SampleWindow::new();
        for (i, tick) in [100, 104, 97, 120, 118].iter().enumerate() {
            window.push(sample(i as i64 * 3_000, *tick));
        }
        let now = 12_000;
        let mut was_volatile = true;
        for step in 0..100 {
            let threshold = f64::from(step) * 0.25;
            let verdict = window.verdict(now, 60_000, 60, threshold);
            assert!(was_volatile || !verdict.is_volatile);
            was_volatile = verdict.is_volatile;
        }
    }

    #[test]
    fn test_window_serializes_as_array() {
        let mut window = SampleWindow::new();
        window.push(sample(1, 2));
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(json, serde_json::json!([{"timestamp_ms": 1, "tick": 2}]));
    }
}
