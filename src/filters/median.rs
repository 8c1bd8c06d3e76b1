use super::PositionFilter;
use crate::depth::{is_no_reading, WorldPoint};
use std::collections::VecDeque;

/// Default median window
pub const DEFAULT_MEDIAN_WINDOW: usize = 5;

/// Component-wise median filter
pub struct MedianFilter {
    window_size: usize,
    buffer: VecDeque<WorldPoint>,
}

impl MedianFilter {
    /// # Panics
    ///
    /// Panics if `window_size` is zero
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "Window size must be greater than 0");
        Self {
            window_size,
            buffer: VecDeque::with_capacity(window_size),
        }
    }

    fn calculate_median(mut values: Vec<f32>) -> f32 {
        values.sort_by(f32::total_cmp);

        let len = values.len();
        if len == 0 {
            0.0
        } else if len % 2 == 0 {
            (values[len / 2 - 1] + values[len / 2]) / 2.0
        } else {
            values[len / 2]
        }
    }
}

impl PositionFilter for MedianFilter {
    fn apply(&mut self, candidate: WorldPoint) -> WorldPoint {
        if !is_no_reading(&candidate) {
            if self.buffer.len() >= self.window_size {
                self.buffer.pop_front();
            }
            self.buffer.push_back(candidate);
        }
        if self.buffer.is_empty() {
            return candidate;
        }

        let axis = |i: usize| Self::calculate_median(self.buffer.iter().map(|p| p[i]).collect());
        WorldPoint::new(axis(0), axis(1), axis(2))
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    fn name(&self) -> &str {
        "MedianFilter"
    }
}
