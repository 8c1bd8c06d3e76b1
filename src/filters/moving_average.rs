use super::PositionFilter;
use crate::depth::{is_no_reading, WorldPoint};
use std::collections::VecDeque;

/// Bounded FIFO of accepted head positions.
///
/// Holds at most `capacity` points; pushing onto a full history evicts the
/// oldest. The smoothed position is the plain mean of whatever is held, so
/// the window ramps up from one sample instead of waiting to fill.
#[derive(Debug, Clone)]
pub struct HeadHistory {
    capacity: usize,
    points: VecDeque<WorldPoint>,
}

impl HeadHistory {
    /// # Panics
    ///
    /// Panics if `capacity` is zero
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Window size must be greater than 0");
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &WorldPoint> {
        self.points.iter()
    }

    /// Append a position, evicting the oldest when full. The zero sentinel is
    /// refused; returns whether the point was stored.
    pub fn push(&mut self, point: WorldPoint) -> bool {
        if is_no_reading(&point) {
            return false;
        }
        if self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
        true
    }

    /// Component-wise mean of the held positions
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<WorldPoint> {
        if self.points.is_empty() {
            return None;
        }
        let sum = self.points.iter().fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
        Some(WorldPoint::from(sum / self.points.len() as f32))
    }

    /// Push `candidate` and return the new mean.
    ///
    /// A sentinel candidate leaves the history untouched; the result is then
    /// the mean of what was already held, or the sentinel if nothing was.
    pub fn smooth(&mut self, candidate: WorldPoint) -> WorldPoint {
        self.push(candidate);
        self.mean().unwrap_or(candidate)
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl PositionFilter for HeadHistory {
    fn apply(&mut self, candidate: WorldPoint) -> WorldPoint {
        self.smooth(candidate)
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn name(&self) -> &str {
        "MovingAverageFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::no_reading;
    use proptest::prelude::*;

    fn p(x: f32) -> WorldPoint {
        WorldPoint::new(x, x * 2.0, 500.0 + x)
    }

    #[test]
    fn test_moving_average() {
        let mut history = HeadHistory::new(3);

        assert_eq!(history.smooth(p(10.0)), p(10.0));
        assert_eq!(history.smooth(p(20.0)), p(15.0));
        assert_eq!(history.smooth(p(30.0)), p(20.0));

        // Window is full, oldest value should be dropped
        assert_eq!(history.smooth(p(40.0)), p(30.0));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut history = HeadHistory::new(2);
        history.push(p(1.0));
        history.push(p(2.0));
        history.push(p(3.0));
        let held: Vec<f32> = history.iter().map(|q| q.x).collect();
        assert_eq!(held, vec![2.0, 3.0]);
    }

    #[test]
    fn test_sentinel_never_stored() {
        let mut history = HeadHistory::new(10);
        assert!(!history.push(no_reading()));
        assert!(history.is_empty());

        history.push(p(4.0));
        assert_eq!(history.smooth(no_reading()), p(4.0));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_mean_of_empty_history() {
        assert!(HeadHistory::new(10).mean().is_none());
    }

    #[test]
    #[should_panic(expected = "Window size must be greater than 0")]
    fn test_zero_window() {
        let _ = HeadHistory::new(0);
    }

    proptest! {
        #[test]
        fn prop_history_bound(n in 0usize..40) {
            let mut history = HeadHistory::new(10);
            for i in 0..n {
                history.push(p(i as f32 + 1.0));
            }
            prop_assert_eq!(history.len(), n.min(10));
            if n > 0 {
                let first = history.iter().next().unwrap().x;
                prop_assert_eq!(first, (n.saturating_sub(10) + 1) as f32);
            }
        }

        #[test]
        fn prop_smooth_is_mean(xs in prop::collection::vec(1i32..1000, 1..10)) {
            // Small integers keep the f32 sums exact
            let mut history = HeadHistory::new(10);
            let mut out = WorldPoint::origin();
            for &x in &xs {
                out = history.smooth(WorldPoint::new(x as f32, -(x as f32), 2.0 * x as f32));
            }
            let mean = xs.iter().sum::<i32>() as f32 / xs.len() as f32;
            prop_assert_eq!(out.x, mean);
            prop_assert_eq!(out.y, -mean);
            prop_assert_eq!(out.z, 2.0 * xs.iter().sum::<i32>() as f32 / xs.len() as f32);
        }
    }
}
