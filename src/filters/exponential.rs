use super::PositionFilter;
use crate::depth::{is_no_reading, WorldPoint};

/// Default smoothing factor
pub const DEFAULT_EXPONENTIAL_ALPHA: f32 = 0.5;

/// Exponential smoothing filter
pub struct ExponentialFilter {
    alpha: f32,
    last: Option<WorldPoint>,
}

impl ExponentialFilter {
    /// # Panics
    ///
    /// Panics unless `alpha` is in (0, 1]
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "Alpha must be in (0, 1]");
        Self { alpha, last: None }
    }
}

impl PositionFilter for ExponentialFilter {
    fn apply(&mut self, candidate: WorldPoint) -> WorldPoint {
        if is_no_reading(&candidate) {
            return self.last.unwrap_or(candidate);
        }
        let filtered = match self.last {
            Some(last) => WorldPoint::from(candidate.coords * self.alpha + last.coords * (1.0 - self.alpha)),
            None => candidate,
        };
        self.last = Some(filtered);
        filtered
    }

    fn reset(&mut self) {
        self.last = None;
    }

    fn name(&self) -> &str {
        "ExponentialFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_filter() {
        let mut filter = ExponentialFilter::new(0.5);

        // First value passes through
        let p1 = filter.apply(WorldPoint::new(10.0, 20.0, 500.0));
        assert_eq!(p1, WorldPoint::new(10.0, 20.0, 500.0));

        // Second value is smoothed
        let p2 = filter.apply(WorldPoint::new(20.0, 30.0, 700.0));
        assert_eq!(p2, WorldPoint::new(15.0, 25.0, 600.0));
    }

    #[test]
    fn test_reset_forgets_state() {
        let mut filter = ExponentialFilter::new(0.1);
        filter.apply(WorldPoint::new(10.0, 10.0, 10.0));
        filter.reset();
        let p = filter.apply(WorldPoint::new(20.0, 20.0, 20.0));
        assert_eq!(p, WorldPoint::new(20.0, 20.0, 20.0));
    }

    #[test]
    #[should_panic(expected = "Alpha must be in (0, 1]")]
    fn test_zero_alpha() {
        let _ = ExponentialFilter::new(0.0);
    }
}
