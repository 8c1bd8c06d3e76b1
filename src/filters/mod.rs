//! Temporal smoothing of head positions.
//!
//! Per-frame head candidates jitter with sensor noise and blob-selection
//! instability. The filters here trade responsiveness for stability; the
//! default is a moving average over the last 10 positions (about 167 ms at
//! 60 frames per second).

/// Bounded head history averaged into a single position
pub mod moving_average;

/// Component-wise median for outlier rejection
pub mod median;

/// Exponential smoothing for low-latency tracking
pub mod exponential;

use crate::constants::DEFAULT_SMOOTHING_WINDOW;
use crate::depth::WorldPoint;
use crate::{Error, Result};

pub use moving_average::HeadHistory;

/// Trait for all head position filters
pub trait PositionFilter: Send + Sync {
    /// Feed one candidate and return the smoothed position
    fn apply(&mut self, candidate: WorldPoint) -> WorldPoint;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes positions through unchanged
pub struct NoFilter;

impl PositionFilter for NoFilter {
    fn apply(&mut self, candidate: WorldPoint) -> WorldPoint {
        candidate
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

fn parse_window(kind: &str, value: Option<&str>, default: usize) -> Result<usize> {
    let window = match value {
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| Error::FilterError(format!("Invalid {kind} window: {v}")))?,
        None => default,
    };
    if window == 0 {
        return Err(Error::FilterError("Window size must be greater than 0".to_string()));
    }
    Ok(window)
}

/// Create a filter from a spec such as `moving_average`, `moving_average:10`,
/// `median:5`, `exponential:0.4` or `none`
///
/// # Errors
///
/// Returns a `FilterError` for unknown names or invalid parameters
pub fn create_filter(spec: &str) -> Result<Box<dyn PositionFilter>> {
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let param = parts.next().map(str::trim);
    if parts.next().is_some() {
        return Err(Error::FilterError(format!("Too many parameters in filter spec: {spec}")));
    }

    match name.as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter)),
        "moving_average" | "movingaverage" => {
            let window = parse_window("moving average", param, DEFAULT_SMOOTHING_WINDOW)?;
            Ok(Box::new(HeadHistory::new(window)))
        }
        "median" => {
            let window = parse_window("median", param, median::DEFAULT_MEDIAN_WINDOW)?;
            if window % 2 == 0 {
                return Err(Error::FilterError(format!(
                    "Median filter window size must be odd, got {window}"
                )));
            }
            Ok(Box::new(median::MedianFilter::new(window)))
        }
        "exponential" => {
            let alpha = match param {
                Some(v) => v
                    .parse::<f32>()
                    .map_err(|_| Error::FilterError(format!("Invalid exponential alpha: {v}")))?,
                None => exponential::DEFAULT_EXPONENTIAL_ALPHA,
            };
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(Error::FilterError(format!("Alpha must be in (0, 1], got {alpha}")));
            }
            Ok(Box::new(exponential::ExponentialFilter::new(alpha)))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {spec}"))),
    }
}
