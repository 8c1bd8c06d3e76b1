//! Dual-threshold depth segmentation.
//!
//! The depth image is bright for near objects. Two masks are built and ANDed:
//! an inverted threshold at `near` keeps `v <= near`, a plain threshold at
//! `far` keeps `v > far`. The result is the slice `far < v <= near`, so a zero
//! sample (no return) is never foreground.

use crate::constants::{DEFAULT_FAR_THRESHOLD, DEFAULT_NEAR_THRESHOLD, THRESHOLD_MAX, THRESHOLD_MIN};
use crate::depth::DepthFrame;
use serde::{Deserialize, Serialize};

/// Foreground depth window, both bounds always within [0, 255]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdBand {
    near: i32,
    far: i32,
}

impl Default for ThresholdBand {
    fn default() -> Self {
        Self {
            near: DEFAULT_NEAR_THRESHOLD,
            far: DEFAULT_FAR_THRESHOLD,
        }
    }
}

impl ThresholdBand {
    /// Build a band, clamping both bounds
    #[must_use]
    pub fn new(near: i32, far: i32) -> Self {
        Self {
            near: clamp_threshold(near),
            far: clamp_threshold(far),
        }
    }

    #[must_use]
    pub fn near(&self) -> i32 {
        self.near
    }

    #[must_use]
    pub fn far(&self) -> i32 {
        self.far
    }

    pub fn set_near(&mut self, value: i32) {
        self.near = clamp_threshold(value);
    }

    pub fn set_far(&mut self, value: i32) {
        self.far = clamp_threshold(value);
    }

    pub fn adjust_near(&mut self, delta: i32) {
        self.set_near(self.near.saturating_add(delta));
    }

    pub fn adjust_far(&mut self, delta: i32) {
        self.set_far(self.far.saturating_add(delta));
    }
}

fn clamp_threshold(value: i32) -> i32 {
    value.clamp(THRESHOLD_MIN, THRESHOLD_MAX)
}

/// How the band is applied to the depth image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentMode {
    /// Two threshold masks ANDed together: `far < v <= near`
    #[default]
    Masks,
    /// Single pass over the pixels with an open window: `far < v < near`
    Exclusive,
}

impl SegmentMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Masks => Self::Exclusive,
            Self::Exclusive => Self::Masks,
        }
    }
}

/// Foreground mask, row-major, same geometry as the source frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BinaryMask {
    /// Mask with nothing set
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// Build a mask from a predicate over pixel coordinates
    #[must_use]
    pub fn from_fn<F: Fn(u32, u32) -> bool>(width: u32, height: u32, f: F) -> Self {
        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(f(x, y));
            }
        }
        Self { width, height, bits }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Foreground test; `false` outside the mask
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[y as usize * self.width as usize + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            self.bits[y as usize * self.width as usize + x as usize] = value;
        }
    }

    #[must_use]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Pixel-wise AND of two masks of equal size
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        debug_assert_eq!((self.width, self.height), (other.width, other.height));
        Self {
            width: self.width,
            height: self.height,
            bits: self.bits.iter().zip(&other.bits).map(|(&a, &b)| a && b).collect(),
        }
    }
}

/// Binary threshold: foreground where `v > level`, or `v <= level` when inverted
#[must_use]
pub fn threshold(frame: &DepthFrame, level: i32, invert: bool) -> BinaryMask {
    BinaryMask {
        width: frame.width(),
        height: frame.height(),
        bits: frame
            .pixels()
            .iter()
            .map(|&v| (i32::from(v) > level) != invert)
            .collect(),
    }
}

/// Segment `frame` into a foreground mask using `band`
#[must_use]
pub fn segment(frame: &DepthFrame, band: &ThresholdBand, mode: SegmentMode) -> BinaryMask {
    match mode {
        SegmentMode::Masks => {
            let near_mask = threshold(frame, band.near(), true);
            let far_mask = threshold(frame, band.far(), false);
            near_mask.and(&far_mask)
        }
        SegmentMode::Exclusive => BinaryMask {
            width: frame.width(),
            height: frame.height(),
            bits: frame
                .pixels()
                .iter()
                .map(|&v| {
                    let v = i32::from(v);
                    v < band.near() && v > band.far()
                })
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp() -> DepthFrame {
        DepthFrame::new(256, 1, (0..=255u8).collect()).unwrap()
    }

    #[test]
    fn test_default_band() {
        let band = ThresholdBand::default();
        assert_eq!(band.near(), 255);
        assert_eq!(band.far(), 132);
    }

    #[test]
    fn test_new_clamps() {
        let band = ThresholdBand::new(400, -3);
        assert_eq!(band.near(), 255);
        assert_eq!(band.far(), 0);
    }

    #[test]
    fn test_masks_window() {
        let band = ThresholdBand::new(200, 100);
        let mask = segment(&ramp(), &band, SegmentMode::Masks);
        assert!(!mask.get(100, 0));
        assert!(mask.get(101, 0));
        assert!(mask.get(200, 0));
        assert!(!mask.get(201, 0));
        assert_eq!(mask.count(), 100);
    }

    #[test]
    fn test_exclusive_window() {
        let band = ThresholdBand::new(200, 100);
        let mask = segment(&ramp(), &band, SegmentMode::Exclusive);
        assert!(mask.get(101, 0));
        assert!(!mask.get(200, 0));
        assert_eq!(mask.count(), 99);
    }

    #[test]
    fn test_invalid_pixels_never_foreground() {
        let frame = DepthFrame::filled(4, 4, 0);
        let band = ThresholdBand::new(255, 0);
        assert_eq!(segment(&frame, &band, SegmentMode::Masks).count(), 0);
        assert_eq!(segment(&frame, &band, SegmentMode::Exclusive).count(), 0);
    }

    #[test]
    fn test_source_frame_unchanged() {
        let frame = ramp();
        let copy = frame.clone();
        let _ = segment(&frame, &ThresholdBand::default(), SegmentMode::Masks);
        assert_eq!(frame, copy);
    }

    #[test]
    fn test_toggle_mode() {
        assert_eq!(SegmentMode::Masks.toggled(), SegmentMode::Exclusive);
        assert_eq!(SegmentMode::Exclusive.toggled(), SegmentMode::Masks);
    }

    proptest! {
        #[test]
        fn prop_thresholds_stay_clamped(steps in prop::collection::vec((any::<bool>(), -300i32..300), 0..200)) {
            let mut band = ThresholdBand::default();
            for (near, delta) in steps {
                if near {
                    band.adjust_near(delta);
                } else {
                    band.adjust_far(delta);
                }
                prop_assert!((0..=255).contains(&band.near()));
                prop_assert!((0..=255).contains(&band.far()));
            }
        }

        #[test]
        fn prop_unit_steps_stay_clamped(steps in prop::collection::vec(0u8..4, 0..600)) {
            let mut band = ThresholdBand::default();
            for step in steps {
                match step {
                    0 => band.adjust_near(1),
                    1 => band.adjust_near(-1),
                    2 => band.adjust_far(1),
                    _ => band.adjust_far(-1),
                }
            }
            prop_assert!((0..=255).contains(&band.near()));
            prop_assert!((0..=255).contains(&band.far()));
        }
    }
}
