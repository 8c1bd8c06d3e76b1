//! Per-frame tracking loop: segment, locate, smooth, project.
//!
//! One [`HeadTracker::tick`] runs the stages strictly in order. Every failure
//! inside a tick is absorbed: the tracked head simply keeps its last value.

use crate::blob::{BlobFinder, ContourFinder};
use crate::config::Config;
use crate::depth::{DepthSource, WorldPoint};
use crate::filters::PositionFilter;
use crate::head_locator::{HeadLocator, SamplingMode};
use crate::projection::{OffAxisCamera, OffAxisProjection};
use crate::segmentation::{segment, SegmentMode, ThresholdBand};
use crate::Result;
use log::{debug, info};
use std::fmt;

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The depth source had nothing new; nothing ran
    NoNewFrame,
    /// No usable blob or no valid depth on it; the head was kept
    NoBlobDetected,
    /// The head moved to `head` after smoothing `candidate`
    Tracked { candidate: WorldPoint, head: WorldPoint },
}

/// Mutable state threaded through the stages
pub struct TrackingState {
    pub band: ThresholdBand,
    pub segment_mode: SegmentMode,
    filter: Box<dyn PositionFilter>,
    head: WorldPoint,
    detections: u64,
}

impl TrackingState {
    pub fn new(band: ThresholdBand, filter: Box<dyn PositionFilter>, initial_head: WorldPoint) -> Self {
        Self {
            band,
            segment_mode: SegmentMode::default(),
            filter,
            head: initial_head,
            detections: 0,
        }
    }

    /// Current smoothed head position
    #[must_use]
    pub fn head(&self) -> WorldPoint {
        self.head
    }

    /// Number of ticks that updated the head
    #[must_use]
    pub fn detections(&self) -> u64 {
        self.detections
    }

    #[must_use]
    pub fn filter_name(&self) -> &str {
        self.filter.name()
    }

    fn accept(&mut self, candidate: WorldPoint) -> WorldPoint {
        self.head = self.filter.apply(candidate);
        self.detections += 1;
        self.head
    }

    /// Forget the smoothing history; the head position itself is kept
    pub fn reset_smoothing(&mut self) {
        self.filter.reset();
    }
}

/// Operator adjustments, bound to keys the way the tuning UI expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerCommand {
    NearUp,
    NearDown,
    FarUp,
    FarDown,
    ToggleSegmentMode,
    ToggleSampling,
    ResetSmoothing,
}

impl TrackerCommand {
    /// Map a key press to a command
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            '+' | '=' => Some(Self::NearUp),
            '-' => Some(Self::NearDown),
            '>' | '.' => Some(Self::FarUp),
            '<' | ',' => Some(Self::FarDown),
            ' ' => Some(Self::ToggleSegmentMode),
            'm' => Some(Self::ToggleSampling),
            'r' => Some(Self::ResetSmoothing),
            _ => None,
        }
    }
}

/// Snapshot of the tunables for status display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerStatus {
    pub near_threshold: i32,
    pub far_threshold: i32,
    pub segment_mode: SegmentMode,
    pub sampling_mode: SamplingMode,
    pub blobs_found: usize,
    pub head: WorldPoint,
}

impl fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "near threshold {} far threshold {} ({:?}, {:?}) blobs {} head ({:.1}, {:.1}, {:.1})",
            self.near_threshold,
            self.far_threshold,
            self.segment_mode,
            self.sampling_mode,
            self.blobs_found,
            self.head.x,
            self.head.y,
            self.head.z
        )
    }
}

/// The full tracking pipeline
pub struct HeadTracker<F: BlobFinder = ContourFinder> {
    state: TrackingState,
    locator: HeadLocator<F>,
    camera: OffAxisCamera,
}

impl HeadTracker<ContourFinder> {
    /// Build a tracker from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let state = TrackingState {
            segment_mode: config.segmentation.mode,
            ..TrackingState::new(config.threshold_band(), config.create_filter()?, config.initial_head())
        };
        let locator = HeadLocator::new(ContourFinder::new(), config.locator_settings());
        let tracker = Self::new(state, locator, config.camera()?);
        info!(
            "Head tracker ready: {:?} sampling, {} smoothing",
            tracker.locator.settings().mode,
            tracker.state.filter_name()
        );
        Ok(tracker)
    }
}

impl<F: BlobFinder> HeadTracker<F> {
    pub fn new(state: TrackingState, locator: HeadLocator<F>, camera: OffAxisCamera) -> Self {
        Self { state, locator, camera }
    }

    #[must_use]
    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TrackingState {
        &mut self.state
    }

    /// Current smoothed head position
    #[must_use]
    pub fn head(&self) -> WorldPoint {
        self.state.head()
    }

    /// Poll `source` and run one tracking cycle
    pub fn tick<S: DepthSource + ?Sized>(&mut self, source: &mut S) -> TickOutcome {
        source.update();
        if !source.is_frame_new() {
            return TickOutcome::NoNewFrame;
        }

        let mask = segment(source.depth_frame(), &self.state.band, self.state.segment_mode);
        let Some(candidate) = self.locator.locate(&mask, &*source) else {
            debug!("No head this frame ({} blobs)", self.locator.last_blob_count());
            return TickOutcome::NoBlobDetected;
        };

        let head = self.state.accept(candidate);
        debug!("Head candidate {:?} smoothed to {:?}", candidate, head);
        TickOutcome::Tracked { candidate, head }
    }

    /// View and projection for the current head position
    #[must_use]
    pub fn projection(&self) -> OffAxisProjection {
        self.camera.build(&self.state.head)
    }

    /// Apply an operator command
    pub fn apply(&mut self, command: TrackerCommand) {
        match command {
            TrackerCommand::NearUp => self.state.band.adjust_near(1),
            TrackerCommand::NearDown => self.state.band.adjust_near(-1),
            TrackerCommand::FarUp => self.state.band.adjust_far(1),
            TrackerCommand::FarDown => self.state.band.adjust_far(-1),
            TrackerCommand::ToggleSegmentMode => {
                self.state.segment_mode = self.state.segment_mode.toggled();
            }
            TrackerCommand::ToggleSampling => {
                let mode = self.locator.settings().mode.toggled();
                self.locator.set_mode(mode);
            }
            TrackerCommand::ResetSmoothing => self.state.reset_smoothing(),
        }
        info!("{:?}: {}", command, self.status());
    }

    #[must_use]
    pub fn status(&self) -> TrackerStatus {
        TrackerStatus {
            near_threshold: self.state.band.near(),
            far_threshold: self.state.band.far(),
            segment_mode: self.state.segment_mode,
            sampling_mode: self.locator.settings().mode,
            blobs_found: self.locator.last_blob_count(),
            head: self.state.head(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::synthetic::SyntheticScene;

    fn tracker() -> HeadTracker {
        HeadTracker::from_config(&Config::default()).unwrap()
    }

    #[test]
    fn test_initial_head() {
        assert_eq!(tracker().head(), WorldPoint::new(0.0, 0.0, 500.0));
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(TrackerCommand::from_key('='), Some(TrackerCommand::NearUp));
        assert_eq!(TrackerCommand::from_key(','), Some(TrackerCommand::FarDown));
        assert_eq!(TrackerCommand::from_key(' '), Some(TrackerCommand::ToggleSegmentMode));
        assert_eq!(TrackerCommand::from_key('x'), None);
    }

    #[test]
    fn test_commands_adjust_band() {
        let mut tracker = tracker();
        tracker.apply(TrackerCommand::NearUp);
        assert_eq!(tracker.status().near_threshold, 255);
        tracker.apply(TrackerCommand::NearDown);
        assert_eq!(tracker.status().near_threshold, 254);
        tracker.apply(TrackerCommand::FarUp);
        assert_eq!(tracker.status().far_threshold, 133);
        tracker.apply(TrackerCommand::ToggleSampling);
        assert_eq!(tracker.status().sampling_mode, SamplingMode::Centroid);
        tracker.apply(TrackerCommand::ToggleSegmentMode);
        assert_eq!(tracker.status().segment_mode, SegmentMode::Exclusive);
    }

    #[test]
    fn test_tracks_synthetic_viewer() {
        let mut tracker = tracker();
        let mut scene = SyntheticScene::new(320, 240);
        scene.set_head(WorldPoint::new(100.0, -50.0, 1000.0));

        let outcome = tracker.tick(&mut scene);
        let TickOutcome::Tracked { head, .. } = outcome else {
            panic!("expected a detection, got {outcome:?}");
        };
        // Mirrored X, depth close to the head surface
        assert!(head.x < 0.0);
        assert!((head.z - 1000.0).abs() < 100.0);
        assert_eq!(tracker.state().detections(), 1);
    }

    #[test]
    fn test_status_display() {
        let text = tracker().status().to_string();
        assert!(text.contains("near threshold 255"));
        assert!(text.contains("far threshold 132"));
    }
}
