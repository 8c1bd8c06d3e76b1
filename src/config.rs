//! Configuration management for the head tracker

use crate::constants::{
    DEFAULT_BLOB_LEVELS, DEFAULT_DEPTH_FAR_CLIP_MM, DEFAULT_DEPTH_NEAR_CLIP_MM, DEFAULT_FAR_CLIP,
    DEFAULT_FAR_THRESHOLD, DEFAULT_INITIAL_HEAD_Z, DEFAULT_MAX_BLOB_AREA_FRACTION, DEFAULT_MIN_BLOB_AREA,
    DEFAULT_NEAR_CLIP, DEFAULT_NEAR_THRESHOLD, DEFAULT_SCAN_ROW_OFFSET, DEFAULT_SMOOTHING_WINDOW,
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, DEFAULT_Z_CUTOFF_MM, THRESHOLD_MAX, THRESHOLD_MIN,
};
use crate::depth::{CameraIntrinsics, DepthClip, WorldPoint};
use crate::filters::{create_filter, HeadHistory, PositionFilter};
use crate::head_locator::{LocatorSettings, SamplingMode};
use crate::projection::{DisplayPlane, OffAxisCamera};
use crate::segmentation::{SegmentMode, ThresholdBand};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tracker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Depth band segmentation
    pub segmentation: SegmentationConfig,

    /// Blob search parameters
    pub blobs: BlobConfig,

    /// Head position sampling
    pub sampling: SamplingConfig,

    /// Temporal smoothing
    pub smoothing: SmoothingConfig,

    /// Physical display and projection
    pub display: DisplayConfig,

    /// Depth camera model
    pub camera: CameraConfig,
}

/// Depth band parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Brightest depth value counted as foreground (0-255)
    pub near_threshold: i32,

    /// Foreground must be strictly brighter than this (0-255)
    pub far_threshold: i32,

    /// Two masks ANDed, or a single exclusive pass
    pub mode: SegmentMode,
}

/// Blob finder parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    /// Smallest blob area in pixels
    pub min_area: usize,

    /// Largest blob area as a fraction of the frame
    pub max_area_fraction: f32,

    /// Number of blobs kept after sorting by size
    pub max_considered: usize,

    /// Report interior holes as blobs
    pub find_holes: bool,
}

/// Head sampling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Centroid or scan line
    pub mode: SamplingMode,

    /// Rows below the top of the blob where the scan line is taken
    pub scan_row_offset: u32,

    /// Samples at or beyond this depth are rejected
    pub z_cutoff_mm: f32,
}

/// Smoothing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Filter spec, e.g. `moving_average`, `median:5`, `exponential:0.4`, `none`
    pub filter: String,

    /// Window for the moving average when the spec gives none
    pub window: usize,
}

/// Display geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Physical width of the tracked window
    pub width: f32,

    /// Physical height of the tracked window
    pub height: f32,

    /// Near clip distance of the projection
    pub near_clip: f32,

    /// Far clip distance of the projection
    pub far_clip: f32,

    /// Head distance assumed before the first detection
    pub initial_head_z: f32,
}

/// Depth camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Pinhole intrinsics of the depth sensor
    pub intrinsics: CameraIntrinsics,

    /// Reading mapped to depth value 255
    pub depth_near_clip_mm: u16,

    /// Reading mapped to depth value 1
    pub depth_far_clip_mm: u16,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            near_threshold: DEFAULT_NEAR_THRESHOLD,
            far_threshold: DEFAULT_FAR_THRESHOLD,
            mode: SegmentMode::default(),
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_BLOB_AREA,
            max_area_fraction: DEFAULT_MAX_BLOB_AREA_FRACTION,
            max_considered: DEFAULT_BLOB_LEVELS,
            find_holes: true,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            mode: SamplingMode::default(),
            scan_row_offset: DEFAULT_SCAN_ROW_OFFSET,
            z_cutoff_mm: DEFAULT_Z_CUTOFF_MM,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: "moving_average".to_string(),
            window: DEFAULT_SMOOTHING_WINDOW,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            near_clip: DEFAULT_NEAR_CLIP,
            far_clip: DEFAULT_FAR_CLIP,
            initial_head_z: DEFAULT_INITIAL_HEAD_Z,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            intrinsics: CameraIntrinsics::default(),
            depth_near_clip_mm: DEFAULT_DEPTH_NEAR_CLIP_MM,
            depth_far_clip_mm: DEFAULT_DEPTH_FAR_CLIP_MM,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the text is not a valid configuration
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Serialize to YAML text
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if serialization fails
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_yaml_string()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create the smoothing filter from configuration
    ///
    /// # Errors
    ///
    /// Returns a `FilterError` for an unknown or malformed filter spec
    pub fn create_filter(&self) -> Result<Box<dyn PositionFilter>> {
        match self.smoothing.filter.as_str() {
            "moving_average" => {
                if self.smoothing.window == 0 {
                    return Err(Error::FilterError("Window size must be greater than 0".to_string()));
                }
                Ok(Box::new(HeadHistory::new(self.smoothing.window)))
            }
            spec => create_filter(spec),
        }
    }

    /// Initial depth band
    #[must_use]
    pub fn threshold_band(&self) -> ThresholdBand {
        ThresholdBand::new(self.segmentation.near_threshold, self.segmentation.far_threshold)
    }

    #[must_use]
    pub fn locator_settings(&self) -> LocatorSettings {
        LocatorSettings {
            min_area: self.blobs.min_area,
            max_area_fraction: self.blobs.max_area_fraction,
            max_considered: self.blobs.max_considered,
            find_holes: self.blobs.find_holes,
            mode: self.sampling.mode,
            scan_row_offset: self.sampling.scan_row_offset,
            z_cutoff_mm: self.sampling.z_cutoff_mm,
        }
    }

    /// Off-axis camera for the configured display
    ///
    /// # Errors
    ///
    /// Returns an error if the display size or clip planes are invalid
    pub fn camera(&self) -> Result<OffAxisCamera> {
        if !(self.display.width > 0.0 && self.display.height > 0.0) {
            return Err(Error::ConfigError("Display width and height must be positive".to_string()));
        }
        let plane = DisplayPlane::from_size(self.display.width, self.display.height);
        OffAxisCamera::new(plane, self.display.near_clip, self.display.far_clip)
    }

    /// Intrinsics for a `width` x `height` depth stream. Untouched Kinect
    /// defaults are rescaled to the stream; configured values are used as is.
    #[must_use]
    pub fn intrinsics_for_resolution(&self, width: u32, height: u32) -> CameraIntrinsics {
        if self.camera.intrinsics == CameraIntrinsics::default() {
            CameraIntrinsics::kinect_for_resolution(width, height)
        } else {
            self.camera.intrinsics
        }
    }

    #[must_use]
    pub fn depth_clip(&self) -> DepthClip {
        DepthClip {
            near_mm: self.camera.depth_near_clip_mm,
            far_mm: self.camera.depth_far_clip_mm,
        }
    }

    /// Head position reported before the first detection
    #[must_use]
    pub fn initial_head(&self) -> WorldPoint {
        WorldPoint::new(0.0, 0.0, self.display.initial_head_z)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let thresholds = THRESHOLD_MIN..=THRESHOLD_MAX;
        if !thresholds.contains(&self.segmentation.near_threshold)
            || !thresholds.contains(&self.segmentation.far_threshold)
        {
            return Err(Error::ConfigError("Thresholds must be between 0 and 255".to_string()));
        }

        if self.blobs.min_area == 0 {
            return Err(Error::ConfigError("Minimum blob area must be greater than 0".to_string()));
        }
        if !(self.blobs.max_area_fraction > 0.0 && self.blobs.max_area_fraction <= 1.0) {
            return Err(Error::ConfigError(
                "Maximum blob area fraction must be in (0, 1]".to_string(),
            ));
        }
        if self.blobs.max_considered == 0 {
            return Err(Error::ConfigError("At least one blob must be considered".to_string()));
        }

        if !(self.sampling.z_cutoff_mm > 0.0) {
            return Err(Error::ConfigError("Z cutoff must be positive".to_string()));
        }

        self.create_filter()
            .map_err(|e| Error::ConfigError(format!("Invalid smoothing filter: {e}")))?;

        self.camera()
            .map_err(|e| Error::ConfigError(format!("Invalid display: {e}")))?;
        if !(self.display.initial_head_z.is_finite()) {
            return Err(Error::ConfigError("Initial head distance must be finite".to_string()));
        }

        if self.camera.depth_near_clip_mm >= self.camera.depth_far_clip_mm {
            return Err(Error::ConfigError(
                "Depth near clip must be closer than depth far clip".to_string(),
            ));
        }
        let k = &self.camera.intrinsics;
        if !(k.fx > 0.0 && k.fy > 0.0) {
            return Err(Error::ConfigError("Focal lengths must be positive".to_string()));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Fish-tank head tracking configuration

# Depth band (8-bit depth image, near is bright)
segmentation:
  near_threshold: 255
  far_threshold: 132
  mode: masks

# Blob search
blobs:
  min_area: 50
  max_area_fraction: 0.5
  max_considered: 1
  find_holes: true

# Head sampling (centroid or scan_line)
sampling:
  mode: scan_line
  scan_row_offset: 50
  z_cutoff_mm: 3000.0

# Smoothing (moving_average, median:N, exponential:A, none)
smoothing:
  filter: "moving_average"
  window: 10

# Physical display, same units as tracked positions
display:
  width: 300.0
  height: 200.0
  near_clip: 1.0
  far_clip: 10000.0
  initial_head_z: 500.0

# Depth camera (Kinect at 640x480)
camera:
  intrinsics:
    fx: 594.21
    fy: 591.04
    cx: 339.5
    cy: 242.7
  depth_near_clip_mm: 500
  depth_far_clip_mm: 4000
"#;
