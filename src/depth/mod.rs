//! Depth frames, depth sources and the pixel-to-world mapping.
//!
//! A [`DepthSource`] is polled once per tick. It exposes an 8-bit depth image
//! (near is bright, 0 means no return) for segmentation, and a pixel-to-world
//! query that answers in millimetres, sensor-centred.

pub mod raw;
pub mod synthetic;

use crate::constants::{
    DEFAULT_DEPTH_FAR_CLIP_MM, DEFAULT_DEPTH_NEAR_CLIP_MM, KINECT_CX, KINECT_CY, KINECT_FX, KINECT_FY,
    KINECT_HEIGHT, KINECT_WIDTH,
};
use crate::{Error, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A 3D position in millimetres, sensor space
pub type WorldPoint = Point3<f32>;

/// The "no reading" sentinel returned for pixels without valid depth
#[must_use]
pub fn no_reading() -> WorldPoint {
    WorldPoint::origin()
}

/// True if `point` is exactly the zero sentinel
#[must_use]
pub fn is_no_reading(point: &WorldPoint) -> bool {
    point.x == 0.0 && point.y == 0.0 && point.z == 0.0
}

/// Grayscale depth image, one byte per pixel, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DepthFrame {
    /// Wrap a pixel buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length does not match `width * height`
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::DepthSource(format!(
                "Depth frame of {width}x{height} needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Frame with every pixel set to `value`
    #[must_use]
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            pixels: vec![value; width as usize * height as usize],
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Sample at `(x, y)`, or `None` outside the frame
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }
}

/// Producer of depth frames, polled once per tracking tick
pub trait DepthSource {
    /// Poll the device; may make a new frame available
    fn update(&mut self);

    /// Whether the last `update` delivered a frame not yet seen
    fn is_frame_new(&self) -> bool;

    /// Current 8-bit depth image
    fn depth_frame(&self) -> &DepthFrame;

    /// World coordinate of a pixel, or the zero sentinel when depth is invalid
    fn world_coordinate_at(&self, x: u32, y: u32) -> WorldPoint;

    fn width(&self) -> u32 {
        self.depth_frame().width()
    }

    fn height(&self) -> u32 {
        self.depth_frame().height()
    }
}

/// Pinhole intrinsics of the depth camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f32,
    pub fy: f32,
    pub cx: f32,
    pub cy: f32,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self {
            fx: KINECT_FX,
            fy: KINECT_FY,
            cx: KINECT_CX,
            cy: KINECT_CY,
        }
    }
}

impl CameraIntrinsics {
    /// Kinect intrinsics rescaled from the 640x480 base resolution
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn kinect_for_resolution(width: u32, height: u32) -> Self {
        let sx = width as f32 / KINECT_WIDTH as f32;
        let sy = height as f32 / KINECT_HEIGHT as f32;
        let base = Self::default();
        Self {
            fx: base.fx * sx,
            fy: base.fy * sy,
            cx: base.cx * sx,
            cy: base.cy * sy,
        }
    }

    /// Back-project pixel `(x, y)` at depth `z_mm`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn unproject(&self, x: u32, y: u32, z_mm: f32) -> WorldPoint {
        WorldPoint::new(
            (x as f32 - self.cx) * z_mm / self.fx,
            (y as f32 - self.cy) * z_mm / self.fy,
            z_mm,
        )
    }

    /// Project a sensor-space point onto the image plane
    #[must_use]
    pub fn project(&self, point: &WorldPoint) -> (f32, f32) {
        (
            self.cx + self.fx * point.x / point.z,
            self.cy + self.fy * point.y / point.z,
        )
    }
}

/// Millimetre range mapped onto the 8-bit depth image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthClip {
    pub near_mm: u16,
    pub far_mm: u16,
}

impl Default for DepthClip {
    fn default() -> Self {
        Self {
            near_mm: DEFAULT_DEPTH_NEAR_CLIP_MM,
            far_mm: DEFAULT_DEPTH_FAR_CLIP_MM,
        }
    }
}

impl DepthClip {
    /// Map a millimetre reading to a byte: near clip is 255, far clip is 1,
    /// anything outside the range or without a return is 0
    #[must_use]
    pub fn to_gray(&self, depth_mm: u16) -> u8 {
        if depth_mm == 0 || depth_mm < self.near_mm || depth_mm > self.far_mm {
            return 0;
        }
        let span = u32::from(self.far_mm.saturating_sub(self.near_mm).max(1));
        let offset = u32::from(depth_mm - self.near_mm);
        let value = 255 - offset * 254 / span;
        u8::try_from(value).unwrap_or(u8::MAX)
    }
}

/// Millimetre depth image with the intrinsics needed to unproject it
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    width: u32,
    height: u32,
    millimetres: Vec<u16>,
    intrinsics: CameraIntrinsics,
}

impl DepthMap {
    /// # Errors
    ///
    /// Returns an error if the buffer length does not match `width * height`
    pub fn new(width: u32, height: u32, millimetres: Vec<u16>, intrinsics: CameraIntrinsics) -> Result<Self> {
        let expected = width as usize * height as usize;
        if millimetres.len() != expected {
            return Err(Error::DepthSource(format!(
                "Depth map of {width}x{height} needs {expected} samples, got {}",
                millimetres.len()
            )));
        }
        Ok(Self {
            width,
            height,
            millimetres,
            intrinsics,
        })
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Raw reading at `(x, y)`; 0 outside the map
    #[must_use]
    pub fn depth_mm_at(&self, x: u32, y: u32) -> u16 {
        if x < self.width && y < self.height {
            self.millimetres[y as usize * self.width as usize + x as usize]
        } else {
            0
        }
    }

    /// Render the 8-bit depth image used for segmentation
    #[must_use]
    pub fn to_depth_frame(&self, clip: &DepthClip) -> DepthFrame {
        DepthFrame {
            width: self.width,
            height: self.height,
            pixels: self.millimetres.iter().map(|&mm| clip.to_gray(mm)).collect(),
        }
    }

    /// World coordinate at `(x, y)`, or the zero sentinel
    #[must_use]
    pub fn world_coordinate_at(&self, x: u32, y: u32) -> WorldPoint {
        match self.depth_mm_at(x, y) {
            0 => no_reading(),
            mm => self.intrinsics.unproject(x, y, f32::from(mm)),
        }
    }
}

/// A depth map together with its rendered depth image and freshness flag.
/// Shared by the concrete sources in this module.
#[derive(Debug, Clone)]
pub(crate) struct CapturedFrame {
    map: DepthMap,
    frame: DepthFrame,
    clip: DepthClip,
    fresh: bool,
}

impl CapturedFrame {
    pub(crate) fn empty(width: u32, height: u32, intrinsics: CameraIntrinsics, clip: DepthClip) -> Self {
        let map = DepthMap {
            width,
            height,
            millimetres: vec![0; width as usize * height as usize],
            intrinsics,
        };
        let frame = map.to_depth_frame(&clip);
        Self {
            map,
            frame,
            clip,
            fresh: false,
        }
    }

    pub(crate) fn replace(&mut self, map: DepthMap) {
        self.frame = map.to_depth_frame(&self.clip);
        self.map = map;
        self.fresh = true;
    }

    pub(crate) fn mark_stale(&mut self) {
        self.fresh = false;
    }

    pub(crate) fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub(crate) fn map(&self) -> &DepthMap {
        &self.map
    }

    pub(crate) fn frame(&self) -> &DepthFrame {
        &self.frame
    }
}
