//! Procedural depth scene: a head-and-shoulders figure in front of a wall.
//!
//! Used by the demo binary, the benches and the integration tests so the
//! pipeline can run without a device attached.

use super::{CameraIntrinsics, CapturedFrame, DepthClip, DepthFrame, DepthMap, DepthSource, WorldPoint};
use crate::constants::{DEFAULT_FPS, KINECT_HEIGHT, KINECT_WIDTH};
use log::debug;

/// Distance of the back wall from the sensor
pub const WALL_DEPTH_MM: u16 = 3500;

/// Radius of the simulated head
pub const HEAD_RADIUS_MM: f32 = 90.0;

/// How far the shoulders sit behind the face
const SHOULDER_OFFSET_MM: f32 = 80.0;

/// Simulated depth camera looking at a viewer who sways in front of it
pub struct SyntheticScene {
    intrinsics: CameraIntrinsics,
    captured: CapturedFrame,
    head: WorldPoint,
    viewer_present: bool,
    frame_index: u64,
    motion: Option<SwayPath>,
}

/// Lateral sway and forward/back bob of the simulated head
#[derive(Debug, Clone, Copy)]
pub struct SwayPath {
    pub center: WorldPoint,
    pub lateral_amplitude_mm: f32,
    pub depth_amplitude_mm: f32,
    pub period_frames: f32,
}

impl Default for SwayPath {
    #[allow(clippy::cast_possible_truncation)]
    fn default() -> Self {
        Self {
            center: WorldPoint::new(0.0, -60.0, 1100.0),
            lateral_amplitude_mm: 250.0,
            depth_amplitude_mm: 150.0,
            period_frames: (DEFAULT_FPS * 4.0) as f32,
        }
    }
}

impl SwayPath {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position_at(&self, frame_index: u64) -> WorldPoint {
        let phase = std::f32::consts::TAU * frame_index as f32 / self.period_frames;
        WorldPoint::new(
            self.center.x + self.lateral_amplitude_mm * phase.sin(),
            self.center.y,
            self.center.z + self.depth_amplitude_mm * phase.cos(),
        )
    }
}

impl Default for SyntheticScene {
    fn default() -> Self {
        Self::new(KINECT_WIDTH, KINECT_HEIGHT)
    }
}

impl SyntheticScene {
    /// Stationary viewer 1.1 m in front of a `width` x `height` Kinect-like sensor
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let intrinsics = CameraIntrinsics::kinect_for_resolution(width, height);
        Self {
            intrinsics,
            captured: CapturedFrame::empty(width, height, intrinsics, DepthClip::default()),
            head: WorldPoint::new(0.0, -60.0, 1100.0),
            viewer_present: true,
            frame_index: 0,
            motion: None,
        }
    }

    /// Move the head along `path` on every update
    #[must_use]
    pub fn with_motion(mut self, path: SwayPath) -> Self {
        self.head = path.position_at(0);
        self.motion = Some(path);
        self
    }

    /// Place the head (sensor space, millimetres)
    pub fn set_head(&mut self, head: WorldPoint) {
        self.head = head;
    }

    #[must_use]
    pub fn head(&self) -> WorldPoint {
        self.head
    }

    /// Remove or return the viewer; an empty scene shows only the wall
    pub fn set_viewer_present(&mut self, present: bool) {
        self.viewer_present = present;
    }

    #[must_use]
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// Render the current scene into a depth map
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn render(&self) -> DepthMap {
        let width = self.captured.map().width();
        let height = self.captured.map().height();
        let mut millimetres = vec![WALL_DEPTH_MM; width as usize * height as usize];

        if self.viewer_present && self.head.z > 0.0 {
            let (u, v) = self.intrinsics.project(&self.head);
            let radius_px = self.intrinsics.fx * HEAD_RADIUS_MM / self.head.z;
            let shoulder_top = v + radius_px * 0.9;
            let shoulder_half_width = radius_px * 2.4;
            let head_mm = self.head.z.round() as u16;
            let shoulder_mm = (self.head.z + SHOULDER_OFFSET_MM).round() as u16;

            for y in 0..height {
                let fy = y as f32;
                for x in 0..width {
                    let fx = x as f32;
                    let dx = fx - u;
                    let dy = fy - v;
                    let idx = y as usize * width as usize + x as usize;
                    if dx * dx + dy * dy <= radius_px * radius_px {
                        millimetres[idx] = head_mm;
                    } else if fy >= shoulder_top && dx.abs() <= shoulder_half_width {
                        millimetres[idx] = shoulder_mm;
                    }
                }
            }
        }

        DepthMap {
            width,
            height,
            millimetres,
            intrinsics: self.intrinsics,
        }
    }
}

impl DepthSource for SyntheticScene {
    fn update(&mut self) {
        if let Some(path) = self.motion {
            self.head = path.position_at(self.frame_index);
        }
        let map = self.render();
        self.captured.replace(map);
        debug!("Synthetic frame {} with head at {:?}", self.frame_index, self.head);
        self.frame_index += 1;
    }

    fn is_frame_new(&self) -> bool {
        self.captured.is_fresh()
    }

    fn depth_frame(&self) -> &DepthFrame {
        self.captured.frame()
    }

    fn world_coordinate_at(&self, x: u32, y: u32) -> WorldPoint {
        self.captured.map().world_coordinate_at(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::is_no_reading;

    #[test]
    fn test_no_frame_before_update() {
        let scene = SyntheticScene::new(160, 120);
        assert!(!scene.is_frame_new());
    }

    #[test]
    fn test_head_pixel_has_head_depth() {
        let mut scene = SyntheticScene::new(160, 120);
        scene.set_head(WorldPoint::new(0.0, 0.0, 1000.0));
        scene.update();

        let (u, v) = scene.intrinsics().project(&scene.head());
        let p = scene.world_coordinate_at(u.round() as u32, v.round() as u32);
        assert!((p.z - 1000.0).abs() < 1.0);
        assert!(!is_no_reading(&p));
    }

    #[test]
    fn test_empty_scene_is_wall() {
        let mut scene = SyntheticScene::new(64, 48);
        scene.set_viewer_present(false);
        scene.update();
        let wall = DepthClip::default().to_gray(WALL_DEPTH_MM);
        assert!(scene.depth_frame().pixels().iter().all(|&p| p == wall));
    }

    #[test]
    fn test_sway_path_moves_head() {
        let path = SwayPath::default();
        let start = path.position_at(0);
        let quarter = path.position_at((path.period_frames / 4.0) as u64);
        assert!((quarter.x - start.x).abs() > 100.0);
    }
}
