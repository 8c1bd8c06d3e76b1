//! Off-axis perspective projection for a fixed planar display.
//!
//! The display is a physical rectangle described by three corners in the same
//! space as the tracked eye. For every eye position the frustum is rebuilt so
//! its near-plane window passes exactly through the display edges. The camera
//! always faces along the display normal; only the frustum skews as the eye
//! moves, which is what produces correct motion parallax.

use crate::constants::{
    DEFAULT_FAR_CLIP, DEFAULT_NEAR_CLIP, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, DEGENERATE_DISTANCE_EPSILON,
};
use crate::depth::WorldPoint;
use crate::{Error, Result};
use log::debug;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Largest |cos| between the display edges still accepted as a right angle
const RIGHT_ANGLE_TOLERANCE: f32 = 1e-3;

/// Corners of the physical display surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPlane {
    top_left: Point3<f32>,
    bottom_left: Point3<f32>,
    bottom_right: Point3<f32>,
}

/// Orthonormal frame of a display plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneBasis {
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    /// Points out of the display towards the viewer
    pub normal: Vector3<f32>,
}

impl Default for DisplayPlane {
    fn default() -> Self {
        Self::from_size(DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT)
    }
}

impl DisplayPlane {
    /// Plane from explicit corners
    ///
    /// # Errors
    ///
    /// Returns an error if the corners are not finite or do not span a rectangle
    pub fn new(top_left: Point3<f32>, bottom_left: Point3<f32>, bottom_right: Point3<f32>) -> Result<Self> {
        let finite = [top_left, bottom_left, bottom_right]
            .iter()
            .all(|p| p.coords.iter().all(|c| c.is_finite()));
        if !finite {
            return Err(Error::InvalidInput("Display corners must be finite".to_string()));
        }
        let across = bottom_right - bottom_left;
        let upward = top_left - bottom_left;
        if across.norm() <= f32::EPSILON || upward.norm() <= f32::EPSILON {
            return Err(Error::InvalidInput("Display plane has a zero-length edge".to_string()));
        }
        if across.normalize().cross(&upward.normalize()).norm() <= 1e-6 {
            return Err(Error::InvalidInput("Display plane edges are parallel".to_string()));
        }
        let skew = across.normalize().dot(&upward.normalize());
        if skew.abs() > RIGHT_ANGLE_TOLERANCE {
            return Err(Error::InvalidInput(format!(
                "Display plane edges are not perpendicular (cosine {skew})"
            )));
        }
        Ok(Self {
            top_left,
            bottom_left,
            bottom_right,
        })
    }

    /// A `width` x `height` display centred on the origin in the z = 0 plane,
    /// facing +z
    #[must_use]
    pub fn from_size(width: f32, height: f32) -> Self {
        let (hw, hh) = (width / 2.0, height / 2.0);
        Self {
            top_left: Point3::new(-hw, hh, 0.0),
            bottom_left: Point3::new(-hw, -hh, 0.0),
            bottom_right: Point3::new(hw, -hh, 0.0),
        }
    }

    #[must_use]
    pub fn top_left(&self) -> Point3<f32> {
        self.top_left
    }

    #[must_use]
    pub fn bottom_left(&self) -> Point3<f32> {
        self.bottom_left
    }

    #[must_use]
    pub fn bottom_right(&self) -> Point3<f32> {
        self.bottom_right
    }

    /// The implied fourth corner
    #[must_use]
    pub fn top_right(&self) -> Point3<f32> {
        self.bottom_right + (self.top_left - self.bottom_left)
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        (self.bottom_right - self.bottom_left).norm()
    }

    #[must_use]
    pub fn height(&self) -> f32 {
        (self.top_left - self.bottom_left).norm()
    }

    #[must_use]
    pub fn center(&self) -> Point3<f32> {
        self.bottom_left + ((self.bottom_right - self.bottom_left) + (self.top_left - self.bottom_left)) * 0.5
    }

    #[must_use]
    pub fn basis(&self) -> PlaneBasis {
        let right = (self.bottom_right - self.bottom_left).normalize();
        let up = (self.top_left - self.bottom_left).normalize();
        let normal = right.cross(&up).normalize();
        PlaneBasis { right, up, normal }
    }
}

/// Asymmetric view volume in the `glFrustum` sense
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Frustum {
    /// OpenGL-style perspective matrix for this frustum
    #[must_use]
    #[rustfmt::skip]
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let Self { left: l, right: r, bottom: b, top: t, near: n, far: f } = *self;
        Matrix4::new(
            2.0 * n / (r - l), 0.0,               (r + l) / (r - l),  0.0,
            0.0,               2.0 * n / (t - b), (t + b) / (t - b),  0.0,
            0.0,               0.0,               -(f + n) / (f - n), -2.0 * f * n / (f - n),
            0.0,               0.0,               -1.0,               0.0,
        )
    }

    /// Whether the frustum is centred on its axis within `tolerance`
    #[must_use]
    pub fn is_symmetric(&self, tolerance: f32) -> bool {
        (self.left + self.right).abs() <= tolerance && (self.bottom + self.top).abs() <= tolerance
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        [self.left, self.right, self.bottom, self.top, self.near, self.far]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// View and projection for one eye position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffAxisProjection {
    /// World to eye transform: camera at the eye, looking along -normal
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub frustum: Frustum,
    /// Perpendicular eye-to-plane distance actually used
    pub distance: f32,
    /// True when the real distance was below epsilon and got clamped
    pub clamped: bool,
}

impl OffAxisProjection {
    /// Combined `projection * view`
    #[must_use]
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    /// Normalised device coordinates of a world point
    #[must_use]
    pub fn project(&self, point: &Point3<f32>) -> Point3<f32> {
        let clip = self.view_projection() * Vector4::new(point.x, point.y, point.z, 1.0);
        Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }
}

/// Derive the off-axis frustum and view transform for `eye` looking at `plane`.
///
/// If the eye is on (or behind) the display plane the perpendicular distance
/// is clamped to [`DEGENERATE_DISTANCE_EPSILON`], so the result stays finite.
#[must_use]
pub fn build_frustum(eye: &WorldPoint, plane: &DisplayPlane, near: f32, far: f32) -> OffAxisProjection {
    let PlaneBasis { right, up, normal } = plane.basis();

    let va = plane.bottom_left - *eye;
    let vb = plane.bottom_right - *eye;
    let vc = plane.top_left - *eye;

    let raw_distance = -va.dot(&normal);
    // Also catches NaN
    let clamped = !(raw_distance >= DEGENERATE_DISTANCE_EPSILON);
    let distance = if clamped {
        debug!("Eye-to-display distance {raw_distance} clamped to {DEGENERATE_DISTANCE_EPSILON}");
        DEGENERATE_DISTANCE_EPSILON
    } else {
        raw_distance
    };

    let scale = near / distance;
    let frustum = Frustum {
        left: right.dot(&va) * scale,
        right: right.dot(&vb) * scale,
        bottom: up.dot(&va) * scale,
        top: up.dot(&vc) * scale,
        near,
        far,
    };

    #[rustfmt::skip]
    let rotation = Matrix4::new(
        right.x,  right.y,  right.z,  0.0,
        up.x,     up.y,     up.z,     0.0,
        normal.x, normal.y, normal.z, 0.0,
        0.0,      0.0,      0.0,      1.0,
    );
    let view = rotation * Matrix4::new_translation(&(-eye.coords));

    OffAxisProjection {
        view,
        projection: frustum.to_matrix(),
        frustum,
        distance,
        clamped,
    }
}

/// A display plane with clip distances, ready to build projections
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffAxisCamera {
    plane: DisplayPlane,
    near: f32,
    far: f32,
}

impl Default for OffAxisCamera {
    fn default() -> Self {
        Self {
            plane: DisplayPlane::default(),
            near: DEFAULT_NEAR_CLIP,
            far: DEFAULT_FAR_CLIP,
        }
    }
}

impl OffAxisCamera {
    /// # Errors
    ///
    /// Returns an error unless `0 < near < far` and both are finite
    pub fn new(plane: DisplayPlane, near: f32, far: f32) -> Result<Self> {
        if !(near.is_finite() && far.is_finite() && near > 0.0 && far > near) {
            return Err(Error::InvalidInput(format!(
                "Clip planes must satisfy 0 < near < far, got near={near} far={far}"
            )));
        }
        Ok(Self { plane, near, far })
    }

    #[must_use]
    pub fn plane(&self) -> &DisplayPlane {
        &self.plane
    }

    #[must_use]
    pub fn build(&self, eye: &WorldPoint) -> OffAxisProjection {
        build_frustum(eye, &self.plane, self.near, self.far)
    }
}
