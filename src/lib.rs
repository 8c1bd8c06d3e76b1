//! Depth-camera head tracking and off-axis projection for fish-tank VR.
//!
//! A depth camera watches the viewer; the tracked head position drives an
//! asymmetric perspective projection so that content on a fixed physical
//! display appears perspective-correct from where the viewer actually is.
//!
//! The tracking pipeline runs once per frame:
//! 1. Segment the depth image into a foreground mask using a depth band
//! 2. Find blobs, pick the first one and sample a head position from it
//! 3. Smooth the head position over a short history
//! 4. Build the off-axis frustum and view transform for the display
//!
//! # Examples
//!
//! ## Tracking a simulated viewer
//!
//! ```no_run
//! use fishtank_tracking::{
//!     config::Config,
//!     depth::synthetic::{SwayPath, SyntheticScene},
//!     tracker::{HeadTracker, TickOutcome},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = HeadTracker::from_config(&Config::default())?;
//! let mut scene = SyntheticScene::default().with_motion(SwayPath::default());
//!
//! for _ in 0..120 {
//!     if let TickOutcome::Tracked { head, .. } = tracker.tick(&mut scene) {
//!         println!("Head at ({:.0}, {:.0}, {:.0}) mm", head.x, head.y, head.z);
//!     }
//!     // The renderer reads this every frame, tracked or not
//!     let projection = tracker.projection();
//!     println!("{:?}", projection.frustum);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Building a projection directly
//!
//! ```
//! use fishtank_tracking::{depth::WorldPoint, projection::{build_frustum, DisplayPlane}};
//!
//! let plane = DisplayPlane::from_size(300.0, 200.0);
//! let result = build_frustum(&WorldPoint::new(0.0, 0.0, 500.0), &plane, 1.0, 1000.0);
//! assert!(result.frustum.is_symmetric(1e-5));
//! ```

/// Depth frames, depth sources and pixel-to-world mapping
pub mod depth;

/// Depth band segmentation into a foreground mask
pub mod segmentation;

/// Connected-component blob finding
pub mod blob;

/// Head blob selection and world position sampling
pub mod head_locator;

/// Temporal smoothing of head positions
pub mod filters;

/// Off-axis projection for a fixed display
pub mod projection;

/// Per-frame tracking pipeline and operator controls
pub mod tracker;

/// Error types and result handling
pub mod error;

/// Constants used throughout the crate
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
