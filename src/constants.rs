//! Constants used throughout the tracker

/// Number of head positions averaged by the default smoother
pub const DEFAULT_SMOOTHING_WINDOW: usize = 10;

/// Default near threshold (brightest value still counted as foreground)
pub const DEFAULT_NEAR_THRESHOLD: i32 = 255;

/// Default far threshold (foreground must be strictly brighter than this)
pub const DEFAULT_FAR_THRESHOLD: i32 = 132;

/// Bounds for both depth thresholds
pub const THRESHOLD_MIN: i32 = 0;
pub const THRESHOLD_MAX: i32 = 255;

/// Smallest blob, in pixels, considered a head candidate
pub const DEFAULT_MIN_BLOB_AREA: usize = 50;

/// Largest blob as a fraction of the frame area
pub const DEFAULT_MAX_BLOB_AREA_FRACTION: f32 = 0.5;

/// Contour nesting levels searched by the blob finder
pub const DEFAULT_BLOB_LEVELS: usize = 1;

/// Rows below the top of the blob bounding box where the scan line is sampled
pub const DEFAULT_SCAN_ROW_OFFSET: u32 = 50;

/// Samples at or beyond this depth are treated as background bleed-through
pub const DEFAULT_Z_CUTOFF_MM: f32 = 3000.0;

/// Physical size of the tracked display window
pub const DEFAULT_WINDOW_WIDTH: f32 = 300.0;
pub const DEFAULT_WINDOW_HEIGHT: f32 = 200.0;

/// Head position assumed before the first detection
pub const DEFAULT_INITIAL_HEAD_Z: f32 = 500.0;

/// Clip planes of the off-axis projection
pub const DEFAULT_NEAR_CLIP: f32 = 1.0;
pub const DEFAULT_FAR_CLIP: f32 = 10_000.0;

/// Smallest eye-to-plane distance used when building a frustum
pub const DEGENERATE_DISTANCE_EPSILON: f32 = 1e-3;

/// Depth range mapped onto the 8-bit depth image, in millimetres
pub const DEFAULT_DEPTH_NEAR_CLIP_MM: u16 = 500;
pub const DEFAULT_DEPTH_FAR_CLIP_MM: u16 = 4000;

/// Kinect depth intrinsics at 640x480
pub const KINECT_FX: f32 = 594.21;
pub const KINECT_FY: f32 = 591.04;
pub const KINECT_CX: f32 = 339.5;
pub const KINECT_CY: f32 = 242.7;
pub const KINECT_WIDTH: u32 = 640;
pub const KINECT_HEIGHT: u32 = 480;

/// Default frames per second assumption
pub const DEFAULT_FPS: f64 = 60.0;
