//! Blob selection and head position sampling.
//!
//! The first blob returned by the finder is taken as the head candidate and
//! converted to a world position in one of two ways, see [`SamplingMode`].
//! The sensor reports X and Y mirrored relative to the viewer, so both are
//! negated on the way out.

use crate::blob::{Blob, BlobFinder};
use crate::constants::{
    DEFAULT_BLOB_LEVELS, DEFAULT_MAX_BLOB_AREA_FRACTION, DEFAULT_MIN_BLOB_AREA, DEFAULT_SCAN_ROW_OFFSET,
    DEFAULT_Z_CUTOFF_MM,
};
use crate::depth::{is_no_reading, DepthSource, WorldPoint};
use crate::segmentation::BinaryMask;
use log::debug;
use serde::{Deserialize, Serialize};

/// How the head position is read from the selected blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// World coordinate of the blob centroid
    Centroid,
    /// Mean of valid samples along a row near the top of the blob
    #[default]
    ScanLine,
}

impl SamplingMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Centroid => Self::ScanLine,
            Self::ScanLine => Self::Centroid,
        }
    }
}

impl std::str::FromStr for SamplingMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "centroid" => Ok(Self::Centroid),
            "scan_line" | "scanline" => Ok(Self::ScanLine),
            _ => Err(crate::Error::InvalidInput(format!("Unknown sampling mode: {s}"))),
        }
    }
}

/// Blob search and sampling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorSettings {
    pub min_area: usize,
    /// Largest blob as a fraction of the frame area
    pub max_area_fraction: f32,
    pub max_considered: usize,
    pub find_holes: bool,
    pub mode: SamplingMode,
    pub scan_row_offset: u32,
    pub z_cutoff_mm: f32,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            min_area: DEFAULT_MIN_BLOB_AREA,
            max_area_fraction: DEFAULT_MAX_BLOB_AREA_FRACTION,
            max_considered: DEFAULT_BLOB_LEVELS,
            find_holes: true,
            mode: SamplingMode::default(),
            scan_row_offset: DEFAULT_SCAN_ROW_OFFSET,
            z_cutoff_mm: DEFAULT_Z_CUTOFF_MM,
        }
    }
}

impl LocatorSettings {
    /// Largest accepted blob for a `width` x `height` frame
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn max_area(&self, width: u32, height: u32) -> usize {
        let total = width as usize * height as usize;
        (total as f32 * self.max_area_fraction) as usize
    }
}

/// Picks the head blob and turns it into a candidate world position
pub struct HeadLocator<F: BlobFinder> {
    finder: F,
    settings: LocatorSettings,
    last_blob_count: usize,
}

impl<F: BlobFinder> HeadLocator<F> {
    pub fn new(finder: F, settings: LocatorSettings) -> Self {
        Self {
            finder,
            settings,
            last_blob_count: 0,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &LocatorSettings {
        &self.settings
    }

    pub fn set_mode(&mut self, mode: SamplingMode) {
        self.settings.mode = mode;
    }

    /// Blobs within the area bounds on the most recent call to [`Self::locate`],
    /// counted before the `max_considered` cut
    #[must_use]
    pub fn last_blob_count(&self) -> usize {
        self.last_blob_count
    }

    /// Candidate head position for this frame, or `None` when nothing usable
    /// was found
    pub fn locate<S: DepthSource + ?Sized>(&mut self, mask: &BinaryMask, source: &S) -> Option<WorldPoint> {
        let max_area = self.settings.max_area(mask.width(), mask.height());
        let blobs = self.finder.find_blobs(
            mask,
            self.settings.min_area,
            max_area,
            self.settings.max_considered,
            self.settings.find_holes,
        );
        self.last_blob_count = self.finder.found_count();

        // A hole is background seen through the head outline, never the head
        let blob = blobs.iter().find(|blob| !blob.hole)?;
        match self.settings.mode {
            SamplingMode::Centroid => {
                let (cx, cy) = blob.centroid;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let on_blob = mask.get(cx.max(0.0) as u32, cy.max(0.0) as u32);
                if !on_blob {
                    debug!("Blob centroid ({cx:.1}, {cy:.1}) lies outside the blob");
                    return None;
                }
                sample_centroid(blob, source)
            }
            SamplingMode::ScanLine => {
                sample_scan_line(blob, source, self.settings.scan_row_offset, self.settings.z_cutoff_mm)
            }
        }
    }
}

fn mirror(point: WorldPoint) -> WorldPoint {
    WorldPoint::new(-point.x, -point.y, point.z)
}

/// World position at the blob centroid, mirrored
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sample_centroid<S: DepthSource + ?Sized>(blob: &Blob, source: &S) -> Option<WorldPoint> {
    let (cx, cy) = blob.centroid;
    let point = source.world_coordinate_at(cx.max(0.0) as u32, cy.max(0.0) as u32);
    if is_no_reading(&point) {
        debug!("No depth at blob centroid ({cx:.1}, {cy:.1})");
        return None;
    }
    Some(mirror(point))
}

/// Mean X and Z along the row `row_offset` below the top of the blob.
///
/// A sample counts only if all three coordinates are non-zero and its depth
/// is below `z_cutoff_mm`. Y is the height of the row itself, taken from the
/// first accepted sample.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sample_scan_line<S: DepthSource + ?Sized>(
    blob: &Blob,
    source: &S,
    row_offset: u32,
    z_cutoff_mm: f32,
) -> Option<WorldPoint> {
    let bbox = blob.bounding_box;
    let row = bbox.y.saturating_add(row_offset).min(source.height().saturating_sub(1));

    let mut count = 0usize;
    let (mut sum_x, mut sum_z) = (0.0f32, 0.0f32);
    let mut row_y = None;

    for x in bbox.x..bbox.right() {
        let p = source.world_coordinate_at(x, row);
        if p.x == 0.0 || p.y == 0.0 || p.z == 0.0 || p.z >= z_cutoff_mm {
            continue;
        }
        count += 1;
        sum_x += p.x;
        sum_z += p.z;
        row_y.get_or_insert(p.y);
    }

    let Some(y) = row_y else {
        debug!("No valid samples on scan row {row}");
        return None;
    };

    let n = count as f32;
    Some(mirror(WorldPoint::new(sum_x / n, y, sum_z / n)))
}
