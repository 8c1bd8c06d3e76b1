//! Connected-component blob finding on binary masks.

use crate::segmentation::BinaryMask;
use log::debug;

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// One past the last column
    #[must_use]
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// One past the last row
    #[must_use]
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// A connected region of foreground (or, for holes, enclosed background) pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Mean pixel position
    pub centroid: (f32, f32),
    pub bounding_box: BoundingBox,
    /// Pixel count
    pub area: usize,
    /// True for an interior hole of another blob
    pub hole: bool,
}

/// Finds blobs in a binary mask.
///
/// Ordering of the returned blobs is finder-defined; callers treat the first
/// one as authoritative.
pub trait BlobFinder {
    /// Find blobs whose area lies in `[min_area, max_area]`, returning at most
    /// `max_considered`, including interior holes when `find_holes` is set
    fn find_blobs(
        &mut self,
        mask: &BinaryMask,
        min_area: usize,
        max_area: usize,
        max_considered: usize,
        find_holes: bool,
    ) -> Vec<Blob>;

    /// Blobs that passed the area bounds on the last search, before the
    /// `max_considered` cut
    fn found_count(&self) -> usize;
}

/// Blob finder labelling 8-connected foreground regions, largest first.
///
/// A region's rank is its enclosed area: its own pixels plus every hole it
/// surrounds, so an outline always outranks the holes inside it.
#[derive(Debug, Default)]
pub struct ContourFinder {
    labels: Vec<u32>,
    stack: Vec<(u32, u32)>,
    found: usize,
}

const UNLABELLED: u32 = 0;

impl ContourFinder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flood-fill the region containing `(sx, sy)` whose pixels equal
    /// `foreground`, tagging it with `label`
    #[allow(clippy::cast_precision_loss)]
    fn flood(
        &mut self,
        mask: &BinaryMask,
        sx: u32,
        sy: u32,
        label: u32,
        foreground: bool,
    ) -> (Blob, bool) {
        let width = mask.width();
        let height = mask.height();
        let eight_connected = foreground;

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (sx, sy, sx, sy);
        let (mut sum_x, mut sum_y) = (0.0f64, 0.0f64);
        let mut area = 0usize;
        let mut touches_border = false;

        self.labels[sy as usize * width as usize + sx as usize] = label;
        self.stack.clear();
        self.stack.push((sx, sy));

        while let Some((x, y)) = self.stack.pop() {
            area += 1;
            sum_x += f64::from(x);
            sum_y += f64::from(y);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                touches_border = true;
            }

            for (dx, dy) in NEIGHBOURS {
                if !eight_connected && dx != 0 && dy != 0 {
                    continue;
                }
                let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                    continue;
                };
                if nx >= width || ny >= height {
                    continue;
                }
                let idx = ny as usize * width as usize + nx as usize;
                if self.labels[idx] == UNLABELLED && mask.get(nx, ny) == foreground {
                    self.labels[idx] = label;
                    self.stack.push((nx, ny));
                }
            }
        }

        let n = area as f64;
        #[allow(clippy::cast_possible_truncation)]
        let centroid = ((sum_x / n) as f32, (sum_y / n) as f32);
        let blob = Blob {
            centroid,
            bounding_box: BoundingBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1),
            area,
            hole: !foreground,
        };
        (blob, touches_border)
    }
}

const NEIGHBOURS: [(i32, i32); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

impl BlobFinder for ContourFinder {
    fn find_blobs(
        &mut self,
        mask: &BinaryMask,
        min_area: usize,
        max_area: usize,
        max_considered: usize,
        find_holes: bool,
    ) -> Vec<Blob> {
        let width = mask.width();
        let height = mask.height();
        self.labels.clear();
        self.labels.resize(width as usize * height as usize, UNLABELLED);

        // (enclosing label, blob) per region; holes name the region around them
        let mut regions: Vec<(u32, Blob)> = Vec::new();
        // Enclosed area per foreground label, indexed by label
        let mut enclosed: Vec<usize> = vec![0];
        let mut next_label = 1u32;

        for y in 0..height {
            for x in 0..width {
                let idx = y as usize * width as usize + x as usize;
                if self.labels[idx] != UNLABELLED {
                    continue;
                }
                let foreground = mask.get(x, y);
                let label = next_label;
                let (blob, touches_border) = self.flood(mask, x, y, label, foreground);
                next_label += 1;
                enclosed.push(if foreground { blob.area } else { 0 });

                if foreground {
                    regions.push((label, blob));
                } else if !touches_border && y > 0 {
                    // Raster order reaches a hole at its top row, so the pixel
                    // above belongs to the outline enclosing it
                    let owner = self.labels[idx - width as usize];
                    enclosed[owner as usize] += blob.area;
                    if find_holes {
                        regions.push((owner, blob));
                    }
                }
            }
        }

        let mut blobs: Vec<(usize, Blob)> = regions
            .into_iter()
            .map(|(label, blob)| {
                let rank = if blob.hole { blob.area } else { enclosed[label as usize] };
                (rank, blob)
            })
            .filter(|(_, blob)| (min_area..=max_area).contains(&blob.area))
            .collect();

        // Stable: equal ranks keep raster discovery order
        blobs.sort_by(|a, b| b.0.cmp(&a.0));
        self.found = blobs.len();
        blobs.truncate(max_considered);
        debug!("Found {} blobs, keeping {}", self.found, blobs.len());
        blobs.into_iter().map(|(_, blob)| blob).collect()
    }

    fn found_count(&self) -> usize {
        self.found
    }
}
