// THEORY:
// A `Blob` is one connected region of the thresholded heatmap in a single frame.
// It is the measurement the tracker consumes: a snapshot with no memory of
// earlier frames. Its identity (`label`) is only meaningful inside the frame it
// was extracted from; persistence across frames is the job of `Centroid`.

use crate::core_modules::bbox::{BBox, Point};

/// A single connected region of heat detected in one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// The region id assigned by the labeler, in `[1, region_count]`.
    pub label: u32,
    /// Inclusive pixel extent: min and max of the member pixel coordinates.
    pub bounding_box: BBox,
    /// Midpoint of `bounding_box`.
    pub center: Point,
    /// Number of member pixels.
    pub pixel_count: usize,
}

impl Blob {
    pub fn new(label: u32, bounding_box: BBox, pixel_count: usize) -> Self {
        Self {
            label,
            bounding_box,
            center: bounding_box.midpoint(),
            pixel_count,
        }
    }

    /// Builds a blob straight from a box, used when replaying regions from outside
    /// the labeler.
    pub fn from_box(label: u32, bounding_box: BBox) -> Self {
        let area = bounding_box.width().max(1) as usize * bounding_box.height().max(1) as usize;
        Self::new(label, bounding_box, area)
    }
}
