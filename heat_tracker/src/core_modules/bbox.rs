// THEORY:
// The `bbox` module is the shared geometric vocabulary of the tracking engine.
// Every layer speaks in axis-aligned rectangles: the window generator emits them,
// the classifiers filter them, the heatmap paints them, the blob extractor
// derives them and the centroids smooth them.
//
// Key architectural principles:
// 1.  **Always Well-Formed**: A `BBox` is built through `BBox::new`, which orders
//     its corners componentwise. Downstream arithmetic can therefore rely on
//     `min <= max` without re-checking.
// 2.  **Floor Semantics**: Midpoints and averages round toward negative infinity,
//     so that boxes partially outside the frame (negative coordinates) behave the
//     same way as boxes inside it.
// 3.  **Total Arithmetic**: Nothing here can panic. Sums are widened to `i64`
//     before halving and a zero-extent box is simply a one-pixel box.

use serde::{Deserialize, Serialize};

/// An integer pixel coordinate. May lie outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        let dx = (self.x as i64 - other.x as i64) as f64;
        let dy = (self.y as i64 - other.y as i64) as f64;
        dx.hypot(dy)
    }
}

fn floor_half(a: i32, b: i32) -> i32 {
    (a as i64 + b as i64).div_euclid(2) as i32
}

/// An axis-aligned rectangle stored as its (min, max) corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawBBox", into = "RawBBox")]
pub struct BBox {
    min: Point,
    max: Point,
}

/// Wire form of a box: `[[x0, y0], [x1, y1]]`, corners in any order.
#[derive(Serialize, Deserialize)]
struct RawBBox([[i32; 2]; 2]);

impl From<RawBBox> for BBox {
    fn from(raw: RawBBox) -> Self {
        let [[x0, y0], [x1, y1]] = raw.0;
        BBox::new(Point::new(x0, y0), Point::new(x1, y1))
    }
}

impl From<BBox> for RawBBox {
    fn from(bbox: BBox) -> Self {
        RawBBox([[bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y]])
    }
}

impl BBox {
    /// Builds a box from two opposite corners, in any order.
    pub fn new(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_coords(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self::new(Point::new(x0, y0), Point::new(x1, y1))
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    pub fn width(&self) -> u32 {
        self.max.x.abs_diff(self.min.x)
    }

    pub fn height(&self) -> u32 {
        self.max.y.abs_diff(self.min.y)
    }

    /// True when the box covers no area under half-open coverage.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// The integer center of the box, floor-divided on each axis.
    pub fn midpoint(&self) -> Point {
        Point::new(
            floor_half(self.min.x, self.max.x),
            floor_half(self.min.y, self.max.y),
        )
    }

    /// Componentwise floor-average of two boxes' corners.
    pub fn average(a: &BBox, b: &BBox) -> BBox {
        BBox {
            min: Point::new(floor_half(a.min.x, b.min.x), floor_half(a.min.y, b.min.y)),
            max: Point::new(floor_half(a.max.x, b.max.x), floor_half(a.max.y, b.max.y)),
        }
    }

    /// Clamps both corners into `[0, width] x [0, height]`.
    pub fn clip_to(&self, width: u32, height: u32) -> BBox {
        let w = width.min(i32::MAX as u32) as i32;
        let h = height.min(i32::MAX as u32) as i32;
        BBox {
            min: Point::new(self.min.x.clamp(0, w), self.min.y.clamp(0, h)),
            max: Point::new(self.max.x.clamp(0, w), self.max.y.clamp(0, h)),
        }
    }

    /// Returns `true` if `other` lies entirely within this box.
    pub fn contains_box(&self, other: &BBox) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }
}
