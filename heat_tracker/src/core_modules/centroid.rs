// THEORY:
// A `Centroid` is the persistent identity of one object across frames. Where a
// `Blob` is a snapshot, a `Centroid` remembers: where the object is, where it was,
// where it should be drawn, and a per-frame record of whether it was seen.
//
// Key architectural principles:
// 1.  **Association Geometry vs. Display Geometry**: `center` is always the
//     midpoint of the latest measured box. `draw_box` is a one-step-lag average
//     used only for display and never feeds association.
// 2.  **Activation History**: Every frame appends exactly one entry per
//     association outcome (`true` for each match, `false` for a miss). Both
//     hysteresis rules read from it: confirmation counts the hits, staleness
//     looks at the trailing window.
// 3.  **No Prediction**: There is no velocity model. A missed frame leaves every
//     geometric field untouched.

use crate::core_modules::bbox::{BBox, Point};
use std::fmt;

/// A stable identifier for a tracked object, unique within one tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CentroidId(pub u64);

impl fmt::Display for CentroidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The lifecycle phase of a centroid, derived from its activation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CentroidState {
    /// Seen fewer than `min_activation_count` times.
    New,
    /// Seen often enough to be rendered.
    Confirmed,
    /// Nothing seen over the trailing inactivity window; about to be removed.
    Dead,
}

/// A tracked object.
#[derive(Debug, Clone)]
pub struct Centroid {
    id: CentroidId,
    /// The latest measured box.
    bounding_box: BBox,
    /// The box before the latest update.
    previous_box: BBox,
    /// Smoothed box used for rendering only.
    draw_box: BBox,
    /// Midpoint of `bounding_box`.
    center: Point,
    /// One entry per association outcome, oldest first. Kept in full for the
    /// centroid's lifetime so callers can inspect the complete record; it grows by
    /// at least one entry per frame and is released when the centroid is dropped.
    activations: Vec<bool>,
    /// Number of `true` entries in `activations`.
    hits: usize,
}

impl Centroid {
    pub fn new(id: CentroidId, bbox: BBox) -> Self {
        Self {
            id,
            bounding_box: bbox,
            previous_box: bbox,
            draw_box: bbox,
            center: bbox.midpoint(),
            activations: vec![true],
            hits: 1,
        }
    }

    pub fn id(&self) -> CentroidId {
        self.id
    }

    pub fn bounding_box(&self) -> BBox {
        self.bounding_box
    }

    pub fn previous_box(&self) -> BBox {
        self.previous_box
    }

    pub fn draw_box(&self) -> BBox {
        self.draw_box
    }

    pub fn center(&self) -> Point {
        self.center
    }

    /// The complete activation record since creation.
    pub fn activations(&self) -> &[bool] {
        &self.activations
    }

    /// Total number of frames (matches) this centroid was seen.
    pub fn activation_count(&self) -> usize {
        self.hits
    }

    /// True if `point` lies within `capture_radius` of the center, boundary included.
    pub fn near(&self, point: Point, capture_radius: f64) -> bool {
        self.center.distance_to(point) <= capture_radius
    }

    /// Applies a matched measurement.
    pub fn update(&mut self, new_box: BBox) {
        self.draw_box = BBox::average(&self.bounding_box, &new_box);
        self.previous_box = self.bounding_box;
        self.bounding_box = new_box;
        self.center = new_box.midpoint();
        self.activations.push(true);
        self.hits += 1;
    }

    pub fn mark_missed(&mut self) {
        self.activations.push(false);
    }

    /// True iff the history is longer than `max_inactivity` and its last
    /// `max_inactivity` entries are all misses.
    pub fn is_stale(&self, max_inactivity: usize) -> bool {
        let len = self.activations.len();
        len > max_inactivity && !self.activations[len - max_inactivity..].iter().any(|&a| a)
    }

    pub fn is_confirmed(&self, min_activation_count: usize) -> bool {
        self.hits >= min_activation_count
    }

    pub fn state(&self, min_activation_count: usize, max_inactivity: usize) -> CentroidState {
        if self.is_stale(max_inactivity) {
            CentroidState::Dead
        } else if self.is_confirmed(min_activation_count) {
            CentroidState::Confirmed
        } else {
            CentroidState::New
        }
    }
}
