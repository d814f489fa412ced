// THEORY:
// This file is the main entry point for the `heat_tracker` library crate.
// It turns a noisy, per-frame stream of classifier "hit" rectangles into
// temporally stable tracked-object boxes for a video stream.
//
// The primary export is the `Detector` (and its async sibling, the
// `ParallelDetector`) together with its `DetectorConfig`. The building blocks in
// `core_modules` (heatmap accumulator, blob labeler, centroid tracker) are public
// as well, so hosts can drive individual stages, but most consumers only need
// the re-exports below.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{AssociationPolicy, DetectorConfig, SearchRegion};
pub use core_modules::bbox::{BBox, Point};
pub use core_modules::classifier::{ClassifierEnsemble, WindowClassifier};
pub use error::{Error, Result};
pub use parallel_pipeline::ParallelDetector;
pub use pipeline::{Detector, FrameReport};
