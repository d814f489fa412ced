// THEORY:
// All tunables of the engine live in one explicit value, `DetectorConfig`, which
// is handed to the `Detector` at construction and never mutated afterwards.
// There is no global state: two detectors with different configurations can run
// side by side. The defaults reproduce the behaviour of the reference vehicle
// tracking setup (720p frames, 112px windows over the lower right of the road).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// How blobs are matched to tracked centroids each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationPolicy {
    /// Every centroid within the capture radius of a blob is updated with it, in
    /// extraction order. A blob may feed several centroids and a centroid may be
    /// updated by several blobs in one frame (last write wins).
    #[default]
    Greedy,
    /// Each blob updates only its nearest centroid within the capture radius that
    /// has not already been claimed this frame.
    Exclusive,
}

/// The area of the frame that candidate windows are generated over.
/// A missing start means 0, a missing stop means the frame edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRegion {
    pub x_start: Option<u32>,
    pub x_stop: Option<u32>,
    pub y_start: Option<u32>,
    pub y_stop: Option<u32>,
}

/// Configuration for the `Detector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Max distance in pixels between a blob center and a centroid center for a match.
    pub capture_radius: f64,
    /// Number of past detection batches kept in the heatmap window.
    pub history_length: usize,
    /// Base heatmap threshold; cells at or below the effective threshold are discarded.
    pub heat_threshold: u32,
    /// A centroid with no match in this many trailing frames is removed.
    pub max_inactivity: usize,
    /// Matches needed before a centroid is drawn.
    pub min_activation_count: usize,
    pub association: AssociationPolicy,
    pub search_region: SearchRegion,
    /// Side length of the square candidate windows.
    pub window_size: u32,
    /// Fractional overlap between neighbouring windows, in `[0, 1)`.
    pub window_overlap: f64,
    pub track_color: [u8; 3],
    pub track_thickness: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            frame_width: 1280,
            frame_height: 720,
            capture_radius: 100.0,
            history_length: 60,
            heat_threshold: 3,
            max_inactivity: 60,
            min_activation_count: 3,
            association: AssociationPolicy::Greedy,
            search_region: SearchRegion {
                x_start: Some(400),
                x_stop: None,
                y_start: Some(390),
                y_stop: Some(670),
            },
            window_size: 112,
            window_overlap: 0.6,
            track_color: [0, 0, 255],
            track_thickness: 6,
        }
    }
}

impl DetectorConfig {
    /// Same as `default()` but sized for the given frame.
    pub fn for_frame(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Err(Error::InvalidConfig(reason.to_string()));

        if self.frame_width == 0 || self.frame_height == 0 {
            return invalid("frame dimensions must be non-zero");
        }
        if self.history_length == 0 {
            return invalid("history_length must be at least 1");
        }
        if self.max_inactivity == 0 {
            return invalid("max_inactivity must be at least 1");
        }
        if !self.capture_radius.is_finite() || self.capture_radius < 0.0 {
            return invalid("capture_radius must be a finite, non-negative distance");
        }
        if self.window_size == 0 {
            return invalid("window_size must be non-zero");
        }
        if !(0.0..1.0).contains(&self.window_overlap) {
            return invalid("window_overlap must lie in [0, 1)");
        }
        Ok(())
    }
}
