// THEORY:
// Classification is an external concern: feature extraction and model inference
// live outside this crate. What the engine needs is a narrow contract, a
// `WindowClassifier` that answers "is there an object in this window?", and a
// rule for combining several of them.
//
// Key architectural principles:
// 1.  **Unanimous Ensemble**: A window is hot only if every member flags it.
//     Members are asked in order and the first veto stops the vote.
// 2.  **Order Preservation**: `classify` keeps the candidate order, so the hot
//     batch handed to the heatmap is reproducible frame to frame.
// 3.  **Thread-Safe Members**: Classifiers are `Send + Sync` so the parallel
//     pipeline can share one ensemble across worker threads.

use crate::core_modules::bbox::BBox;
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::fmt;
use std::sync::Arc;

/// Decides whether a candidate window of a frame contains an object.
pub trait WindowClassifier: Send + Sync {
    fn is_hot(&self, frame: &RgbImage, window: &BBox) -> bool;
}

impl<F> WindowClassifier for F
where
    F: Fn(&RgbImage, &BBox) -> bool + Send + Sync,
{
    fn is_hot(&self, frame: &RgbImage, window: &BBox) -> bool {
        self(frame, window)
    }
}

/// A logical-AND combination of classifiers.
#[derive(Clone, Default)]
pub struct ClassifierEnsemble {
    members: Vec<Arc<dyn WindowClassifier>>,
}

impl fmt::Debug for ClassifierEnsemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierEnsemble")
            .field("members", &self.members.len())
            .finish()
    }
}

impl ClassifierEnsemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, classifier: impl WindowClassifier + 'static) -> Self {
        self.members.push(Arc::new(classifier));
        self
    }

    pub fn push(&mut self, classifier: Arc<dyn WindowClassifier>) {
        self.members.push(classifier);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True only if the ensemble has members and all of them flag the window.
    pub fn is_hot(&self, frame: &RgbImage, window: &BBox) -> bool {
        !self.members.is_empty() && self.members.iter().all(|m| m.is_hot(frame, window))
    }

    /// Filters candidates down to the hot ones, keeping their order.
    pub fn classify(&self, frame: &RgbImage, candidates: &[BBox]) -> Vec<BBox> {
        candidates
            .iter()
            .filter(|w| self.is_hot(frame, w))
            .copied()
            .collect()
    }
}

/// Crops `window` out of the frame (clipped to its bounds) and resizes it to a
/// `size` x `size` patch, the input shape classifiers are trained on.
/// Returns `None` when the window does not overlap the frame.
pub fn window_patch(frame: &RgbImage, window: &BBox, size: u32) -> Option<RgbImage> {
    let clipped = window.clip_to(frame.width(), frame.height());
    if clipped.is_empty() {
        return None;
    }

    let min = clipped.min();
    let cropped = imageops::crop_imm(
        frame,
        min.x as u32,
        min.y as u32,
        clipped.width(),
        clipped.height(),
    )
    .to_image();
    Some(imageops::resize(&cropped, size, size, FilterType::Triangle))
}
