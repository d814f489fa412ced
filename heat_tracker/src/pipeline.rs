// THEORY:
// The `pipeline` module is the top-level API of the tracking engine. A `Detector`
// owns all carried state for one video stream (the heatmap and the tracked
// centroids) and turns each incoming frame into an annotated frame.
//
// Per-frame stages:
// 1.  **Candidate Generation**: the precomputed sliding windows over the search region.
// 2.  **Classification**: the ensemble keeps the windows every member flags.
// 3.  **Temporal Accumulation**: the hot batch enters the heatmap window.
// 4.  **Spatial Grouping**: the thresholded heatmap is split into 4-connected blobs.
// 5.  **Association & Lifecycle**: blobs update, spawn, or let centroids go stale.
// 6.  **Rendering**: confirmed centroids are outlined on the frame.
//
// Stages 3-5 (`track`) and 6 (`annotate`) are exposed separately so a host that
// classifies elsewhere (for example the parallel pipeline, or a recorded
// detection log) can drive the same state machine. Every call advances the
// state exactly once; frames must be fed in order.

use crate::config::DetectorConfig;
use crate::core_modules::bbox::BBox;
use crate::core_modules::blob::Blob;
use crate::core_modules::blob_detector::{FourConnectedLabeler, RegionLabeler, extract_blobs};
use crate::core_modules::classifier::ClassifierEnsemble;
use crate::core_modules::heatmap::HeatmapAccumulator;
use crate::core_modules::render::draw_tracks;
use crate::core_modules::tracker::CentroidTracker;
use crate::core_modules::window_search::slide_window;
use crate::error::{Error, Result};
use image::{GrayImage, RgbImage};
use tracing::{debug, info};

pub use crate::core_modules::centroid::{Centroid, CentroidId, CentroidState};
pub use crate::core_modules::tracker::Association;

/// What happened to the tracker state during one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Zero-based index of the frame within the stream.
    pub frame_index: u64,
    /// Number of hot boxes fed to the heatmap.
    pub hot_boxes: usize,
    /// Blobs extracted from the thresholded heatmap, in extraction order.
    pub blobs: Vec<Blob>,
    pub association: Association,
    /// Number of centroids passing the confirmation gate after this frame.
    pub confirmed: usize,
}

/// The per-stream tracking engine.
pub struct Detector {
    config: DetectorConfig,
    ensemble: ClassifierEnsemble,
    labeler: Box<dyn RegionLabeler + Send + Sync>,
    windows: Vec<BBox>,
    heatmap: HeatmapAccumulator,
    last_heatmap: GrayImage,
    tracker: CentroidTracker,
    frame_index: u64,
}

impl Detector {
    pub fn new(config: DetectorConfig, ensemble: ClassifierEnsemble) -> Result<Self> {
        config.validate()?;

        let windows = slide_window(
            config.frame_width,
            config.frame_height,
            &config.search_region,
            config.window_size,
            config.window_overlap,
        );
        info!(
            width = config.frame_width,
            height = config.frame_height,
            windows = windows.len(),
            classifiers = ensemble.len(),
            "detector ready"
        );

        Ok(Self {
            heatmap: HeatmapAccumulator::new(
                config.frame_width,
                config.frame_height,
                config.history_length,
                config.heat_threshold,
            ),
            last_heatmap: GrayImage::new(config.frame_width, config.frame_height),
            tracker: CentroidTracker::new(&config),
            labeler: Box::new(FourConnectedLabeler),
            windows,
            ensemble,
            config,
            frame_index: 0,
        })
    }

    /// Replaces the connected-component labeler. The labeler must use
    /// 4-connectivity; an 8-connected one changes region counts.
    pub fn with_labeler(mut self, labeler: impl RegionLabeler + Send + Sync + 'static) -> Self {
        self.labeler = Box::new(labeler);
        self
    }

    /// Runs the full pipeline on one frame and returns it with confirmed tracks drawn.
    pub fn process_frame(&mut self, mut frame: RgbImage) -> Result<RgbImage> {
        self.check_dimensions(&frame)?;
        let hot = self.ensemble.classify(&frame, &self.windows);
        self.track(hot);
        self.annotate(&mut frame);
        Ok(frame)
    }

    /// Feeds one frame's hot boxes through accumulation, grouping and association.
    pub fn track(&mut self, hot_boxes: Vec<BBox>) -> FrameReport {
        let hot_count = hot_boxes.len();

        // --- Temporal Accumulation ---
        self.heatmap.add(hot_boxes);
        self.last_heatmap = self.heatmap.read();

        // --- Spatial Grouping ---
        let labeling = self.labeler.label(&self.last_heatmap);
        let blobs = extract_blobs(&labeling);

        // --- Association & Lifecycle ---
        let association = self.tracker.update(&blobs);
        let confirmed = self.tracker.confirmed().count();

        debug!(
            frame = self.frame_index,
            hot = hot_count,
            batches = self.heatmap.batches_seen(),
            threshold = self.heatmap.effective_threshold(),
            blobs = blobs.len(),
            tracked = self.tracker.len(),
            confirmed,
            "frame tracked"
        );

        let report = FrameReport {
            frame_index: self.frame_index,
            hot_boxes: hot_count,
            blobs,
            association,
            confirmed,
        };
        self.frame_index += 1;
        report
    }

    /// Draws the smoothed box of every confirmed centroid onto the frame.
    pub fn annotate(&self, frame: &mut RgbImage) {
        let boxes: Vec<BBox> = self.tracker.confirmed().map(Centroid::draw_box).collect();
        draw_tracks(frame, &boxes, self.config.track_color, self.config.track_thickness);
    }

    pub(crate) fn check_dimensions(&self, frame: &RgbImage) -> Result<()> {
        let (width, height) = frame.dimensions();
        if (width, height) != (self.config.frame_width, self.config.frame_height) {
            return Err(Error::FrameDimensions {
                expected_width: self.config.frame_width,
                expected_height: self.config.frame_height,
                actual_width: width,
                actual_height: height,
            });
        }
        Ok(())
    }

    /// The thresholded heatmap as of the last tracked frame.
    pub fn heatmap(&self) -> &GrayImage {
        &self.last_heatmap
    }

    pub fn accumulator(&self) -> &HeatmapAccumulator {
        &self.heatmap
    }

    /// Every tracked centroid, rendered or not.
    pub fn tracked(&self) -> impl Iterator<Item = &Centroid> {
        self.tracker.tracked()
    }

    pub fn confirmed(&self) -> impl Iterator<Item = &Centroid> {
        self.tracker.confirmed()
    }

    pub fn centroid_state(&self, id: CentroidId) -> Option<CentroidState> {
        self.tracker
            .get(id)
            .map(|c| c.state(self.config.min_activation_count, self.config.max_inactivity))
    }

    /// The candidate windows searched on every frame.
    pub fn windows(&self) -> &[BBox] {
        &self.windows
    }

    pub fn ensemble(&self) -> &ClassifierEnsemble {
        &self.ensemble
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::blob_detector::ImageprocLabeler;
    use image::Rgb;

    fn small_config() -> DetectorConfig {
        DetectorConfig {
            search_region: Default::default(),
            window_size: 40,
            window_overlap: 0.5,
            track_thickness: 1,
            ..DetectorConfig::for_frame(200, 120)
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = DetectorConfig { history_length: 0, ..small_config() };
        assert!(matches!(
            Detector::new(config, ClassifierEnsemble::new()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_mismatched_frame() {
        let mut detector = Detector::new(small_config(), ClassifierEnsemble::new()).unwrap();
        let result = detector.process_frame(RgbImage::new(100, 100));
        assert!(matches!(result, Err(Error::FrameDimensions { actual_width: 100, .. })));
        assert_eq!(detector.frames_processed(), 0);
    }

    #[test]
    fn heat_below_threshold_yields_no_blobs() {
        let mut detector = Detector::new(small_config(), ClassifierEnsemble::new()).unwrap();
        for _ in 0..3 {
            let report = detector.track(vec![BBox::from_coords(10, 10, 50, 50)]);
            assert!(report.blobs.is_empty());
        }
        let report = detector.track(vec![BBox::from_coords(10, 10, 50, 50)]);
        assert_eq!(report.blobs.len(), 1);
        assert_eq!(report.blobs[0].bounding_box, BBox::from_coords(10, 10, 49, 49));
        assert_eq!(report.association.spawned, vec![CentroidId(0)]);
    }

    #[test]
    fn swapped_labeler_extracts_the_same_blobs() {
        let mut detector = Detector::new(small_config(), ClassifierEnsemble::new())
            .unwrap()
            .with_labeler(ImageprocLabeler);
        for _ in 0..3 {
            detector.track(vec![BBox::from_coords(10, 10, 50, 50)]);
        }
        let report = detector.track(vec![BBox::from_coords(10, 10, 50, 50)]);
        assert_eq!(report.blobs.len(), 1);
        assert_eq!(report.blobs[0].bounding_box, BBox::from_coords(10, 10, 49, 49));
    }

    #[test]
    fn persistent_detection_is_confirmed_and_drawn() {
        // A classifier that only fires on windows overlapping the white square.
        let ensemble = ClassifierEnsemble::new().with(|frame: &RgbImage, w: &BBox| {
            let c = w.midpoint();
            c.x >= 0
                && c.y >= 0
                && (c.x as u32) < frame.width()
                && (c.y as u32) < frame.height()
                && frame.get_pixel(c.x as u32, c.y as u32)[0] > 0
        });
        let mut detector = Detector::new(small_config(), ensemble).unwrap();

        let frame = RgbImage::from_fn(200, 120, |x, y| {
            if (60..100).contains(&x) && (40..80).contains(&y) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });

        for _ in 0..7 {
            detector.process_frame(frame.clone()).unwrap();
        }
        let out = detector.process_frame(frame).unwrap();

        assert_eq!(detector.confirmed().count(), 1);
        let draw = detector.confirmed().next().unwrap().draw_box();
        assert_eq!(out.get_pixel(draw.min().x as u32, draw.min().y as u32), &Rgb([0, 0, 255]));
        assert_eq!(detector.centroid_state(CentroidId(0)), Some(CentroidState::Confirmed));
    }
}
