// THEORY:
// Classification of candidate windows is the expensive part of a frame and every
// window is independent of the others, so it can be fanned out across threads.
// The tracker state is not: frame N must be fully folded into the heatmap and
// the centroid set before frame N+1 starts.
//
// Key architectural principles:
// 1.  **Parallel Classification**: The windows are split into contiguous slices,
//     one per worker, and each slice is classified on a blocking worker thread.
//     Results are concatenated in slice order, so the hot batch is identical to
//     the sequential one.
// 2.  **Sequential State**: `process_frame` takes `&mut self`; the borrow checker
//     rules out two frames touching the same tracker concurrently.
// 3.  **Stream Actor**: `spawn_stream` moves the detector into a task that
//     drains a frame channel in order, mirroring a camera feed.

use crate::core_modules::bbox::BBox;
use crate::core_modules::classifier::ClassifierEnsemble;
use crate::error::Result;
use crate::pipeline::{Detector, FrameReport};
use futures::future::join_all;
use image::RgbImage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// A `Detector` whose classification stage runs on a pool of worker threads.
pub struct ParallelDetector {
    detector: Detector,
    ensemble: Arc<ClassifierEnsemble>,
    windows: Arc<[BBox]>,
    workers: usize,
}

impl ParallelDetector {
    pub fn new(detector: Detector) -> Self {
        let ensemble = Arc::new(detector.ensemble().clone());
        let windows: Arc<[BBox]> = detector.windows().into();
        Self {
            detector,
            ensemble,
            windows,
            workers: num_cpus::get().max(1),
        }
    }

    /// Overrides the number of classification slices per frame.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs the full pipeline on one frame and returns the annotated frame with its report.
    pub async fn process_frame(&mut self, frame: RgbImage) -> Result<(RgbImage, FrameReport)> {
        self.detector.check_dimensions(&frame)?;

        let shared = Arc::new(frame);
        let hot = self.classify(Arc::clone(&shared)).await?;
        let report = self.detector.track(hot);

        let mut frame = Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone());
        self.detector.annotate(&mut frame);
        Ok((frame, report))
    }

    async fn classify(&self, frame: Arc<RgbImage>) -> Result<Vec<BBox>> {
        let total = self.windows.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let slice_len = total.div_ceil(self.workers);

        let tasks = (0..total).step_by(slice_len).map(|start| {
            let end = (start + slice_len).min(total);
            let frame = Arc::clone(&frame);
            let ensemble = Arc::clone(&self.ensemble);
            let windows = Arc::clone(&self.windows);
            tokio::task::spawn_blocking(move || ensemble.classify(&frame, &windows[start..end]))
        });

        let mut hot = Vec::new();
        for slice in join_all(tasks).await {
            hot.extend(slice?);
        }
        Ok(hot)
    }

    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    pub fn into_inner(self) -> Detector {
        self.detector
    }

    /// Moves the detector into a background task that processes frames in arrival
    /// order. Dropping the returned sender ends the stream.
    pub fn spawn_stream(mut self, capacity: usize) -> StreamHandle {
        let (frames_tx, mut frames_rx) = mpsc::channel::<RgbImage>(capacity.max(1));
        let (results_tx, results_rx) = mpsc::channel(capacity.max(1));

        let task = tokio::spawn(async move {
            while let Some(frame) = frames_rx.recv().await {
                let outcome = self.process_frame(frame).await;
                if results_tx.send(outcome).await.is_err() {
                    warn!("result receiver dropped, stopping stream");
                    break;
                }
            }
            self.detector
        });

        StreamHandle {
            frames: frames_tx,
            results: results_rx,
            task,
        }
    }
}

/// The channels of a running detection stream.
pub struct StreamHandle {
    pub frames: mpsc::Sender<RgbImage>,
    pub results: mpsc::Receiver<Result<(RgbImage, FrameReport)>>,
    /// Resolves to the detector once the frame sender is dropped.
    pub task: JoinHandle<Detector>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;
    use crate::error::Error;
    use image::Rgb;

    fn bright_center(frame: &RgbImage, w: &BBox) -> bool {
        let c = w.midpoint();
        c.x >= 0
            && c.y >= 0
            && (c.x as u32) < frame.width()
            && (c.y as u32) < frame.height()
            && frame.get_pixel(c.x as u32, c.y as u32)[1] > 0
    }

    fn scene() -> RgbImage {
        RgbImage::from_fn(160, 120, |x, y| {
            if (40..90).contains(&x) && (30..80).contains(&y) {
                Rgb([0, 200, 0])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    fn detector() -> Detector {
        let config = DetectorConfig {
            search_region: Default::default(),
            window_size: 30,
            window_overlap: 0.5,
            ..DetectorConfig::for_frame(160, 120)
        };
        Detector::new(config, ClassifierEnsemble::new().with(bright_center)).unwrap()
    }

    #[tokio::test]
    async fn matches_sequential_detector() {
        let mut sequential = detector();
        let mut parallel = ParallelDetector::new(detector()).with_workers(3);

        for _ in 0..6 {
            let expected = sequential.process_frame(scene()).unwrap();
            let (frame, report) = parallel.process_frame(scene()).await.unwrap();
            assert_eq!(frame, expected);
            assert!(report.hot_boxes > 0);
        }

        let a: Vec<_> = sequential.tracked().map(|c| c.bounding_box()).collect();
        let b: Vec<_> = parallel.detector().tracked().map(|c| c.bounding_box()).collect();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn rejects_mismatched_frame() {
        let mut parallel = ParallelDetector::new(detector());
        let result = parallel.process_frame(RgbImage::new(10, 10)).await;
        assert!(matches!(result, Err(Error::FrameDimensions { .. })));
    }

    #[tokio::test]
    async fn stream_processes_frames_in_order() {
        let handle = ParallelDetector::new(detector()).spawn_stream(2);
        let StreamHandle { frames, mut results, task } = handle;

        let producer = tokio::spawn(async move {
            for _ in 0..5 {
                frames.send(scene()).await.unwrap();
            }
        });

        let mut indices = Vec::new();
        for _ in 0..5 {
            let (_, report) = results.recv().await.unwrap().unwrap();
            indices.push(report.frame_index);
        }
        producer.await.unwrap();

        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        let detector = task.await.unwrap();
        assert_eq!(detector.frames_processed(), 5);
    }
}
