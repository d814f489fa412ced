// THEORY:
// The `HeatmapAccumulator` is the temporal denoiser of the engine. Classifiers are
// noisy: a single frame produces false positives scattered across the scene and
// misses parts of real objects. Real objects, however, keep producing hits at
// roughly the same place frame after frame. Accumulating the hits over a sliding
// window therefore turns a flickering set of boxes into a stable occupancy map.
//
// Key architectural principles:
// 1.  **Incremental Maintenance**: The grid is never recomputed from history. Each
//     new batch increments the cells its boxes cover and, once the window is full,
//     the oldest batch is replayed in reverse (decrementing). Cost is proportional
//     to the boxes entering and leaving the window, not to its length.
// 2.  **Exact Reversibility**: A batch is clipped to the grid identically when it
//     is added and when it is evicted, so eviction restores every cell it touched.
// 3.  **Warm-Up Threshold**: The read threshold is relaxed while the window holds
//     fewer than `2 * threshold` batches, but never drops below 3. It is derived
//     from the window length, so a short window can never raise the bar above
//     what its counters are able to reach.
// 4.  **Exclusive Ownership**: The counter buffer is private and only mutated by
//     `add`. Readers receive a thresholded copy.

use crate::core_modules::bbox::BBox;
use image::{GrayImage, Luma};
use std::collections::VecDeque;

/// The maximum value a cell can expose through `read`.
pub const HEAT_CEILING: u32 = u8::MAX as u32;
/// The effective threshold never drops below this value.
pub const MIN_EFFECTIVE_THRESHOLD: u32 = 3;

/// Maintains a per-pixel count of overlapping hot boxes over the last `history` frames.
#[derive(Debug, Clone)]
pub struct HeatmapAccumulator {
    /// Grid width in pixels (same as the video frame).
    width: u32,
    /// Grid height in pixels (same as the video frame).
    height: u32,
    /// Row-major counters, one per pixel.
    counters: Vec<u32>,
    /// The batches currently inside the window, oldest first.
    batches: VecDeque<Vec<BBox>>,
    /// How many batches the window holds before evicting.
    history: usize,
    /// The configured base threshold.
    threshold: u32,
    /// Every batch ever added, including evicted ones. Diagnostics only.
    batches_seen: u64,
}

impl HeatmapAccumulator {
    pub fn new(width: u32, height: u32, history: usize, threshold: u32) -> Self {
        Self {
            width,
            height,
            counters: vec![0; width as usize * height as usize],
            batches: VecDeque::with_capacity(history + 1),
            history,
            threshold,
            batches_seen: 0,
        }
    }

    /// Appends a batch of hot boxes and evicts the oldest batch if the window overflows.
    pub fn add(&mut self, batch: Vec<BBox>) {
        for bbox in &batch {
            self.paint(bbox, true);
        }
        self.batches.push_back(batch);
        self.batches_seen += 1;

        if self.batches.len() > self.history {
            if let Some(evicted) = self.batches.pop_front() {
                for bbox in &evicted {
                    self.paint(bbox, false);
                }
            }
        }
    }

    /// Returns the thresholded heatmap: cells clipped to 255, cells at or below the
    /// effective threshold zeroed.
    pub fn read(&self) -> GrayImage {
        let threshold = self.effective_threshold();
        let mut out = GrayImage::new(self.width, self.height);
        for (pixel, &count) in out.pixels_mut().zip(self.counters.iter()) {
            let clipped = count.min(HEAT_CEILING);
            if clipped > threshold {
                *pixel = Luma([clipped as u8]);
            }
        }
        out
    }

    /// `max(min(threshold, len() / 2), 3)`.
    pub fn effective_threshold(&self) -> u32 {
        let warm_up = u32::try_from(self.batches.len() / 2).unwrap_or(u32::MAX);
        self.threshold.min(warm_up).max(MIN_EFFECTIVE_THRESHOLD)
    }

    /// The raw, unclipped counter at `(x, y)`. Out-of-grid coordinates read as 0.
    pub fn counter(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.counters[y as usize * self.width as usize + x as usize]
    }

    /// Number of batches currently inside the window.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn batches_seen(&self) -> u64 {
        self.batches_seen
    }

    /// Clears every counter and forgets the history.
    pub fn reset(&mut self) {
        self.counters.iter_mut().for_each(|c| *c = 0);
        self.batches.clear();
        self.batches_seen = 0;
    }

    /// Increments or decrements every cell covered by `bbox`, half-open on both axes.
    fn paint(&mut self, bbox: &BBox, increment: bool) {
        let clipped = bbox.clip_to(self.width, self.height);
        let (x0, x1) = (clipped.min().x as usize, clipped.max().x as usize);
        let (y0, y1) = (clipped.min().y as usize, clipped.max().y as usize);
        let stride = self.width as usize;

        for y in y0..y1 {
            let row = &mut self.counters[y * stride + x0..y * stride + x1];
            for cell in row {
                *cell = if increment {
                    cell.saturating_add(1)
                } else {
                    cell.saturating_sub(1)
                };
            }
        }
    }
}
