// THEORY:
// The `blob_detector` is the spatial grouping layer. It takes the thresholded
// heatmap, where only the zero/non-zero distinction matters, and splits the
// foreground into connected regions. Each region is one probable object.
//
// Key architectural principles & algorithm steps:
// 1.  **Labeling Contract**: `RegionLabeler` is the seam. Anything that returns a
//     region count and a same-shaped label grid (0 = background, 1..=count =
//     region ids) can be plugged in.
// 2.  **4-Connectivity**: `FourConnectedLabeler` only merges pixels that touch
//     along a cardinal direction. Two pixels touching only at a corner are
//     separate regions. An 8-connected labeler would change region counts, so
//     the connectivity is part of the type, not a flag. `ImageprocLabeler`
//     produces the same labeling through `imageproc`'s union-find pass.
// 3.  **Deterministic Order**: Labels are assigned in raster order of each
//     region's first pixel (top-to-bottom, left-to-right). Association downstream
//     is order-sensitive, so this order is part of the contract.
// 4.  **Data Aggregation**: `extract_blobs` reduces the label grid to one bounding
//     box per region in a single pass. Labels outside `1..=count` are ignored.

use crate::core_modules::bbox::BBox;
use crate::core_modules::blob::Blob;
use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::VecDeque;

/// The result of connected-component labeling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeling {
    pub width: u32,
    pub height: u32,
    /// Number of foreground regions.
    pub count: u32,
    /// Row-major region ids, 0 for background.
    pub labels: Vec<u32>,
}

impl Labeling {
    pub fn label_at(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.labels[y as usize * self.width as usize + x as usize]
    }
}

/// Splits the non-zero pixels of a mask into labeled regions.
pub trait RegionLabeler {
    fn label(&self, mask: &GrayImage) -> Labeling;
}

/// Breadth-first flood fill over the four cardinal neighbours.
#[derive(Debug, Clone, Copy, Default)]
pub struct FourConnectedLabeler;

const CARDINALS: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

impl RegionLabeler for FourConnectedLabeler {
    fn label(&self, mask: &GrayImage) -> Labeling {
        let (width, height) = mask.dimensions();
        let (w, h) = (width as usize, height as usize);
        let foreground: Vec<bool> = mask.pixels().map(|p| p[0] != 0).collect();
        let mut labels = vec![0u32; w * h];
        let mut count = 0u32;
        let mut queue = VecDeque::new();

        for start in 0..w * h {
            if !foreground[start] || labels[start] != 0 {
                continue;
            }

            count += 1;
            labels[start] = count;
            queue.push_back(start);

            while let Some(index) = queue.pop_front() {
                let (x, y) = ((index % w) as i64, (index / w) as i64);
                for (dx, dy) in CARDINALS {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let neighbour = ny as usize * w + nx as usize;
                    if foreground[neighbour] && labels[neighbour] == 0 {
                        labels[neighbour] = count;
                        queue.push_back(neighbour);
                    }
                }
            }
        }

        Labeling {
            width,
            height,
            count,
            labels,
        }
    }
}

/// 4-connected labeling backed by `imageproc::region_labelling`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocLabeler;

impl RegionLabeler for ImageprocLabeler {
    fn label(&self, mask: &GrayImage) -> Labeling {
        // imageproc only joins neighbours of equal value, so flatten the heat first.
        let binary = threshold(mask, 0, ThresholdType::Binary);
        let components = connected_components(&binary, Connectivity::Four, Luma([0u8]));
        let (width, height) = components.dimensions();
        let labels = components.into_raw();
        let count = labels.iter().copied().max().unwrap_or(0);

        Labeling {
            width,
            height,
            count,
            labels,
        }
    }
}

/// Reduces a label grid to one `Blob` per region, ordered by label.
pub fn extract_blobs(labeling: &Labeling) -> Vec<Blob> {
    let regions = labeling.count as usize;
    if regions == 0 {
        return Vec::new();
    }

    // (min_x, min_y, max_x, max_y, pixel_count) per region.
    let mut extents = vec![(u32::MAX, u32::MAX, 0u32, 0u32, 0usize); regions];
    let width = labeling.width.max(1) as usize;

    for (index, &label) in labeling.labels.iter().enumerate() {
        let Some(extent) = (label as usize).checked_sub(1).and_then(|i| extents.get_mut(i)) else {
            continue;
        };
        let (x, y) = ((index % width) as u32, (index / width) as u32);
        extent.0 = extent.0.min(x);
        extent.1 = extent.1.min(y);
        extent.2 = extent.2.max(x);
        extent.3 = extent.3.max(y);
        extent.4 += 1;
    }

    extents
        .into_iter()
        .enumerate()
        .filter(|(_, extent)| extent.4 > 0)
        .map(|(i, (x0, y0, x1, y1, pixels))| {
            let bbox = BBox::from_coords(x0 as i32, y0 as i32, x1 as i32, y1 as i32);
            Blob::new(i as u32 + 1, bbox, pixels)
        })
        .collect()
}
