// THEORY:
// Candidate generation tiles a search region of the frame with square windows
// that overlap by a fixed fraction. The tiling depends only on the frame shape
// and the configuration, so it is computed once per detector and reused for
// every frame. Order is row-major (top row first, left to right) and is part of
// the contract: the same configuration always yields the same sequence.

use crate::config::SearchRegion;
use crate::core_modules::bbox::BBox;

/// Resolves optional region bounds against the frame: a missing start is 0, a
/// missing stop is the frame edge, and stops never exceed the frame.
fn resolve_span(start: Option<u32>, stop: Option<u32>, extent: u32) -> (u32, u32) {
    let stop = stop.unwrap_or(extent).min(extent);
    let start = start.unwrap_or(0).min(stop);
    (start, stop)
}

/// Generates the overlapping candidate windows for a frame.
pub fn slide_window(
    frame_width: u32,
    frame_height: u32,
    region: &SearchRegion,
    window: u32,
    overlap: f64,
) -> Vec<BBox> {
    if window == 0 {
        return Vec::new();
    }

    let (x_start, x_stop) = resolve_span(region.x_start, region.x_stop, frame_width);
    let (y_start, y_stop) = resolve_span(region.y_start, region.y_stop, frame_height);

    let step = ((window as f64 * (1.0 - overlap)) as u32).max(1);
    let buffer = (window as f64 * overlap) as u32;
    let count = |span: u32| span.saturating_sub(buffer) / step;

    let nx = count(x_stop - x_start);
    let ny = count(y_stop - y_start);

    let mut windows = Vec::with_capacity(nx as usize * ny as usize);
    for row in 0..ny {
        for col in 0..nx {
            let x0 = (col * step + x_start) as i32;
            let y0 = (row * step + y_start) as i32;
            windows.push(BBox::from_coords(x0, y0, x0 + window as i32, y0 + window as i32));
        }
    }
    windows
}
