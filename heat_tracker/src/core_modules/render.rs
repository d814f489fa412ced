// THEORY:
// Rendering is the last, purely cosmetic step: confirmed tracks are outlined on
// the output frame. Thick outlines are drawn as nested one-pixel rectangles,
// growing inward, so a box touching the frame edge stays visible.

use crate::core_modules::bbox::BBox;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

/// Outlines every box on the frame. Boxes are clipped to the frame; boxes that end
/// up with no area are skipped.
pub fn draw_tracks<'a>(
    frame: &mut RgbImage,
    boxes: impl IntoIterator<Item = &'a BBox>,
    color: [u8; 3],
    thickness: u32,
) {
    let (width, height) = frame.dimensions();
    for bbox in boxes {
        let clipped = bbox.clip_to(width, height);
        for inset in 0..thickness.max(1) {
            let w = clipped.width().saturating_sub(2 * inset);
            let h = clipped.height().saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at(clipped.min().x + inset as i32, clipped.min().y + inset as i32).of_size(w, h);
            draw_hollow_rect_mut(frame, rect, Rgb(color));
        }
    }
}
