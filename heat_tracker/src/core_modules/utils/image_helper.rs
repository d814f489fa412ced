pub mod image_helper {
    use crate::error::Result;
    use image::{GrayImage, Luma, RgbImage};
    use std::path::Path;

    /// Loads any supported image file as an 8-bit RGB frame.
    pub fn load_frame(path: impl AsRef<Path>) -> Result<RgbImage> {
        Ok(image::open(path)?.to_rgb8())
    }

    /// Saves a frame; the format is picked from the file extension.
    pub fn save_frame(path: impl AsRef<Path>, frame: &RgbImage) -> Result<()> {
        frame.save(path)?;
        Ok(())
    }

    /// Stretches a thresholded heatmap so its hottest cell is white. Cells that
    /// survived the threshold stay non-zero.
    pub fn heatmap_preview(heatmap: &GrayImage) -> GrayImage {
        let peak = heatmap.pixels().map(|p| p[0]).max().unwrap_or(0);
        if peak == 0 {
            return heatmap.clone();
        }
        GrayImage::from_fn(heatmap.width(), heatmap.height(), |x, y| {
            let value = heatmap.get_pixel(x, y)[0] as u32;
            if value == 0 {
                Luma([0])
            } else {
                Luma([(value * 255 / peak as u32).max(1) as u8])
            }
        })
    }

    pub fn save_heatmap(path: impl AsRef<Path>, heatmap: &GrayImage) -> Result<()> {
        heatmap_preview(heatmap).save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::image_helper::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn frame_round_trips_through_png() {
        let path = std::env::temp_dir().join("heat_tracker_gradient_frame.png");
        let frame = RgbImage::from_fn(32, 16, |x, y| Rgb([(x * 8) as u8, (y * 16) as u8, 0]));

        save_frame(&path, &frame).expect("Error Saving File.");
        let loaded = load_frame(&path).expect("Error Loading File.");
        assert_eq!(loaded, frame);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn preview_stretches_to_white() {
        let mut heat = GrayImage::new(4, 1);
        heat.put_pixel(0, 0, Luma([4]));
        heat.put_pixel(1, 0, Luma([8]));

        let preview = heatmap_preview(&heat);
        assert_eq!(preview.get_pixel(0, 0)[0], 127);
        assert_eq!(preview.get_pixel(1, 0)[0], 255);
        assert_eq!(preview.get_pixel(2, 0)[0], 0);
    }
}
