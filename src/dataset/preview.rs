use image::{GrayImage, ImageBuffer, Pixel, RgbImage, imageops};

use super::CLASS_COUNT;

/// Tile images on a black canvas, `nrow` per row, each framed by `pad` pixels
fn sheet<P: Pixel + 'static>(
    images: &[ImageBuffer<P, Vec<P::Subpixel>>],
    nrow: u32,
    pad: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let per_row = nrow.max(1);
    let cell_w = images.iter().map(|i| i.width()).max().unwrap_or(0) + 2 * pad;
    let cell_h = images.iter().map(|i| i.height()).max().unwrap_or(0) + 2 * pad;
    let count = images.len() as u32;
    let cols = count.min(per_row);
    let rows = count.div_ceil(per_row);

    let mut canvas = ImageBuffer::new(cols * cell_w, rows * cell_h);
    for (i, image) in images.iter().enumerate() {
        let i = i as u32;
        let x = (i % per_row) * cell_w + pad;
        let y = (i / per_row) * cell_h + pad;
        imageops::replace(&mut canvas, image, x as i64, y as i64);
    }
    canvas
}

/// Contact sheet of RGB tiles
pub fn contact_sheet(images: &[RgbImage], nrow: u32, pad: u32) -> RgbImage {
    sheet(images, nrow, pad)
}

/// Contact sheet of label masks with class ids stretched to the full gray range
pub fn label_sheet(labels: &[GrayImage], nrow: u32, pad: u32) -> GrayImage {
    let scale = 255 / (CLASS_COUNT as u32 - 1);
    let stretched: Vec<GrayImage> = labels
        .iter()
        .map(|label| {
            let mut out = label.clone();
            for p in out.pixels_mut() {
                p.0[0] = (p.0[0] as u32 * scale).min(255) as u8;
            }
            out
        })
        .collect();
    sheet(&stretched, nrow, pad)
}
