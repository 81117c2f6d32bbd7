use geo::Rect;
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::path::Path;

use super::world_file::{WorldFile, read_sidecar};
use crate::error::{GridError, Result};

/// Georeferenced RGB raster covering one island
#[derive(Debug, Clone)]
pub struct Mosaic {
    image: RgbImage,
    transform: WorldFile,
}

/// A fixed-size window clipped from a mosaic, with its own transform
#[derive(Debug, Clone)]
pub struct Tile {
    pub image: RgbImage,
    pub transform: WorldFile,
}

impl Mosaic {
    pub fn new(image: RgbImage, transform: WorldFile) -> Result<Self> {
        if !transform.is_north_up() {
            return Err(GridError::RotatedRaster);
        }
        Ok(Self { image, transform })
    }

    /// Open an image and its world file sidecar; extra bands beyond RGB are dropped
    pub fn open(path: &Path) -> Result<Self> {
        let transform = read_sidecar(path)?;
        if !transform.is_north_up() {
            return Err(GridError::WorldFile {
                path: path.to_path_buf(),
                reason: "rotated rasters are not supported".to_string(),
            });
        }
        let image = image::open(path)?.to_rgb8();
        log::debug!(
            "Opened mosaic {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self { image, transform })
    }

    pub fn transform(&self) -> &WorldFile {
        &self.transform
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Copy a pixel window; pixels outside the mosaic stay black
    fn read_window(&self, col0: i64, row0: i64, cols: u32, rows: u32) -> RgbImage {
        let (width, height) = self.image.dimensions();
        let inside = col0 >= 0
            && row0 >= 0
            && col0 + cols as i64 <= width as i64
            && row0 + rows as i64 <= height as i64;
        if inside {
            return imageops::crop_imm(&self.image, col0 as u32, row0 as u32, cols, rows)
                .to_image();
        }

        let mut window = RgbImage::new(cols, rows);
        for (x, y, pixel) in window.enumerate_pixels_mut() {
            let col = col0 + x as i64;
            let row = row0 + y as i64;
            if (0..width as i64).contains(&col) && (0..height as i64).contains(&row) {
                *pixel = *self.image.get_pixel(col as u32, row as u32);
            }
        }
        window
    }

    /// Clip the mosaic to a world-space rectangle as a `size × size` tile
    ///
    /// The window is snapped to the mosaic's pixel grid. When the rectangle does
    /// not span exactly `size` mosaic pixels the window is resampled with
    /// nearest-neighbour so labels and colors are never blended.
    pub fn clip(&self, rect: &Rect<f64>, size: u32) -> Tile {
        let t = &self.transform;
        let (c0, r0) = t.to_pixel(rect.min().x, rect.max().y);
        let (c1, r1) = t.to_pixel(rect.max().x, rect.min().y);

        let col0 = c0.min(c1).round() as i64;
        let row0 = r0.min(r1).round() as i64;
        let cols = ((c1 - c0).abs().round() as u32).max(1);
        let rows = ((r1 - r0).abs().round() as u32).max(1);

        let window = self.read_window(col0, row0, cols, rows);
        let transform = t.shifted(col0, row0);

        if cols == size && rows == size {
            Tile {
                image: window,
                transform,
            }
        } else {
            Tile {
                image: imageops::resize(&window, size, size, FilterType::Nearest),
                transform: transform.scaled(cols as f64 / size as f64, rows as f64 / size as f64),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use image::Rgb;

    /// 20 x 20 mosaic at 1 m, top-left corner (1000, 2000); red = column, green = row
    fn gradient_mosaic() -> Mosaic {
        let image = RgbImage::from_fn(20, 20, |x, y| Rgb([x as u8, y as u8, 255]));
        Mosaic::new(image, WorldFile::north_up(1000.0, 2000.0, 1.0)).unwrap()
    }

    #[test]
    fn test_clip_inside() {
        let mosaic = gradient_mosaic();
        let rect = Rect::new(coord! { x: 1005.0, y: 1990.0 }, coord! { x: 1010.0, y: 1995.0 });

        let tile = mosaic.clip(&rect, 5);

        assert_eq!(tile.image.dimensions(), (5, 5));
        assert_eq!(*tile.image.get_pixel(0, 0), Rgb([5, 5, 255]));
        assert_eq!(*tile.image.get_pixel(4, 4), Rgb([9, 9, 255]));
        assert_eq!(tile.transform.to_pixel(1005.0, 1995.0), (0.0, 0.0));
    }

    #[test]
    fn test_clip_pads_outside_with_black() {
        let mosaic = gradient_mosaic();
        let rect = Rect::new(coord! { x: 998.0, y: 1998.0 }, coord! { x: 1002.0, y: 2002.0 });

        let tile = mosaic.clip(&rect, 4);

        assert_eq!(*tile.image.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*tile.image.get_pixel(1, 3), Rgb([0, 0, 0]));
        assert_eq!(*tile.image.get_pixel(2, 2), Rgb([0, 0, 255]));
        assert_eq!(*tile.image.get_pixel(3, 3), Rgb([1, 1, 255]));
    }

    #[test]
    fn test_clip_resamples_to_requested_size() {
        let mosaic = gradient_mosaic();
        let rect = Rect::new(coord! { x: 1000.0, y: 1980.0 }, coord! { x: 1020.0, y: 2000.0 });

        let tile = mosaic.clip(&rect, 10);

        assert_eq!(tile.image.dimensions(), (10, 10));
        assert_eq!(tile.transform.pixel_width, 2.0);
        assert_eq!(tile.transform.to_pixel(1020.0, 1980.0), (10.0, 10.0));
    }

    #[test]
    fn test_rotated_transform_rejected() {
        let mut wf = WorldFile::north_up(0.0, 0.0, 1.0);
        wf.row_rotation = 0.1;
        let err = Mosaic::new(RgbImage::new(1, 1), wf).unwrap_err();
        assert!(matches!(err, GridError::RotatedRaster));
        assert_eq!(err.to_string(), "rotated rasters are not supported");
    }

    #[test]
    fn test_open_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oahu.tif");
        RgbImage::from_pixel(8, 6, Rgb([10, 20, 30])).save(&path).unwrap();
        WorldFile::north_up(0.0, 6.0, 1.0)
            .write(&dir.path().join("oahu.tfw"))
            .unwrap();

        let mosaic = Mosaic::open(&path).unwrap();
        assert_eq!(mosaic.dimensions(), (8, 6));
    }
}
