//! ESRI world files: the six-line affine transform sidecar of an image
//!
//! ```text
//! A   pixel width (x per column)
//! D   row rotation
//! B   column rotation
//! E   pixel height (y per row, negative for north-up)
//! C   x of the center of the top-left pixel
//! F   y of the center of the top-left pixel
//! ```

use std::path::{Path, PathBuf};

use crate::error::{GridError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldFile {
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl WorldFile {
    /// North-up transform whose top-left pixel *corner* is at (`left`, `top`)
    pub fn north_up(left: f64, top: f64, pixel_size: f64) -> Self {
        Self {
            pixel_width: pixel_size,
            row_rotation: 0.0,
            col_rotation: 0.0,
            pixel_height: -pixel_size,
            origin_x: left + pixel_size / 2.0,
            origin_y: top - pixel_size / 2.0,
        }
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let invalid = |reason: String| GridError::WorldFile {
            path: path.to_path_buf(),
            reason,
        };

        let values = text
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>()
                    .map_err(|e| invalid(format!("{:?}: {}", v, e)))
            })
            .collect::<Result<Vec<f64>>>()?;

        let [a, d, b, e, c, f] = values[..] else {
            return Err(invalid(format!("expected 6 values, found {}", values.len())));
        };
        if a == 0.0 || e == 0.0 {
            return Err(invalid("zero pixel size".to_string()));
        }

        Ok(Self {
            pixel_width: a,
            row_rotation: d,
            col_rotation: b,
            pixel_height: e,
            origin_x: c,
            origin_y: f,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let text = format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n",
            self.pixel_width,
            self.row_rotation,
            self.col_rotation,
            self.pixel_height,
            self.origin_x,
            self.origin_y
        );
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// Fractional pixel position of a world coordinate; integers fall on pixel corners
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let left = self.origin_x - self.pixel_width / 2.0;
        let top = self.origin_y - self.pixel_height / 2.0;
        ((x - left) / self.pixel_width, (y - top) / self.pixel_height)
    }

    /// World coordinate of the center of pixel (`col`, `row`)
    pub fn pixel_center(&self, col: u32, row: u32) -> (f64, f64) {
        (
            self.origin_x + col as f64 * self.pixel_width,
            self.origin_y + row as f64 * self.pixel_height,
        )
    }

    /// Transform of a window whose top-left pixel is (`col`, `row`) of this raster
    pub fn shifted(&self, col: i64, row: i64) -> Self {
        Self {
            origin_x: self.origin_x + col as f64 * self.pixel_width,
            origin_y: self.origin_y + row as f64 * self.pixel_height,
            ..*self
        }
    }

    /// Transform of the same extent resampled with pixels `sx` and `sy` times as large
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        let left = self.origin_x - self.pixel_width / 2.0;
        let top = self.origin_y - self.pixel_height / 2.0;
        let pixel_width = self.pixel_width * sx;
        let pixel_height = self.pixel_height * sy;
        Self {
            pixel_width,
            pixel_height,
            origin_x: left + pixel_width / 2.0,
            origin_y: top + pixel_height / 2.0,
            ..*self
        }
    }
}

/// Candidate sidecar paths for an image, most specific first
///
/// `mosaic.tif` → `mosaic.tfw`, `mosaic.tifw`, `mosaic.wld`
pub fn sidecar_candidates(image: &Path) -> Vec<PathBuf> {
    let ext = image
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let mut candidates = Vec::new();
    let mut chars = ext.chars();
    if let (Some(first), Some(last)) = (chars.next(), chars.next_back()) {
        candidates.push(image.with_extension(format!("{}{}w", first, last)));
    }
    if !ext.is_empty() {
        candidates.push(image.with_extension(format!("{}w", ext)));
    }
    candidates.push(image.with_extension("wld"));
    candidates
}

/// World file path written next to an extracted tile
pub fn sidecar_path(image: &Path) -> PathBuf {
    sidecar_candidates(image)
        .into_iter()
        .next()
        .unwrap_or_else(|| image.with_extension("wld"))
}

/// Locate and read the world file of an image
pub fn read_sidecar(image: &Path) -> Result<WorldFile> {
    for candidate in sidecar_candidates(image) {
        if candidate.exists() {
            return WorldFile::read(&candidate);
        }
    }
    Err(GridError::WorldFile {
        path: image.to_path_buf(),
        reason: "no world file next to image".to_string(),
    })
}
