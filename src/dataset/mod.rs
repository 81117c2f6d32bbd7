//! Reader for extracted `(image, mask)` tile pairs

pub mod preview;
pub mod transform;

pub use preview::{contact_sheet, label_sheet};
pub use transform::{
    Compose, RandomCrop, RandomDiscreteRotation, RandomHorizontalFlip, RandomVerticalFlip,
    Transform,
};

use image::{GrayImage, ImageBuffer, Pixel, RgbImage, imageops};
use rand::RngCore;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

use crate::error::{GridError, Result};

/// Number of aggregated classes: other, land, sand, reef
pub const CLASS_COUNT: u8 = 4;

/// One training pair; the label holds aggregated class ids
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub image: RgbImage,
    pub label: GrayImage,
}

/// Collapse raw habitat codes into training classes
///
/// land 1 → 1, sand 2 → 2, unknown 3 → 0, reef 4 → 3, none 15 → 0. Any other
/// value is kept as is.
pub fn aggregate_label(value: u8) -> u8 {
    match value {
        3 | 15 => 0,
        4 => 3,
        other => other,
    }
}

pub struct TileDataset {
    images_dir: PathBuf,
    masks_dir: PathBuf,
    pixel_dim: u32,
    names: Vec<String>,
    transform: Option<Box<dyn Transform>>,
}

impl TileDataset {
    /// List the PNG tiles under `root/images`, paired with `root/masks`
    pub fn open(root: &Path, pixel_dim: u32) -> Result<Self> {
        let images_dir = root.join("images");
        let masks_dir = root.join("masks");
        if !images_dir.is_dir() {
            return Err(GridError::Dataset(format!(
                "no image directory at {}",
                images_dir.display()
            )));
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&images_dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str()
                && name.ends_with("png")
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        log::debug!("Found {} tiles in {}", names.len(), images_dir.display());

        Ok(Self {
            images_dir,
            masks_dir,
            pixel_dim,
            names,
            transform: None,
        })
    }

    pub fn with_transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Keep `n` tiles drawn at random without replacement
    pub fn subset(mut self, n: usize, rng: &mut dyn RngCore) -> Result<Self> {
        if n > self.names.len() {
            return Err(GridError::Dataset(format!(
                "cannot draw {} tiles from {}",
                n,
                self.names.len()
            )));
        }
        self.names = self.names.choose_multiple(rng, n).cloned().collect();
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Load pair `index` and apply the transform, if any
    pub fn get(&self, index: usize) -> Result<Sample> {
        self.get_with_rng(index, &mut rand::thread_rng())
    }

    pub fn get_with_rng(&self, index: usize, rng: &mut dyn RngCore) -> Result<Sample> {
        let name = self.names.get(index).ok_or_else(|| {
            GridError::Dataset(format!(
                "index {} out of range for {} tiles",
                index,
                self.names.len()
            ))
        })?;

        let mask_path = self.masks_dir.join(name);
        if !mask_path.exists() {
            return Err(GridError::Dataset(format!(
                "no mask for {} at {}",
                name,
                mask_path.display()
            )));
        }

        // Alpha and any extra bands are dropped
        let raw_image = image::open(self.images_dir.join(name))?.to_rgb8();
        let raw_label = image::open(&mask_path)?.to_luma8();

        let image = crop_top_left(&raw_image, self.pixel_dim);
        let mut label = crop_top_left(&raw_label, self.pixel_dim);
        for pixel in label.pixels_mut() {
            pixel.0[0] = aggregate_label(pixel.0[0]);
        }

        let sample = Sample { image, label };
        Ok(match &self.transform {
            Some(t) => t.apply(sample, rng),
            None => sample,
        })
    }
}

/// Top-left `dim × dim` window, clamped to the image size
fn crop_top_left<P: Pixel + 'static>(
    image: &ImageBuffer<P, Vec<P::Subpixel>>,
    dim: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (w, h) = image.dimensions();
    imageops::crop_imm(image, 0, 0, dim.min(w), dim.min(h)).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, Rgba, RgbaImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::tempdir;

    fn write_pair(root: &Path, name: &str, size: u32, raw_label: u8) {
        std::fs::create_dir_all(root.join("images")).unwrap();
        std::fs::create_dir_all(root.join("masks")).unwrap();
        RgbaImage::from_pixel(size, size, Rgba([10, 20, 30, 255]))
            .save(root.join("images").join(name))
            .unwrap();
        GrayImage::from_pixel(size, size, Luma([raw_label]))
            .save(root.join("masks").join(name))
            .unwrap();
    }

    #[test]
    fn test_aggregate_label() {
        assert_eq!(aggregate_label(1), 1);
        assert_eq!(aggregate_label(2), 2);
        assert_eq!(aggregate_label(3), 0);
        assert_eq!(aggregate_label(4), 3);
        assert_eq!(aggregate_label(15), 0);
        assert_eq!(aggregate_label(0), 0);
        assert_eq!(aggregate_label(7), 7);
    }

    #[test]
    fn test_open_lists_png_only() {
        let dir = tempdir().unwrap();
        write_pair(dir.path(), "oahu-1.png", 4, 1);
        write_pair(dir.path(), "oahu-0.png", 4, 1);
        std::fs::write(
            dir.path().join("images").join("oahu-0.pgw"),
            "1\n0\n0\n-1\n0\n0\n",
        )
        .unwrap();

        let dataset = TileDataset::open(dir.path(), 4).unwrap();
        assert_eq!(
            dataset.names().to_vec(),
            vec!["oahu-0.png".to_string(), "oahu-1.png".to_string()]
        );
    }

    #[test]
    fn test_get_crops_and_remaps() {
        let dir = tempdir().unwrap();
        write_pair(dir.path(), "maui-3.png", 6, 4);

        let dataset = TileDataset::open(dir.path(), 4).unwrap();
        let sample = dataset.get(0).unwrap();

        assert_eq!(sample.image.dimensions(), (4, 4));
        assert_eq!(sample.label.dimensions(), (4, 4));
        assert_eq!(*sample.image.get_pixel(0, 0), Rgb([10, 20, 30]));
        assert!(sample.label.pixels().all(|p| p.0[0] == 3));
    }

    #[test]
    fn test_get_applies_transform() {
        let dir = tempdir().unwrap();
        write_pair(dir.path(), "kauai-0.png", 8, 15);

        let dataset = TileDataset::open(dir.path(), 8)
            .unwrap()
            .with_transform(RandomCrop::new(5, 5));
        let mut rng = StdRng::seed_from_u64(11);
        let sample = dataset.get_with_rng(0, &mut rng).unwrap();

        assert_eq!(sample.image.dimensions(), (5, 5));
        assert!(sample.label.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_missing_mask_is_an_error() {
        let dir = tempdir().unwrap();
        write_pair(dir.path(), "lanai-0.png", 4, 1);
        std::fs::remove_file(dir.path().join("masks").join("lanai-0.png")).unwrap();

        let dataset = TileDataset::open(dir.path(), 4).unwrap();
        assert!(matches!(dataset.get(0), Err(GridError::Dataset(_))));
        assert!(matches!(dataset.get(5), Err(GridError::Dataset(_))));
    }

    #[test]
    fn test_subset() {
        let dir = tempdir().unwrap();
        for i in 0..6 {
            write_pair(dir.path(), &format!("hawaii-{}.png", i), 2, 2);
        }
        let mut rng = StdRng::seed_from_u64(3);

        let dataset = TileDataset::open(dir.path(), 2).unwrap();
        let subset = dataset.subset(3, &mut rng).unwrap();
        assert_eq!(subset.len(), 3);

        let mut names = subset.names().to_vec();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);

        let dataset = TileDataset::open(dir.path(), 2).unwrap();
        assert!(dataset.subset(7, &mut rng).is_err());
    }
}
