//! Joint augmentations: every transform applies the same geometric change to
//! the image and its label mask so the pair stays aligned.

use image::imageops;
use image::{ImageBuffer, Pixel};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use super::Sample;

pub trait Transform {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Sample;
}

/// Crop a random `width × height` window; samples already that size pass through
#[derive(Debug, Clone, Copy)]
pub struct RandomCrop {
    pub width: u32,
    pub height: u32,
}

impl RandomCrop {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Transform for RandomCrop {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Sample {
        let (w, h) = sample.image.dimensions();
        let tw = self.width.min(w);
        let th = self.height.min(h);
        if tw == w && th == h {
            return sample;
        }

        let top = rng.gen_range(0..=h - th);
        let left = rng.gen_range(0..=w - tw);
        Sample {
            image: imageops::crop_imm(&sample.image, left, top, tw, th).to_image(),
            label: imageops::crop_imm(&sample.label, left, top, tw, th).to_image(),
        }
    }
}

/// Rotate counterclockwise by an angle drawn from a list of multiples of 90°
///
/// The canvas keeps its size; on non-square samples the corners uncovered by
/// the rotation are filled with zero in both image and label.
#[derive(Debug, Clone)]
pub struct RandomDiscreteRotation {
    angles: Vec<u32>,
}

impl RandomDiscreteRotation {
    /// Angles that are not multiples of 90 are dropped
    pub fn new(angles: &[u32]) -> Self {
        let angles = angles.iter().copied().filter(|a| a % 90 == 0).collect();
        Self { angles }
    }
}

impl Default for RandomDiscreteRotation {
    fn default() -> Self {
        Self::new(&[0, 90, 180, 270])
    }
}

impl Transform for RandomDiscreteRotation {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Sample {
        let Some(&angle) = self.angles.choose(rng) else {
            return sample;
        };
        let quarters = (angle / 90) % 4;
        if quarters == 0 {
            return sample;
        }
        Sample {
            image: rotate_quarters(&sample.image, quarters),
            label: rotate_quarters(&sample.label, quarters),
        }
    }
}

/// Counterclockwise rotation by `quarters × 90°` about the image center, same canvas
fn rotate_quarters<P: Pixel>(
    src: &ImageBuffer<P, Vec<P::Subpixel>>,
    quarters: u32,
) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (w, h) = src.dimensions();
    let (wi, hi) = (w as i64, h as i64);
    let mut out = ImageBuffer::new(w, h);

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (x, y) = (x as i64, y as i64);
        // Doubled source coordinates keep half-pixel centers exact
        let (sx2, sy2) = match quarters {
            1 => (wi + hi - 2 - 2 * y, 2 * x + hi - wi),
            2 => (2 * (wi - 1 - x), 2 * (hi - 1 - y)),
            _ => (2 * y + wi - hi, wi + hi - 2 - 2 * x),
        };
        let (sx, sy) = (sx2.div_euclid(2), sy2.div_euclid(2));
        if (0..wi).contains(&sx) && (0..hi).contains(&sy) {
            *pixel = *src.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
pub struct RandomHorizontalFlip {
    pub p: f64,
}

impl Default for RandomHorizontalFlip {
    fn default() -> Self {
        Self { p: 0.5 }
    }
}

impl Transform for RandomHorizontalFlip {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Sample {
        if rng.r#gen::<f64>() < self.p {
            Sample {
                image: imageops::flip_horizontal(&sample.image),
                label: imageops::flip_horizontal(&sample.label),
            }
        } else {
            sample
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RandomVerticalFlip {
    pub p: f64,
}

impl Default for RandomVerticalFlip {
    fn default() -> Self {
        Self { p: 0.5 }
    }
}

impl Transform for RandomVerticalFlip {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Sample {
        if rng.r#gen::<f64>() < self.p {
            Sample {
                image: imageops::flip_vertical(&sample.image),
                label: imageops::flip_vertical(&sample.label),
            }
        } else {
            sample
        }
    }
}

/// Apply transforms in order
#[derive(Default)]
pub struct Compose {
    transforms: Vec<Box<dyn Transform>>,
}

impl Compose {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    pub fn push(mut self, transform: impl Transform + 'static) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Flips and quarter-turn rotations, the usual augmentation for nadir imagery
    pub fn augmentation() -> Self {
        Self::default()
            .push(RandomHorizontalFlip::default())
            .push(RandomVerticalFlip::default())
            .push(RandomDiscreteRotation::default())
    }
}

impl Transform for Compose {
    fn apply(&self, sample: Sample, rng: &mut dyn RngCore) -> Sample {
        self.transforms
            .iter()
            .fold(sample, |sample, t| t.apply(sample, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Image and label both encode the source column and row of each pixel
    fn coded_sample(w: u32, h: u32) -> Sample {
        Sample {
            image: RgbImage::from_fn(w, h, |x, y| Rgb([x as u8 + 1, y as u8 + 1, 9])),
            label: GrayImage::from_fn(w, h, |x, y| Luma([(10 * (y + 1) + x + 1) as u8])),
        }
    }

    fn assert_aligned(sample: &Sample) {
        for (x, y, p) in sample.image.enumerate_pixels() {
            let label = sample.label.get_pixel(x, y).0[0];
            if p.0[2] == 0 {
                assert_eq!(label, 0);
            } else {
                assert_eq!(label as u32, 10 * p.0[1] as u32 + p.0[0] as u32);
            }
        }
    }

    #[test]
    fn test_rotation_quarter_turn_square() {
        let mut rng = StdRng::seed_from_u64(1);
        let rotated = RandomDiscreteRotation::new(&[90]).apply(coded_sample(3, 3), &mut rng);

        // Counterclockwise: the top-right source pixel moves to the top-left
        assert_eq!(*rotated.image.get_pixel(0, 0), Rgb([3, 1, 9]));
        assert_eq!(*rotated.image.get_pixel(0, 2), Rgb([1, 1, 9]));
        assert_aligned(&rotated);
    }

    #[test]
    fn test_rotation_half_turn() {
        let mut rng = StdRng::seed_from_u64(2);
        let rotated = RandomDiscreteRotation::new(&[180]).apply(coded_sample(4, 2), &mut rng);

        assert_eq!(*rotated.image.get_pixel(0, 0), Rgb([4, 2, 9]));
        assert_aligned(&rotated);
    }

    #[test]
    fn test_rotation_non_square_fills_with_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        let rotated = RandomDiscreteRotation::new(&[270]).apply(coded_sample(5, 3), &mut rng);

        assert_eq!(rotated.image.dimensions(), (5, 3));
        assert_eq!(*rotated.image.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(rotated.label.get_pixel(0, 0).0[0], 0);
        assert_aligned(&rotated);
    }

    #[test]
    fn test_rotation_zero_and_invalid_angles() {
        let mut rng = StdRng::seed_from_u64(4);
        let sample = coded_sample(3, 3);
        let same = RandomDiscreteRotation::new(&[0, 45]).apply(sample.clone(), &mut rng);
        assert_eq!(same, sample);
    }

    #[test]
    fn test_flips_move_pairs_together() {
        let mut rng = StdRng::seed_from_u64(5);
        let h = RandomHorizontalFlip { p: 1.0 }.apply(coded_sample(3, 2), &mut rng);
        assert_eq!(*h.image.get_pixel(0, 0), Rgb([3, 1, 9]));
        assert_aligned(&h);

        let v = RandomVerticalFlip { p: 1.0 }.apply(coded_sample(3, 2), &mut rng);
        assert_eq!(*v.image.get_pixel(0, 0), Rgb([1, 2, 9]));
        assert_aligned(&v);

        let none = RandomVerticalFlip { p: 0.0 }.apply(coded_sample(3, 2), &mut rng);
        assert_eq!(none, coded_sample(3, 2));
    }

    #[test]
    fn test_random_crop() {
        let mut rng = StdRng::seed_from_u64(6);
        let crop = RandomCrop::new(2, 2);
        for _ in 0..10 {
            let cropped = crop.apply(coded_sample(5, 4), &mut rng);
            assert_eq!(cropped.image.dimensions(), (2, 2));
            assert_eq!(cropped.label.dimensions(), (2, 2));
            assert_aligned(&cropped);
        }

        let whole = RandomCrop::new(5, 4).apply(coded_sample(5, 4), &mut rng);
        assert_eq!(whole, coded_sample(5, 4));
    }

    #[test]
    fn test_compose_keeps_alignment() {
        let mut rng = StdRng::seed_from_u64(7);
        let pipeline = Compose::augmentation().push(RandomCrop::new(3, 3));
        for _ in 0..20 {
            let out = pipeline.apply(coded_sample(4, 4), &mut rng);
            assert_eq!(out.image.dimensions(), (3, 3));
            assert_aligned(&out);
        }
    }
}
