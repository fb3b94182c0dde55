use image::{DynamicImage, GrayImage};
use std::f64::consts::PI;

use crate::error::{FilterError, FilterResult};

pub const DEFAULT_DEPTH: f64 = 10.0;

/// Light source elevation above the image plane, in radians
const LIGHT_ELEVATION: f64 = PI / 2.2;
/// Light source azimuth, in radians
const LIGHT_AZIMUTH: f64 = PI / 4.0;

/// Hand-drawn relief shading.
///
/// The intensity surface is treated as a height field: its gradient, scaled by
/// `depth / 100`, gives a surface normal per pixel, which is lit by a fixed
/// directional light. Output is always single-channel 8-bit.
pub fn hand_drawn(img: &DynamicImage, depth: f64) -> FilterResult<GrayImage> {
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(FilterError::InvalidImage(format!(
            "cannot shade an empty image ({}x{})",
            width, height
        )));
    }

    let grey = img.to_luma8();
    let intensity: Vec<f64> = grey.as_raw().iter().map(|&v| v as f64).collect();
    let (w, h) = (width as usize, height as usize);
    let at = |x: usize, y: usize| intensity[y * w + x];

    let lx = LIGHT_ELEVATION.cos() * LIGHT_AZIMUTH.cos();
    let ly = LIGHT_ELEVATION.cos() * LIGHT_AZIMUTH.sin();
    let lz = LIGHT_ELEVATION.sin();
    let factor = depth / 100.0;

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let (x, y) = (x as usize, y as usize);
        let gx = axis_gradient(x, w, |i| at(i, y)) * factor;
        let gy = axis_gradient(y, h, |i| at(x, i)) * factor;

        let a = (gx * gx + gy * gy + 1.0).sqrt();
        let (nx, ny, nz) = (gx / a, gy / a, 1.0 / a);

        let shade = 255.0 * (lx * nx + ly * ny + lz * nz);
        pixel.0[0] = shade.clamp(0.0, 255.0) as u8;
    }

    Ok(out)
}

/// Discrete derivative at `i` along an axis of length `len`: central
/// differences inside, one-sided differences at the borders.
fn axis_gradient<F>(i: usize, len: usize, sample: F) -> f64
where
    F: Fn(usize) -> f64,
{
    if len < 2 {
        0.0
    } else if i == 0 {
        sample(1) - sample(0)
    } else if i == len - 1 {
        sample(i) - sample(i - 1)
    } else {
        (sample(i + 1) - sample(i - 1)) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, RgbImage};

    #[test]
    fn test_flat_image_is_uniform() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(12, 9, Luma([90])));
        let out = hand_drawn(&img, DEFAULT_DEPTH).unwrap();

        let expected = (255.0 * LIGHT_ELEVATION.sin()) as u8;
        assert_eq!(expected, 252);
        assert_eq!(out.dimensions(), (12, 9));
        assert!(out.pixels().all(|p| p.0[0] == expected));
    }

    #[test]
    fn test_flat_colour_image_matches_grey() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 200, 30])));
        let out = hand_drawn(&img, DEFAULT_DEPTH).unwrap();
        assert!(out.pixels().all(|p| p.0[0] == 252));
    }

    #[test]
    fn test_output_clamped_for_steep_gradients() {
        // Alternating black/white columns and rows produce extreme gradients
        let img = DynamicImage::ImageLuma8(ImageBuffer::from_fn(16, 16, |x, y| {
            if (x / 2 + y) % 2 == 0 {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        }));

        for depth in [0.0, 10.0, 50.0, 100.0] {
            let out = hand_drawn(&img, depth).unwrap();
            assert_eq!(out.dimensions(), (16, 16));
            // Values are u8 so always within range; a steep slope facing away
            // from the light must not wrap around to bright values
            assert!(out.pixels().any(|p| p.0[0] < 252) || depth == 0.0);
        }
    }

    #[test]
    fn test_ramp_facing_away_from_light_is_darker() {
        // A steep ramp tips the normal away from the high light source
        let img = DynamicImage::ImageLuma8(ImageBuffer::from_fn(8, 8, |x, _| {
            Luma([(x * 30) as u8])
        }));
        let out = hand_drawn(&img, 100.0).unwrap();
        assert!(out.get_pixel(4, 4).0[0] < 252);
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 5));
        assert!(matches!(
            hand_drawn(&img, DEFAULT_DEPTH),
            Err(FilterError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_single_row_image() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(5, 1, Luma([7])));
        let out = hand_drawn(&img, DEFAULT_DEPTH).unwrap();
        assert_eq!(out.dimensions(), (5, 1));
    }

    #[test]
    fn test_axis_gradient() {
        let values = [0.0, 2.0, 6.0, 12.0];
        let sample = |i: usize| values[i];
        assert_eq!(axis_gradient(0, 4, sample), 2.0);
        assert_eq!(axis_gradient(1, 4, sample), 3.0);
        assert_eq!(axis_gradient(3, 4, sample), 6.0);
        assert_eq!(axis_gradient(0, 1, sample), 0.0);
    }
}
