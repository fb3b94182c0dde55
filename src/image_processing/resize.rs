use fast_image_resize::{
    images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
};
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

use crate::error::{FilterError, FilterResult};

/// Dimensions that fit `(width, height)` inside the bounding box, keeping the
/// aspect ratio and never growing the image. A missing bound keeps the
/// current size along that axis.
pub fn fit_dimensions(
    width: u32,
    height: u32,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> (u32, u32) {
    let box_width = max_width.unwrap_or(width) as f64;
    let box_height = max_height.unwrap_or(height) as f64;

    let scale = (box_width / width as f64)
        .min(box_height / height as f64)
        .min(1.0);

    if scale >= 1.0 {
        return (width, height);
    }

    let new_width = ((width as f64 * scale).round() as u32).clamp(1, width);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, height);
    (new_width, new_height)
}

/// Bounding-box resize ("fit within", never upscale) with Lanczos3 resampling.
///
/// When neither bound is given the image is returned untouched.
pub fn fit_within(
    img: DynamicImage,
    max_width: Option<u32>,
    max_height: Option<u32>,
) -> FilterResult<DynamicImage> {
    if max_width.is_none() && max_height.is_none() {
        return Ok(img);
    }
    for (name, bound) in [("width", max_width), ("height", max_height)] {
        if bound == Some(0) {
            return Err(FilterError::invalid_param(
                name,
                "0",
                "resize bounds must be greater than 0",
            ));
        }
    }

    let (src_width, src_height) = (img.width(), img.height());
    if src_width == 0 || src_height == 0 {
        return Err(FilterError::InvalidImage(format!(
            "cannot resize an empty image ({}x{})",
            src_width, src_height
        )));
    }

    let (width, height) = fit_dimensions(src_width, src_height, max_width, max_height);
    if (width, height) == (src_width, src_height) {
        return Ok(img);
    }

    let src = (src_width, src_height);
    let dst = (width, height);
    let resized = match img {
        DynamicImage::ImageLuma8(buf) => {
            let pixels = resize_raw(buf.into_raw(), src, dst, PixelType::U8)?;
            DynamicImage::ImageLuma8(from_raw(GrayImage::from_raw(width, height, pixels))?)
        }
        DynamicImage::ImageLumaA8(buf) => {
            let pixels = resize_raw(buf.into_raw(), src, dst, PixelType::U8x2)?;
            DynamicImage::ImageLumaA8(from_raw(GrayAlphaImage::from_raw(width, height, pixels))?)
        }
        DynamicImage::ImageRgb8(buf) => {
            let pixels = resize_raw(buf.into_raw(), src, dst, PixelType::U8x3)?;
            DynamicImage::ImageRgb8(from_raw(RgbImage::from_raw(width, height, pixels))?)
        }
        other => {
            // Everything else is resampled as 8-bit RGBA
            let pixels = resize_raw(other.to_rgba8().into_raw(), src, dst, PixelType::U8x4)?;
            DynamicImage::ImageRgba8(from_raw(RgbaImage::from_raw(width, height, pixels))?)
        }
    };

    Ok(resized)
}

fn resize_raw(
    src_pixels: Vec<u8>,
    (src_width, src_height): (u32, u32),
    (width, height): (u32, u32),
    pixel_type: PixelType,
) -> FilterResult<Vec<u8>> {
    let src_image = Image::from_vec_u8(src_width, src_height, src_pixels, pixel_type)
        .map_err(|e| FilterError::Resize(e.to_string()))?;

    let mut dst_image = Image::new(width, height, pixel_type);

    let mut resizer = Resizer::new();
    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| FilterError::Resize(e.to_string()))?;

    Ok(dst_image.buffer().to_vec())
}

fn from_raw<T>(buffer: Option<T>) -> FilterResult<T> {
    buffer.ok_or_else(|| FilterError::Resize("resized buffer has the wrong length".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgba};

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                (x % 256) as u8,
                (y % 256) as u8,
                ((x + y) % 256) as u8,
            ])
        })
    }

    #[test]
    fn test_fit_dimensions_width_only() {
        assert_eq!(fit_dimensions(200, 400, Some(100), None), (100, 200));
    }

    #[test]
    fn test_fit_dimensions_height_only() {
        assert_eq!(fit_dimensions(300, 200, None, Some(100)), (150, 100));
    }

    #[test]
    fn test_fit_dimensions_box() {
        // Limited by the tighter side
        assert_eq!(fit_dimensions(400, 300, Some(200), Some(200)), (200, 150));
        assert_eq!(fit_dimensions(300, 400, Some(200), Some(200)), (150, 200));
    }

    #[test]
    fn test_fit_dimensions_never_upscales() {
        assert_eq!(fit_dimensions(50, 40, Some(500), Some(400)), (50, 40));
        assert_eq!(fit_dimensions(50, 40, Some(500), None), (50, 40));
    }

    #[test]
    fn test_fit_dimensions_keeps_at_least_one_pixel() {
        assert_eq!(fit_dimensions(1000, 2, Some(10), None), (10, 1));
    }

    #[test]
    fn test_fit_within_rgb() {
        let img = DynamicImage::ImageRgb8(create_test_image(200, 400));
        let resized = fit_within(img, Some(100), None).unwrap();

        assert_eq!((resized.width(), resized.height()), (100, 200));
        assert!(resized.width() <= 200 && resized.height() <= 400);
        assert!(matches!(resized, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_fit_within_keeps_greyscale_layout() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 20, Luma([99])));
        let resized = fit_within(img, Some(20), Some(20)).unwrap();

        assert_eq!((resized.width(), resized.height()), (20, 10));
        let grey = match resized {
            DynamicImage::ImageLuma8(buf) => buf,
            other => panic!("unexpected layout {:?}", other.color()),
        };
        // A flat image stays flat after resampling
        assert!(grey.pixels().all(|p| p.0[0] == 99));
    }

    #[test]
    fn test_fit_within_rgba() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 255])));
        let resized = fit_within(img, Some(5), None).unwrap();
        assert_eq!((resized.width(), resized.height()), (5, 5));
    }

    #[test]
    fn test_fit_within_no_bounds_is_noop() {
        let img = DynamicImage::ImageRgb8(create_test_image(30, 20));
        let same = fit_within(img.clone(), None, None).unwrap();
        assert_eq!(same, img);
    }

    #[test]
    fn test_fit_within_rejects_zero_bound() {
        let img = DynamicImage::ImageRgb8(create_test_image(30, 20));
        assert!(fit_within(img, Some(0), None).is_err());
    }
}
