use image::{ImageBuffer, Rgb, RgbImage};

/// A constant convolution kernel: `sum(weight * sample) / scale + offset`.
///
/// Weights are row-major over a square `size x size` window centred on the
/// output pixel. Samples outside the image replicate the nearest edge pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedKernel {
    pub name: &'static str,
    pub size: u32,
    pub scale: i32,
    pub offset: i32,
    pub weights: &'static [i32],
}

pub const BLUR: FixedKernel = FixedKernel {
    name: "blur",
    size: 5,
    scale: 16,
    offset: 0,
    weights: &[
        1, 1, 1, 1, 1, //
        1, 0, 0, 0, 1, //
        1, 0, 0, 0, 1, //
        1, 0, 0, 0, 1, //
        1, 1, 1, 1, 1,
    ],
};

pub const CONTOUR: FixedKernel = FixedKernel {
    name: "contour",
    size: 3,
    scale: 1,
    offset: 255,
    weights: &[-1, -1, -1, -1, 8, -1, -1, -1, -1],
};

pub const EDGE_ENHANCE: FixedKernel = FixedKernel {
    name: "edge_enhance",
    size: 3,
    scale: 2,
    offset: 0,
    weights: &[-1, -1, -1, -1, 10, -1, -1, -1, -1],
};

pub const EDGE_ENHANCE_MORE: FixedKernel = FixedKernel {
    name: "edge_enhance_more",
    size: 3,
    scale: 1,
    offset: 0,
    weights: &[-1, -1, -1, -1, 9, -1, -1, -1, -1],
};

pub const EMBOSS: FixedKernel = FixedKernel {
    name: "emboss",
    size: 3,
    scale: 1,
    offset: 128,
    weights: &[-1, 0, 0, 0, 1, 0, 0, 0, 0],
};

pub const FIND_EDGES: FixedKernel = FixedKernel {
    name: "find_edges",
    size: 3,
    scale: 1,
    offset: 0,
    weights: &[-1, -1, -1, -1, 8, -1, -1, -1, -1],
};

pub const SMOOTH: FixedKernel = FixedKernel {
    name: "smooth",
    size: 3,
    scale: 13,
    offset: 0,
    weights: &[1, 1, 1, 1, 5, 1, 1, 1, 1],
};

pub const SMOOTH_MORE: FixedKernel = FixedKernel {
    name: "smooth_more",
    size: 5,
    scale: 100,
    offset: 0,
    weights: &[
        1, 1, 1, 1, 1, //
        1, 5, 5, 5, 1, //
        1, 5, 44, 5, 1, //
        1, 5, 5, 5, 1, //
        1, 1, 1, 1, 1,
    ],
};

pub const SHARPEN: FixedKernel = FixedKernel {
    name: "sharpen",
    size: 3,
    scale: 16,
    offset: 0,
    weights: &[-2, -2, -2, -2, 32, -2, -2, -2, -2],
};

pub const EMBOSS_45D: FixedKernel = FixedKernel {
    name: "emboss_45d",
    size: 3,
    scale: 1,
    offset: 0,
    weights: &[-1, -1, 0, -1, 1, 1, 0, 1, 1],
};

pub const SHARP_EDGE: FixedKernel = FixedKernel {
    name: "sharp_edge",
    size: 3,
    scale: 1,
    offset: 0,
    weights: &[1, 1, 1, 1, -7, 1, 1, 1, 1],
};

pub const SHARP_CENTER: FixedKernel = FixedKernel {
    name: "sharp_center",
    size: 3,
    scale: -1,
    offset: 0,
    weights: &[1, 1, 1, 1, -9, 1, 1, 1, 1],
};

pub const EMBOSS_ASYMMETRIC: FixedKernel = FixedKernel {
    name: "emboss_asym",
    size: 3,
    scale: 1,
    offset: 0,
    weights: &[2, 0, 0, 0, -1, 0, 0, 0, -1],
};

/// Convolve an RGB image with a fixed kernel, each channel independently.
pub fn apply_kernel(img: &RgbImage, kernel: &FixedKernel) -> RgbImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let radius = (kernel.size / 2) as i64;
    let scale = if kernel.scale == 0 { 1.0 } else { kernel.scale as f32 };
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    ImageBuffer::from_fn(width, height, |x, y| {
        let mut sums = [0i32; 3];

        for ky in 0..kernel.size as i64 {
            let sy = (y as i64 + ky - radius).clamp(0, max_y) as u32;
            for kx in 0..kernel.size as i64 {
                let weight = kernel.weights[(ky * kernel.size as i64 + kx) as usize];
                if weight == 0 {
                    continue;
                }
                let sx = (x as i64 + kx - radius).clamp(0, max_x) as u32;
                let sample = img.get_pixel(sx, sy);
                for (sum, value) in sums.iter_mut().zip(sample.0.iter()) {
                    *sum += weight * *value as i32;
                }
            }
        }

        let channel = |sum: i32| -> u8 {
            (sum as f32 / scale + kernel.offset as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        };

        Rgb([channel(sums[0]), channel(sums[1]), channel(sums[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KERNELS: [FixedKernel; 13] = [
        BLUR,
        CONTOUR,
        EDGE_ENHANCE,
        EDGE_ENHANCE_MORE,
        EMBOSS,
        FIND_EDGES,
        SMOOTH,
        SMOOTH_MORE,
        SHARPEN,
        EMBOSS_45D,
        SHARP_EDGE,
        SHARP_CENTER,
        EMBOSS_ASYMMETRIC,
    ];

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 20 % 256) as u8, (y * 30 % 256) as u8, ((x + y) * 10 % 256) as u8])
        })
    }

    #[test]
    fn test_kernel_tables_are_square() {
        for kernel in ALL_KERNELS {
            assert_eq!(
                kernel.weights.len() as u32,
                kernel.size * kernel.size,
                "kernel {} has wrong weight count",
                kernel.name
            );
            assert_eq!(kernel.size % 2, 1);
        }
    }

    #[test]
    fn test_normalised_kernels_keep_flat_images() {
        // Kernels whose weights sum to their scale leave a constant image unchanged
        let flat = RgbImage::from_pixel(8, 8, Rgb([100, 150, 200]));
        for kernel in [BLUR, SMOOTH, SMOOTH_MORE, SHARPEN, EDGE_ENHANCE, EDGE_ENHANCE_MORE] {
            let out = apply_kernel(&flat, &kernel);
            assert!(
                out.pixels().all(|p| *p == Rgb([100, 150, 200])),
                "kernel {} changed a flat image",
                kernel.name
            );
        }
    }

    #[test]
    fn test_offset_kernels_on_flat_image() {
        let flat = RgbImage::from_pixel(6, 6, Rgb([40, 40, 40]));

        // Emboss weights sum to zero, so a flat image maps to the offset
        let embossed = apply_kernel(&flat, &EMBOSS);
        assert!(embossed.pixels().all(|p| *p == Rgb([128, 128, 128])));

        // Contour: zero response plus 255 offset saturates to white
        let contour = apply_kernel(&flat, &CONTOUR);
        assert!(contour.pixels().all(|p| *p == Rgb([255, 255, 255])));

        let edges = apply_kernel(&flat, &FIND_EDGES);
        assert!(edges.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_negative_scale_inverts_sign() {
        // sharp_center: weights sum to -1 and scale is -1, so flat stays flat
        let flat = RgbImage::from_pixel(5, 5, Rgb([77, 0, 255]));
        let out = apply_kernel(&flat, &SHARP_CENTER);
        assert!(out.pixels().all(|p| *p == Rgb([77, 0, 255])));
    }

    #[test]
    fn test_dimensions_preserved() {
        let img = create_test_image(13, 7);
        for kernel in ALL_KERNELS {
            assert_eq!(apply_kernel(&img, &kernel).dimensions(), (13, 7));
        }
    }

    #[test]
    fn test_find_edges_detects_step() {
        // Left half black, right half white
        let img = ImageBuffer::from_fn(10, 4, |x, _| {
            if x < 5 {
                Rgb([0u8, 0, 0])
            } else {
                Rgb([255u8, 255, 255])
            }
        });
        let edges = apply_kernel(&img, &FIND_EDGES);

        assert_eq!(edges.get_pixel(1, 1), &Rgb([0, 0, 0]));
        assert_eq!(edges.get_pixel(8, 1), &Rgb([0, 0, 0]));
        assert_eq!(edges.get_pixel(5, 1), &Rgb([255, 255, 255]));
    }
}
