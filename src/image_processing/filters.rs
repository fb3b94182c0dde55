//! Filter catalog and dispatch.
//!
//! Every filter is a variant of the closed [`FilterKind`] enum. Raw `KEY=VALUE`
//! parameters are turned into a typed [`Filter`] once, at dispatch time, and the
//! typed filter is applied with an exhaustive `match`.

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::kernel::{self, apply_kernel, FixedKernel};
use super::rank::{rank_filter, RankOp};
use super::relief;
use crate::error::{FilterError, FilterResult};

/// Names of every registered filter, in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display, AsRefStr)]
pub enum FilterKind {
    #[strum(serialize = "rgb")]
    Rgb,
    #[strum(serialize = "grey")]
    Greyscale,
    #[strum(serialize = "hand_drawn")]
    HandDrawn,
    #[strum(serialize = "edge_curve")]
    EdgeCurve,
    #[strum(serialize = "blur")]
    Blur,
    #[strum(serialize = "contour")]
    Contour,
    #[strum(serialize = "edge_enhance")]
    EdgeEnhance,
    #[strum(serialize = "emboss")]
    Emboss,
    #[strum(serialize = "smooth")]
    Smooth,
    #[strum(serialize = "sharpen")]
    Sharpen,
    #[strum(serialize = "gaussian_blur")]
    GaussianBlur,
    #[strum(serialize = "min")]
    Min,
    #[strum(serialize = "median")]
    Median,
    #[strum(serialize = "max")]
    Max,
    #[strum(serialize = "mode")]
    Mode,
    #[strum(serialize = "unsharp_mask")]
    UnsharpMask,
    #[strum(serialize = "emboss_45d")]
    Emboss45d,
    #[strum(serialize = "sharp_edge")]
    SharpEdge,
    #[strum(serialize = "sharp_center")]
    SharpCenter,
    #[strum(serialize = "emboss_asym")]
    EmbossAsymmetric,
}

impl FilterKind {
    /// Full catalog in registration order
    pub fn catalog() -> Vec<FilterKind> {
        FilterKind::iter().collect()
    }

    /// Filter used when none is requested
    pub fn default_filter() -> FilterKind {
        FilterKind::Rgb
    }

    pub fn from_name(name: &str) -> FilterResult<FilterKind> {
        FilterKind::from_str(name).map_err(|_| FilterError::UnknownFilter(name.to_string()))
    }
}

/// Raw filter parameters collected from `-a KEY=VALUE`.
///
/// The same set is handed to every filter of a batch, so keys a filter does not
/// understand are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    values: BTreeMap<String, String>,
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `KEY=VALUE` entries
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> FilterResult<Self> {
        let mut params = Self::new();
        for entry in entries {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    params.insert(key.trim(), value.trim());
                }
                _ => {
                    return Err(FilterError::invalid_param(
                        entry,
                        "",
                        "expected KEY=VALUE",
                    ))
                }
            }
        }
        Ok(params)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn number<T: FromStr>(&self, key: &str, default: T) -> FilterResult<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<T>()
                .map_err(|_| FilterError::invalid_param(key, raw, "not a number")),
        }
    }

    /// A flag is set when its key is present, unless the value reads as false
    fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            None => false,
            Some(raw) => !matches!(
                raw.to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            ),
        }
    }

    /// Blur radius; any finite value is accepted, non-positive ones disable the blur
    fn radius(&self, key: &str, default: f32) -> FilterResult<f32> {
        let radius: f32 = self.number(key, default)?;
        if !radius.is_finite() {
            return Err(FilterError::invalid_param(
                key,
                &radius.to_string(),
                "radius must be a finite number",
            ));
        }
        Ok(radius)
    }

    fn odd_size(&self, key: &str, default: u32) -> FilterResult<u32> {
        let size = self.number(key, default)?;
        if size == 0 || size % 2 == 0 {
            return Err(FilterError::invalid_param(
                key,
                &size.to_string(),
                "neighbourhood size must be a positive odd number",
            ));
        }
        Ok(size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnsharpParams {
    pub radius: f32,
    pub percent: i32,
    pub threshold: i32,
}

impl Default for UnsharpParams {
    fn default() -> Self {
        Self {
            radius: 2.0,
            percent: 150,
            threshold: 3,
        }
    }
}

/// A filter with its parameters resolved and validated
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Rgb,
    Greyscale,
    HandDrawn { depth: f64 },
    GaussianBlur { radius: f32 },
    Rank { op: RankOp, size: u32 },
    UnsharpMask(UnsharpParams),
    Kernel(FixedKernel),
}

impl Filter {
    /// Build the typed filter for `kind`, applying defaults for missing parameters
    pub fn from_params(kind: FilterKind, params: &FilterParams) -> FilterResult<Filter> {
        let filter = match kind {
            FilterKind::Rgb => Filter::Rgb,
            FilterKind::Greyscale => Filter::Greyscale,
            FilterKind::HandDrawn => {
                let depth = params.number("depth", relief::DEFAULT_DEPTH)?;
                if !(0.0..=100.0).contains(&depth) {
                    return Err(FilterError::invalid_param(
                        "depth",
                        &depth.to_string(),
                        "depth must be between 0 and 100",
                    ));
                }
                Filter::HandDrawn { depth }
            }
            FilterKind::EdgeCurve => Filter::Kernel(kernel::FIND_EDGES),
            FilterKind::Blur => Filter::Kernel(kernel::BLUR),
            FilterKind::Contour => Filter::Kernel(kernel::CONTOUR),
            FilterKind::EdgeEnhance => Filter::Kernel(if params.flag("more") {
                kernel::EDGE_ENHANCE_MORE
            } else {
                kernel::EDGE_ENHANCE
            }),
            FilterKind::Emboss => Filter::Kernel(kernel::EMBOSS),
            FilterKind::Smooth => Filter::Kernel(if params.flag("more") {
                kernel::SMOOTH_MORE
            } else {
                kernel::SMOOTH
            }),
            FilterKind::Sharpen => Filter::Kernel(kernel::SHARPEN),
            FilterKind::GaussianBlur => Filter::GaussianBlur {
                radius: params.radius("radius", 2.0)?,
            },
            FilterKind::Min => Filter::Rank {
                op: RankOp::Min,
                size: params.odd_size("size", 3)?,
            },
            FilterKind::Median => Filter::Rank {
                op: RankOp::Median,
                size: params.odd_size("size", 3)?,
            },
            FilterKind::Max => Filter::Rank {
                op: RankOp::Max,
                size: params.odd_size("size", 3)?,
            },
            FilterKind::Mode => Filter::Rank {
                op: RankOp::Mode,
                size: params.odd_size("size", 3)?,
            },
            FilterKind::UnsharpMask => {
                let defaults = UnsharpParams::default();
                Filter::UnsharpMask(UnsharpParams {
                    radius: params.radius("radius", defaults.radius)?,
                    percent: params.number("percent", defaults.percent)?,
                    threshold: params.number("threshold", defaults.threshold)?,
                })
            }
            FilterKind::Emboss45d => Filter::Kernel(kernel::EMBOSS_45D),
            FilterKind::SharpEdge => Filter::Kernel(kernel::SHARP_EDGE),
            FilterKind::SharpCenter => Filter::Kernel(kernel::SHARP_CENTER),
            FilterKind::EmbossAsymmetric => Filter::Kernel(kernel::EMBOSS_ASYMMETRIC),
        };

        Ok(filter)
    }

    /// Apply the filter to `img`, returning a new image
    pub fn apply(&self, img: &DynamicImage) -> FilterResult<DynamicImage> {
        let output = match self {
            Filter::Rgb => DynamicImage::ImageRgb8(img.to_rgb8()),
            Filter::Greyscale => DynamicImage::ImageLuma8(img.to_luma8()),
            Filter::HandDrawn { depth } => {
                DynamicImage::ImageLuma8(relief::hand_drawn(img, *depth)?)
            }
            Filter::GaussianBlur { radius } => {
                DynamicImage::ImageRgb8(gaussian_blur(&img.to_rgb8(), *radius))
            }
            Filter::Rank { op, size } => {
                DynamicImage::ImageRgb8(rank_filter(&img.to_rgb8(), *op, *size))
            }
            Filter::UnsharpMask(params) => {
                DynamicImage::ImageRgb8(unsharp_mask(&img.to_rgb8(), params))
            }
            Filter::Kernel(fixed) => DynamicImage::ImageRgb8(apply_kernel(&img.to_rgb8(), fixed)),
        };

        Ok(output)
    }
}

/// Resolve `name`, build its typed parameters and apply it
pub fn apply(name: &str, img: &DynamicImage, params: &FilterParams) -> FilterResult<DynamicImage> {
    let kind = FilterKind::from_name(name)?;
    Filter::from_params(kind, params)?.apply(img)
}

/// Gaussian blur with `radius` as the standard deviation
fn gaussian_blur(img: &RgbImage, radius: f32) -> RgbImage {
    if radius <= 0.0 || img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    gaussian_blur_f32(img, radius)
}

/// Sharpen by adding back `percent` of the difference to a blurred copy,
/// wherever that difference reaches `threshold`
fn unsharp_mask(img: &RgbImage, params: &UnsharpParams) -> RgbImage {
    let blurred = gaussian_blur(img, params.radius);

    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        let original = img.get_pixel(x, y);
        let soft = blurred.get_pixel(x, y);
        let mut out = [0u8; 3];

        for c in 0..3 {
            let value = original.0[c] as i64;
            let diff = value - soft.0[c] as i64;
            out[c] = if diff.abs() >= params.threshold as i64 {
                (value + diff * params.percent as i64 / 100).clamp(0, 255) as u8
            } else {
                original.0[c]
            };
        }

        Rgb(out)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GrayImage, Luma};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 25 % 256) as u8, (y * 25 % 256) as u8, 128])
        }))
    }

    #[test]
    fn test_catalog_order_and_names() {
        let names: Vec<String> = FilterKind::catalog().iter().map(|k| k.to_string()).collect();
        assert_eq!(names.len(), 20);
        assert_eq!(names[0], "rgb");
        assert_eq!(names[1], "grey");
        assert_eq!(names[2], "hand_drawn");
        assert_eq!(names.last().map(String::as_str), Some("emboss_asym"));
        assert_eq!(FilterKind::default_filter(), FilterKind::catalog()[0]);
    }

    #[test]
    fn test_names_round_trip_through_catalog() {
        for kind in FilterKind::catalog() {
            assert_eq!(FilterKind::from_name(kind.as_ref()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_filter() {
        let img = create_test_image(4, 4);
        let result = apply("nonexistent", &img, &FilterParams::new());
        assert!(matches!(result, Err(FilterError::UnknownFilter(name)) if name == "nonexistent"));
    }

    #[test]
    fn test_every_filter_keeps_dimensions() {
        let img = create_test_image(9, 6);
        for kind in FilterKind::catalog() {
            let out = apply(kind.as_ref(), &img, &FilterParams::new()).unwrap();
            assert_eq!((out.width(), out.height()), (9, 6), "filter {}", kind);
        }
    }

    #[test]
    fn test_output_color_types() {
        let img = create_test_image(4, 4);
        let params = FilterParams::new();
        assert_eq!(apply("grey", &img, &params).unwrap().color(), ColorType::L8);
        assert_eq!(apply("hand_drawn", &img, &params).unwrap().color(), ColorType::L8);
        assert_eq!(apply("rgb", &img, &params).unwrap().color(), ColorType::Rgb8);
        assert_eq!(apply("emboss", &img, &params).unwrap().color(), ColorType::Rgb8);

        let grey = DynamicImage::ImageLuma8(GrayImage::from_pixel(3, 3, Luma([50])));
        assert_eq!(apply("blur", &grey, &params).unwrap().color(), ColorType::Rgb8);
    }

    #[test]
    fn test_parse_params() {
        let params = FilterParams::parse(&["radius=5", " size = 7 ", "more="]).unwrap();
        assert_eq!(params.get("radius"), Some("5"));
        assert_eq!(params.get("size"), Some("7"));
        assert_eq!(params.get("more"), Some(""));

        assert!(FilterParams::parse(&["radius"]).is_err());
        assert!(FilterParams::parse(&["=3"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let params = FilterParams::new();
        assert_eq!(
            Filter::from_params(FilterKind::GaussianBlur, &params).unwrap(),
            Filter::GaussianBlur { radius: 2.0 }
        );
        assert_eq!(
            Filter::from_params(FilterKind::Median, &params).unwrap(),
            Filter::Rank {
                op: RankOp::Median,
                size: 3
            }
        );
        assert_eq!(
            Filter::from_params(FilterKind::UnsharpMask, &params).unwrap(),
            Filter::UnsharpMask(UnsharpParams {
                radius: 2.0,
                percent: 150,
                threshold: 3
            })
        );
        assert_eq!(
            Filter::from_params(FilterKind::HandDrawn, &params).unwrap(),
            Filter::HandDrawn { depth: 10.0 }
        );
    }

    #[test]
    fn test_more_flag() {
        let mut params = FilterParams::new();
        params.insert("more", "1");
        assert_eq!(
            Filter::from_params(FilterKind::Smooth, &params).unwrap(),
            Filter::Kernel(kernel::SMOOTH_MORE)
        );

        params.insert("more", "false");
        assert_eq!(
            Filter::from_params(FilterKind::EdgeEnhance, &params).unwrap(),
            Filter::Kernel(kernel::EDGE_ENHANCE)
        );
    }

    #[test]
    fn test_invalid_params() {
        let mut params = FilterParams::new();
        params.insert("size", "4");
        assert!(matches!(
            Filter::from_params(FilterKind::Min, &params),
            Err(FilterError::InvalidParameter { .. })
        ));

        params.insert("size", "abc");
        assert!(Filter::from_params(FilterKind::Max, &params).is_err());

        let mut params = FilterParams::new();
        params.insert("depth", "250");
        assert!(Filter::from_params(FilterKind::HandDrawn, &params).is_err());

        // Parameters a filter does not use are ignored
        let mut params = FilterParams::new();
        params.insert("size", "4");
        assert!(Filter::from_params(FilterKind::GaussianBlur, &params).is_ok());
    }

    #[test]
    fn test_non_finite_radius_rejected() {
        let img = create_test_image(4, 4);
        for name in ["gaussian_blur", "unsharp_mask"] {
            for raw in ["nan", "inf", "-inf"] {
                let mut params = FilterParams::new();
                params.insert("radius", raw);
                assert!(
                    matches!(
                        apply(name, &img, &params),
                        Err(FilterError::InvalidParameter { .. })
                    ),
                    "{} radius={}",
                    name,
                    raw
                );
            }
        }
    }

    #[test]
    fn test_unsharp_mask_huge_percent_saturates() {
        let img = ImageBuffer::from_fn(32, 4, |x, _| {
            if x < 16 {
                Rgb([60u8, 60, 60])
            } else {
                Rgb([180u8, 180, 180])
            }
        });
        let params = UnsharpParams {
            percent: 100_000_000,
            ..UnsharpParams::default()
        };
        let out = unsharp_mask(&img, &params);
        assert_eq!(out.get_pixel(15, 1).0[0], 0);
        assert_eq!(out.get_pixel(16, 1).0[0], 255);
        assert_eq!(out.get_pixel(0, 1).0[0], 60);
        assert_eq!(out.get_pixel(31, 1).0[0], 180);
    }

    #[test]
    fn test_gaussian_zero_radius_is_identity() {
        let img = create_test_image(5, 5);
        let mut params = FilterParams::new();
        params.insert("radius", "0");
        let out = apply("gaussian_blur", &img, &params).unwrap();
        assert_eq!(out.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_unsharp_mask_keeps_flat_image() {
        let flat = RgbImage::from_pixel(6, 6, Rgb([90, 90, 90]));
        let out = unsharp_mask(&flat, &UnsharpParams::default());
        assert_eq!(out, flat);
    }

    #[test]
    fn test_unsharp_mask_increases_edge_contrast() {
        let img = ImageBuffer::from_fn(12, 4, |x, _| {
            if x < 6 {
                Rgb([60u8, 60, 60])
            } else {
                Rgb([180u8, 180, 180])
            }
        });
        let out = unsharp_mask(&img, &UnsharpParams::default());
        assert!(out.get_pixel(5, 1).0[0] < 60);
        assert!(out.get_pixel(6, 1).0[0] > 180);
    }
}
