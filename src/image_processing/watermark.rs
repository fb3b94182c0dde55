use ab_glyph::{FontVec, PxScale};
use image::{ColorType, DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::Path;

use crate::cli::Anchor;
use crate::error::{FilterError, FilterResult};

/// Text watermark settings with the font already resolved
pub struct TextMark {
    pub text: String,
    pub font: FontVec,
    pub size: f32,
    pub color: Rgba<u8>,
}

pub enum WatermarkKind {
    Image(RgbaImage),
    Text(TextMark),
}

pub struct Watermark {
    pub kind: WatermarkKind,
    pub anchor: Anchor,
}

impl Watermark {
    /// Load an image watermark from disk
    pub fn from_image_path(path: &Path, anchor: Anchor) -> FilterResult<Self> {
        if !path.is_file() {
            return Err(FilterError::InvalidWatermarkPath(path.to_path_buf()));
        }
        let overlay = image::open(path)
            .map_err(|e| FilterError::InvalidImage(format!("{}: {}", path.display(), e)))?
            .to_rgba8();

        Ok(Self {
            kind: WatermarkKind::Image(overlay),
            anchor,
        })
    }

    /// Build a text watermark, resolving `font_spec` to a font file
    pub fn from_text(
        text: &str,
        font_spec: &str,
        size: f32,
        color: [u8; 4],
        anchor: Anchor,
    ) -> FilterResult<Self> {
        if size <= 0.0 {
            return Err(FilterError::invalid_param(
                "font-size",
                &size.to_string(),
                "font size must be greater than 0",
            ));
        }

        Ok(Self {
            kind: WatermarkKind::Text(TextMark {
                text: text.to_string(),
                font: load_font(font_spec)?,
                size,
                color: Rgba(color),
            }),
            anchor,
        })
    }

    /// Composite the watermark onto `img`, keeping the image's own pixel layout
    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        let color_type = img.color();
        let mut canvas = img.to_rgba8();

        match &self.kind {
            WatermarkKind::Image(overlay) => overlay_image(&mut canvas, overlay, self.anchor),
            WatermarkKind::Text(mark) => draw_text(&mut canvas, mark, self.anchor),
        }

        restore_color_type(canvas, color_type)
    }
}

/// Top-left corner of a `mark_width x mark_height` box anchored inside the canvas.
/// Marks larger than the canvas start at the canvas edge and are clipped.
pub fn anchor_position(
    anchor: Anchor,
    canvas: (u32, u32),
    mark: (u32, u32),
) -> (u32, u32) {
    let right = canvas.0.saturating_sub(mark.0);
    let bottom = canvas.1.saturating_sub(mark.1);

    match anchor {
        Anchor::LeftTop => (0, 0),
        Anchor::RightTop => (right, 0),
        Anchor::LeftBottom => (0, bottom),
        Anchor::RightBottom => (right, bottom),
    }
}

/// Alpha-composite `overlay` onto `canvas` at the anchored corner
pub fn overlay_image(canvas: &mut RgbaImage, overlay: &RgbaImage, anchor: Anchor) {
    let (x0, y0) = anchor_position(anchor, canvas.dimensions(), overlay.dimensions());
    let (width, height) = canvas.dimensions();

    for (x, y, src) in overlay.enumerate_pixels() {
        let (px, py) = (x0 + x, y0 + y);
        if px < width && py < height {
            blend_over(canvas.get_pixel_mut(px, py), *src, 1.0);
        }
    }
}

/// Render `mark.text` into a coverage mask, then blend the fill colour through it
fn draw_text(canvas: &mut RgbaImage, mark: &TextMark, anchor: Anchor) {
    let scale = PxScale::from(mark.size);
    let (text_width, text_height) = text_size(scale, &mark.font, &mark.text);
    let (x0, y0) = anchor_position(
        anchor,
        canvas.dimensions(),
        (text_width as u32, text_height as u32),
    );

    let (width, height) = canvas.dimensions();
    let mut coverage = GrayImage::new(width, height);
    draw_text_mut(
        &mut coverage,
        Luma([255u8]),
        x0 as i32,
        y0 as i32,
        scale,
        &mark.font,
        &mark.text,
    );

    blend_coverage(canvas, &coverage, mark.color);
}

/// Blend `color` onto `canvas`, weighting each pixel by the mask value
pub fn blend_coverage(canvas: &mut RgbaImage, coverage: &GrayImage, color: Rgba<u8>) {
    for (dst, mask) in canvas.pixels_mut().zip(coverage.pixels()) {
        if mask.0[0] > 0 {
            blend_over(dst, color, mask.0[0] as f32 / 255.0);
        }
    }
}

/// Porter-Duff "over": `src` (scaled by `opacity`) composited onto `dst`
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, opacity: f32) {
    let src_alpha = src.0[3] as f32 / 255.0 * opacity;
    if src_alpha <= 0.0 {
        return;
    }
    if src_alpha >= 1.0 {
        *dst = Rgba([src.0[0], src.0[1], src.0[2], 255]);
        return;
    }

    let dst_alpha = dst.0[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src.0[c] as f32 * src_alpha
            + dst.0[c] as f32 * dst_alpha * (1.0 - src_alpha))
            / out_alpha;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(out);
}

fn restore_color_type(canvas: RgbaImage, color_type: ColorType) -> DynamicImage {
    let composed = DynamicImage::ImageRgba8(canvas);
    match color_type {
        ColorType::L8 => DynamicImage::ImageLuma8(composed.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(composed.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(composed.to_rgb8()),
        _ => composed,
    }
}

/// Load a font given as a path, a filename or a family name:
/// 1. Full path: "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf" -> loads directly
/// 2. Font filename: "DejaVuSans.ttf" -> searches common font directories
/// 3. Font name: "Arial" -> tries well-known locations for that family
pub fn load_font(font_spec: &str) -> FilterResult<FontVec> {
    if is_absolute_path(font_spec) {
        return load_font_from_path(font_spec)
            .ok_or_else(|| FilterError::FontNotFound(font_spec.to_string()));
    }

    if is_font_filename(font_spec) {
        for dir in FONT_DIRECTORIES {
            let font_path = format!("{}/{}", expand_path(dir), font_spec);
            if let Some(font) = load_font_from_path(&font_path) {
                return Ok(font);
            }
        }
    }

    for path in get_system_font_paths(font_spec) {
        if let Some(font) = load_font_from_path(&expand_path(&path)) {
            return Ok(font);
        }
    }

    Err(FilterError::FontNotFound(font_spec.to_string()))
}

fn load_font_from_path(font_path: &str) -> Option<FontVec> {
    let font_data = std::fs::read(font_path).ok()?;
    FontVec::try_from_vec(font_data).ok()
}

/// Unix absolute paths, UNC paths and Windows drive paths such as `C:\Fonts`
fn is_absolute_path(path: &str) -> bool {
    Path::new(path).is_absolute()
        || path.starts_with('\\')
        || path.as_bytes().get(1) == Some(&b':')
}

fn is_font_filename(name: &str) -> bool {
    let lower = name.to_lowercase();
    [".ttf", ".otf", ".ttc"].iter().any(|ext| lower.ends_with(ext))
}

/// Resolve a leading `~/` against `$HOME`
fn expand_path(path: &str) -> String {
    match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home, rest),
        _ => path.to_string(),
    }
}

const FONT_DIRECTORIES: [&str; 15] = [
    "/System/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
    "~/Library/Fonts",
    "/usr/share/fonts",
    "/usr/share/fonts/truetype",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/opentype",
    "/usr/local/share/fonts",
    "~/.fonts",
    "~/.local/share/fonts",
    "C:/Windows/Fonts",
    "/mnt/c/Windows/Fonts",
];

/// Candidate files for a bare font name such as "Arial" or "DejaVu Sans"
fn get_system_font_paths(font_name: &str) -> Vec<String> {
    let compact = font_name.replace(' ', "");
    let lower = compact.to_lowercase();
    let mut paths = Vec::new();

    for dir in FONT_DIRECTORIES {
        for stem in [font_name, compact.as_str(), lower.as_str()] {
            paths.push(format!("{}/{}.ttf", dir, stem));
            paths.push(format!("{}/{}.otf", dir, stem));
        }
    }

    match lower.as_str() {
        "arial" => {
            paths.push("/usr/share/fonts/truetype/msttcorefonts/Arial.ttf".to_string());
            paths.push(
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf".to_string(),
            );
        }
        "dejavusans" => {
            paths.push("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string());
            paths.push("/usr/share/fonts/TTF/DejaVuSans.ttf".to_string());
        }
        "helvetica" => {
            paths.push("/System/Library/Fonts/Helvetica.ttc".to_string());
        }
        _ => {}
    }

    paths
}
