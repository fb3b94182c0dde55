use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

use crate::error::{FilterError, FilterResult};

/// Formats that cannot store transparency; images are flattened to RGB first
const OPAQUE_FORMATS: [&str; 6] = ["bmp", "eps", "jpeg", "jpg", "pcx", "ppm"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    /// Identifier as requested, lowercased; also used as the file extension
    pub extension: String,
    pub format: ImageFormat,
}

impl OutputFormat {
    /// Resolve a format identifier such as `png`, `JPEG` or `tiff`
    pub fn from_identifier(identifier: &str) -> FilterResult<Self> {
        let extension = identifier.trim().trim_start_matches('.').to_lowercase();
        let format = ImageFormat::from_extension(&extension)
            .ok_or_else(|| FilterError::UnsupportedFormat(identifier.to_string()))?;

        if !format.writing_enabled() {
            return Err(FilterError::UnsupportedFormat(identifier.to_string()));
        }

        Ok(Self { extension, format })
    }

    /// Use the explicit identifier, else the input's extension, else JPEG
    pub fn resolve(explicit: Option<&str>, input: &Path) -> FilterResult<Self> {
        match explicit {
            Some(identifier) => Self::from_identifier(identifier),
            None => {
                let extension = input
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .filter(|ext| !ext.is_empty())
                    .unwrap_or("jpeg");
                Self::from_identifier(extension)
            }
        }
    }

    pub fn requires_opaque(&self) -> bool {
        OPAQUE_FORMATS.contains(&self.extension.as_str())
    }

    /// Convert `img` into a layout the encoder accepts
    pub fn prepare(&self, img: DynamicImage) -> DynamicImage {
        if self.requires_opaque() && !matches!(img, DynamicImage::ImageRgb8(_)) {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        }
    }
}

/// Where the output of `filter_name` goes: `<output>/<filter_name>.<ext>` when
/// `output` is an existing directory, otherwise `output` itself
pub fn resolve_output_path(output: &Path, filter_name: &str, format: &OutputFormat) -> PathBuf {
    if output.is_dir() {
        output.join(format!("{}.{}", filter_name, format.extension))
    } else {
        output.to_path_buf()
    }
}

/// Encode and write `img` to `path`
pub fn save_image(img: DynamicImage, path: &Path, format: &OutputFormat) -> FilterResult<()> {
    let prepared = format.prepare(img);
    prepared.save_with_format(path, format.format)?;
    Ok(())
}
