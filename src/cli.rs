use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::image_processing::filters::FilterParams;

/// Corner a watermark is anchored to
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// Left-top corner
    #[default]
    #[value(name = "LT")]
    #[serde(rename = "LT")]
    LeftTop,
    /// Right-top corner
    #[value(name = "RT")]
    #[serde(rename = "RT")]
    RightTop,
    /// Left-bottom corner
    #[value(name = "LB")]
    #[serde(rename = "LB")]
    LeftBottom,
    /// Right-bottom corner
    #[value(name = "RB")]
    #[serde(rename = "RB")]
    RightBottom,
}

#[derive(Parser, Debug)]
#[command(
    name = "image-filter",
    version,
    disable_version_flag = true,
    about = "Collection of image filters.",
    long_about = "
Image Filter - apply a catalog of filters to an image

Runs one or more named filters against a single input image. Each result can be
resized to fit a bounding box and stamped with an image or text watermark before
it is written out.

Example Usage:
  # List the available filters
  image-filter --list

  # Greyscale and emboss, written to ./out/grey.png and ./out/emboss.png
  image-filter -i photo.png -o ./out -f grey emboss

  # Every filter, as JPEG thumbnails no wider than 320 pixels
  image-filter -i photo.png -o ./out --all-filters -t jpeg --width 320

  # Gaussian blur with a larger radius
  image-filter -i photo.png -o blurred.png -f gaussian_blur -a radius=5

  # Text watermark in the bottom-right corner
  image-filter -i photo.png -o ./out -f sharpen -x \"(c) 2024\" -p RB \\
    --font DejaVuSans.ttf --font-size 24 --font-color 255,255,255,180"
)]
pub struct Args {
    /// Print version
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    pub version: (),

    /// List filters
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Filter name or a list of names
    #[arg(short = 'f', long = "filter", num_args = 1.., value_name = "NAME")]
    pub filters: Vec<String>,

    /// Use all filters, disregard --filter option if exists
    #[arg(long = "all-filters")]
    pub all_filters: bool,

    /// Input image path
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output image path or directory (for multi filters)
    #[arg(short = 'o', long = "output", value_name = "PATH|DIR")]
    pub output: Option<PathBuf>,

    /// Output image type (defaults to the input extension)
    #[arg(short = 't', long = "type", value_name = "FORMAT")]
    pub output_type: Option<String>,

    /// Filter parameter as KEY=VALUE (can be specified multiple times)
    #[arg(short = 'a', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Image width (height can be calculated), can be used to create thumbnail
    #[arg(long = "width", value_name = "N")]
    pub width: Option<u32>,

    /// Image height (width can be calculated), can be used to create thumbnail
    #[arg(long = "height", value_name = "N")]
    pub height: Option<u32>,

    /// Watermark image path
    #[arg(
        short = 'm',
        long = "water-mark",
        value_name = "PATH",
        conflicts_with = "water_mark_text"
    )]
    pub water_mark: Option<PathBuf>,

    /// Watermark text
    #[arg(short = 'x', long = "water-mark-text", value_name = "TEXT")]
    pub water_mark_text: Option<String>,

    /// Watermark position
    #[arg(
        short = 'p',
        long = "water-mark-pos",
        value_name = "POS",
        ignore_case = true,
        default_value = "LT"
    )]
    pub water_mark_pos: Anchor,

    /// Font for the text watermark. Supports three formats:
    /// - Font name: "Arial" (searches system fonts)
    /// - Font filename: "Arial.ttf" (searches in font directories)
    /// - Full path: "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf" (loads directly)
    #[arg(long = "font", default_value = "Arial", value_name = "FONT")]
    pub font: String,

    /// Font size for the text watermark
    #[arg(long = "font-size", default_value = "20", value_name = "SIZE")]
    pub font_size: u32,

    /// Font color for the text watermark as R,G,B,A
    #[arg(long = "font-color", default_value = "0,0,0,255", value_name = "R,G,B,A")]
    pub font_color: String,

    /// JSON configuration file; command-line options take precedence
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Enable verbose output with detailed progress information
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Emit progress and results as JSON lines instead of styled text
    #[arg(long = "json")]
    pub json: bool,
}

impl Args {
    /// Output path, defaulting to the current directory
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Parse the `-a KEY=VALUE` entries
    pub fn parse_params(&self) -> Result<FilterParams, String> {
        FilterParams::parse(self.params.as_slice()).map_err(|e| e.to_string())
    }

    /// Parse the font color string into RGBA components
    pub fn parse_font_color(&self) -> Result<[u8; 4], String> {
        parse_rgba(&self.font_color)
    }
}

/// Parse `R,G,B` or `R,G,B,A` with components in 0-255; alpha defaults to 255
pub fn parse_rgba(color: &str) -> Result<[u8; 4], String> {
    let parts: Vec<&str> = color.split(',').map(|s| s.trim()).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(format!(
            "Invalid color '{}'. Use R,G,B or R,G,B,A (e.g., 0,0,0,255)",
            color
        ));
    }

    let mut rgba = [0u8, 0, 0, 255];
    for (i, part) in parts.iter().enumerate() {
        rgba[i] = part
            .parse::<u8>()
            .map_err(|_| format!("Invalid color component '{}' in '{}'", part, color))?;
    }

    Ok(rgba)
}
