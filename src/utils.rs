use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::cli::Args;
use crate::image_processing::BatchEntry;

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let progress_style = ProgressStyle::with_template(
        "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(progress_style);
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// True when the input path was given and points at an existing file
pub fn is_valid_input(input: Option<&Path>) -> bool {
    matches!(input, Some(path) if path.is_file())
}

/// Validate command line arguments that do not depend on the input image
pub fn validate_inputs(args: &Args) -> Result<()> {
    if args.font_size == 0 || args.font_size > 1000 {
        return Err(anyhow::anyhow!(
            "Font size must be between 1 and 1000, got: {}",
            args.font_size
        ));
    }

    for (name, bound) in [("width", args.width), ("height", args.height)] {
        if bound == Some(0) {
            return Err(anyhow::anyhow!("--{} must be greater than 0", name));
        }
    }

    args.parse_font_color().map_err(|e| anyhow::anyhow!(e))?;
    args.parse_params().map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print warning message
pub fn warn_println(message: &str) {
    println!("{} {}", style("[WARNING]").yellow().bold(), message);
}

/// Print error message
pub fn error_println(message: &str) {
    println!("{} {}", style("[ERROR]").red().bold(), message);
}

/// Totals for a finished batch
#[derive(Debug)]
pub struct ProcessingStats {
    pub total_filters: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_duration: Duration,
}

impl ProcessingStats {
    pub fn from_entries(entries: &[BatchEntry], total_duration: Duration) -> Self {
        let successful = entries.iter().filter(|e| e.result.is_ok()).count();
        Self {
            total_filters: entries.len(),
            successful,
            failed: entries.len() - successful,
            total_duration,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_filters == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total_filters as f64) * 100.0
        }
    }

    pub fn average_duration(&self) -> Duration {
        if self.total_filters == 0 {
            Duration::new(0, 0)
        } else {
            self.total_duration / self.total_filters as u32
        }
    }
}
