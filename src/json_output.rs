//! JSON output for scripted callers
//!
//! When --json is given, progress and results are emitted as JSON lines to
//! stdout in place of the styled report.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::image_processing::{BatchEntry, FilterSelection};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    /// Requested filter names that are not in the catalog
    Skipped { filters: Vec<String> },
    /// Progress update
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    /// Filter output written
    FilterCompleted {
        filter: String,
        output_path: String,
        width: u32,
        height: u32,
        processing_time_ms: u128,
    },
    /// Filter failed; the batch carried on
    FilterFailed { filter: String, error: String },
    /// Processing summary
    Summary {
        total_filters: usize,
        processed: usize,
        failed: usize,
        duration_secs: f64,
    },
    /// Run aborted before any filter ran
    Error { message: String },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn skipped(selection: &FilterSelection) {
        if !selection.skipped.is_empty() {
            Self::Skipped {
                filters: selection.skipped.clone(),
            }
            .emit();
        }
    }

    pub fn progress(current: usize, total: usize, message: impl Into<String>) {
        Self::Progress {
            current,
            total,
            message: message.into(),
        }
        .emit();
    }

    /// Build the completed/failed message for one batch entry
    pub fn from_entry(entry: &BatchEntry) -> Self {
        match &entry.result {
            Ok(result) => Self::FilterCompleted {
                filter: entry.filter.to_string(),
                output_path: display(&result.output_path),
                width: result.width,
                height: result.height,
                processing_time_ms: result.elapsed.as_millis(),
            },
            Err(e) => Self::FilterFailed {
                filter: entry.filter.to_string(),
                error: e.to_string(),
            },
        }
    }

    pub fn summary(total_filters: usize, processed: usize, failed: usize, duration: Duration) {
        Self::Summary {
            total_filters,
            processed,
            failed,
            duration_secs: duration.as_secs_f64(),
        }
        .emit();
    }

    pub fn error(message: impl Into<String>) {
        Self::Error {
            message: message.into(),
        }
        .emit();
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
