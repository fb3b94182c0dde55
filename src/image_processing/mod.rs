pub mod filters;
pub mod kernel;
pub mod output;
pub mod rank;
pub mod relief;
pub mod resize;
pub mod watermark;

use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{FilterError, FilterResult};
use crate::utils::verbose_println;
use filters::{Filter, FilterKind, FilterParams};
use output::{resolve_output_path, save_image, OutputFormat};
use watermark::Watermark;

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub filters: Vec<FilterKind>,
    pub params: FilterParams,
    pub output: PathBuf,
    pub output_format: OutputFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub verbose: bool,
}

/// Outcome of one filter that ran to completion
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub filter: FilterKind,
    pub output_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub elapsed: Duration,
}

/// One entry of a batch: the filter and how it went
#[derive(Debug)]
pub struct BatchEntry {
    pub filter: FilterKind,
    pub result: FilterResult<ProcessingResult>,
}

/// Requested filter names resolved against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub filters: Vec<FilterKind>,
    /// Requested names that are not in the catalog
    pub skipped: Vec<String>,
}

/// Resolve the filters to run: the whole catalog for `all`, else the known
/// names from `requested` (unknown names are skipped), else the default filter
pub fn select_filters(requested: &[String], all: bool) -> FilterSelection {
    if all {
        return FilterSelection {
            filters: FilterKind::catalog(),
            skipped: Vec::new(),
        };
    }

    if requested.is_empty() {
        return FilterSelection {
            filters: vec![FilterKind::default_filter()],
            skipped: Vec::new(),
        };
    }

    let mut selection = FilterSelection {
        filters: Vec::new(),
        skipped: Vec::new(),
    };
    for name in requested {
        match FilterKind::from_name(name) {
            Ok(kind) => selection.filters.push(kind),
            Err(_) => selection.skipped.push(name.clone()),
        }
    }
    selection
}

/// Open and decode the input image
pub fn load_input(path: &Path) -> FilterResult<DynamicImage> {
    if !path.is_file() {
        return Err(FilterError::InvalidInputPath(path.to_path_buf()));
    }
    let img = image::open(path)
        .map_err(|e| FilterError::InvalidImage(format!("{}: {}", path.display(), e)))?;

    if img.width() == 0 || img.height() == 0 {
        return Err(FilterError::InvalidImage(format!(
            "{} has no pixels",
            path.display()
        )));
    }
    Ok(img)
}

pub struct ProcessingEngine {
    config: ProcessingConfig,
    watermark: Option<Watermark>,
}

impl ProcessingEngine {
    pub fn new(config: ProcessingConfig, watermark: Option<Watermark>) -> Self {
        Self { config, watermark }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Run every configured filter against `input`.
    ///
    /// A failing filter is recorded and the batch carries on with the next one.
    /// `progress_callback` receives the number of filters finished so far.
    pub fn process_batch<F>(&self, input: &DynamicImage, progress_callback: F) -> Vec<BatchEntry>
    where
        F: Fn(usize, &BatchEntry),
    {
        let mut entries = Vec::with_capacity(self.config.filters.len());

        for (index, &filter) in self.config.filters.iter().enumerate() {
            let entry = BatchEntry {
                filter,
                result: self.process_single_filter(filter, input),
            };
            progress_callback(index + 1, &entry);
            entries.push(entry);
        }

        entries
    }

    /// Filter, resize, watermark and save one output
    pub fn process_single_filter(
        &self,
        kind: FilterKind,
        input: &DynamicImage,
    ) -> FilterResult<ProcessingResult> {
        let start = Instant::now();
        verbose_println(self.config.verbose, &format!("Filter image by {}", kind));

        let filter = Filter::from_params(kind, &self.config.params)?;
        let mut img = filter.apply(input)?;

        if self.config.width.is_some() || self.config.height.is_some() {
            verbose_println(self.config.verbose, "Resize image");
            img = resize::fit_within(img, self.config.width, self.config.height)?;
        }

        if let Some(mark) = &self.watermark {
            verbose_println(self.config.verbose, "Apply watermark");
            img = mark.apply(img);
        }

        let (width, height) = (img.width(), img.height());
        let output_path = resolve_output_path(
            &self.config.output,
            kind.as_ref(),
            &self.config.output_format,
        );
        save_image(img, &output_path, &self.config.output_format)?;
        verbose_println(
            self.config.verbose,
            &format!("Output to {}", output_path.display()),
        );

        Ok(ProcessingResult {
            filter: kind,
            output_path,
            width,
            height,
            elapsed: start.elapsed(),
        })
    }
}
