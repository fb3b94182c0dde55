use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Instant;

use image_filter::cli::Args;
use image_filter::image_processing::filters::FilterKind;
use image_filter::image_processing::output::OutputFormat;
use image_filter::image_processing::watermark::Watermark;
use image_filter::image_processing::{
    load_input, select_filters, BatchEntry, ProcessingConfig, ProcessingEngine,
};
use image_filter::json_output::JsonMessage;
use image_filter::utils::{
    create_progress_bar, error_println, format_duration, is_valid_input, validate_inputs,
    verbose_println, warn_println, ProcessingStats,
};

/// Build the watermark requested on the command line; an image takes precedence over text
fn build_watermark(args: &Args) -> Result<Option<Watermark>> {
    if let Some(path) = &args.water_mark {
        let mark = Watermark::from_image_path(path, args.water_mark_pos)
            .with_context(|| format!("Failed to load watermark image {}", path.display()))?;
        return Ok(Some(mark));
    }

    match args.water_mark_text.as_deref() {
        Some(text) if !text.is_empty() => {
            let color = args.parse_font_color().map_err(anyhow::Error::msg)?;
            let mark = Watermark::from_text(
                text,
                &args.font,
                args.font_size as f32,
                color,
                args.water_mark_pos,
            )
            .with_context(|| {
                format!("Failed to prepare text watermark with font '{}'", args.font)
            })?;
            Ok(Some(mark))
        }
        _ => Ok(None),
    }
}

fn print_filter_list() {
    for kind in FilterKind::catalog() {
        println!("{}", kind);
    }
}

fn print_summary(entries: &[BatchEntry], stats: &ProcessingStats, output: &Path) {
    println!("{}", style("Results Summary:").bold().green());
    println!(
        "  Successfully processed: {}",
        style(stats.successful).bold().green()
    );
    if stats.failed > 0 {
        println!("  Failed: {}", style(stats.failed).bold().red());
    }

    if stats.successful > 0 {
        println!();
        println!("{}", style("Detailed Processing Results:").bold().blue());
        for (i, entry) in entries.iter().enumerate() {
            if let Ok(result) = &entry.result {
                println!(
                    "  {}: {} {}x{} -> {} ({})",
                    style(format!("#{}", i + 1)).dim(),
                    style(entry.filter).bold(),
                    result.width,
                    result.height,
                    style(result.output_path.display()).cyan(),
                    style(format_duration(result.elapsed)).dim()
                );
            }
        }
    }

    println!();
    println!("{}", style("Performance:").bold().blue());
    println!(
        "  Total processing time: {}",
        style(format_duration(stats.total_duration)).bold()
    );
    println!(
        "  Average time per filter: {}",
        style(format_duration(stats.average_duration())).dim()
    );
    println!("  Success rate: {:.1}%", stats.success_rate());

    println!();
    println!("{}", style("Output:").bold().green());
    println!("  {}", output.display());

    if stats.failed > 0 {
        println!();
        println!("{}", style("Errors encountered:").bold().red());
        let failures = entries
            .iter()
            .filter_map(|entry| entry.result.as_ref().err().map(|e| (entry.filter, e)));
        for (i, (filter, error)) in failures.enumerate() {
            println!(
                "  {}: {} - {}",
                style(format!("#{}", i + 1)).dim(),
                style(filter).bold().red(),
                error
            );
        }
        println!();
        println!(
            "{}",
            style(format!("⚠ {} filters failed", stats.failed))
                .bold()
                .yellow()
        );
        println!("  Check the filter parameters and try again with --verbose for more details");
    }
}

fn main() {
    let mut args = Args::parse();
    let json = args.json;

    if let Err(e) = run(&mut args) {
        report_setup_error(&e, json);
        std::process::exit(1);
    }
}

/// Setup failures go to stdout like every other diagnostic
fn report_setup_error(error: &anyhow::Error, json: bool) {
    let message = format!("{:#}", error);
    if json {
        JsonMessage::error(message);
    } else {
        error_println(&message);
    }
}

fn run(args: &mut Args) -> Result<()> {
    let start_time = Instant::now();
    args.load_and_merge_config()?;

    if args.list {
        print_filter_list();
        return Ok(());
    }

    let input_path = match args.input.as_deref() {
        Some(path) if is_valid_input(Some(path)) => path.to_path_buf(),
        _ => {
            if args.json {
                JsonMessage::error("Invalid input");
            } else {
                println!("Invalid input");
            }
            return Ok(());
        }
    };

    if !args.json {
        println!("{}", style("Image Filter").bold().blue());
        println!("{}", style("Collection of image filters").dim());
        println!();
    }

    validate_inputs(args)?;

    let params = args.parse_params().map_err(anyhow::Error::msg)?;
    let output_format = OutputFormat::resolve(args.output_type.as_deref(), &input_path)
        .context("Failed to resolve output format")?;
    let watermark = build_watermark(args)?;

    let selection = select_filters(&args.filters, args.all_filters);
    if args.json {
        JsonMessage::skipped(&selection);
    } else if args.verbose {
        for name in &selection.skipped {
            warn_println(&format!("Unknown filter '{}' skipped", name));
        }
    }

    if selection.filters.is_empty() {
        if args.json {
            JsonMessage::error("No known filters selected");
        } else {
            error_println("No known filters selected. Use --list to see the available filters");
        }
        return Ok(());
    }

    let input = load_input(&input_path)
        .with_context(|| format!("Failed to load input image {}", input_path.display()))?;

    let config = ProcessingConfig {
        filters: selection.filters,
        params,
        output: args.output_path(),
        output_format,
        width: args.width,
        height: args.height,
        verbose: args.verbose && !args.json,
    };

    if config.verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Input: {} ({}x{})", input_path.display(), input.width(), input.height());
        println!("  Output: {}", config.output.display());
        println!("  Output format: {}", config.output_format.extension);
        println!(
            "  Filters: {}",
            config
                .filters
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        if !config.params.is_empty() {
            let params: Vec<String> = config
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            println!("  Parameters: {}", params.join(", "));
        }
        if config.width.is_some() || config.height.is_some() {
            println!("  Bounding box: {:?}x{:?}", config.width, config.height);
        }
        println!(
            "  Watermark: {}",
            if watermark.is_some() { "enabled" } else { "disabled" }
        );
        println!();
    }

    let total = config.filters.len();
    let output = config.output.clone();
    let engine = ProcessingEngine::new(config, watermark);

    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        create_progress_bar(total as u64)
    };
    progress.set_message("Applying filters");

    let json = args.json;
    let entries = engine.process_batch(&input, |done, entry| {
        progress.set_position(done as u64);
        progress.set_message(entry.filter.to_string());
        if json {
            JsonMessage::progress(done, total, entry.filter.to_string());
            JsonMessage::from_entry(entry).emit();
        } else if let Err(e) = &entry.result {
            verbose_println(
                args.verbose,
                &format!("Filter {} failed: {}", entry.filter, e),
            );
        }
    });
    progress.finish_with_message("Processing complete!");

    let stats = ProcessingStats::from_entries(&entries, start_time.elapsed());

    if json {
        JsonMessage::summary(
            stats.total_filters,
            stats.successful,
            stats.failed,
            stats.total_duration,
        );
        return Ok(());
    }

    println!();
    print_summary(&entries, &stats, &output);

    Ok(())
}
