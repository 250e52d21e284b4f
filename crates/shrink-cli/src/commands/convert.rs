//! Convert command - turn one shrink report PDF into a workbook.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use shrink_core::models::config::{ExtractionMode, LayoutPreference};
use shrink_core::report::PageBody;
use shrink_core::{output_file_name, Converter, ParsedReport, ShrinkConfig, ShrinkError};

use super::config::load_config;

/// Arguments for the convert command.
#[derive(Args)]
pub struct ConvertArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: <input>_converted.xlsx next to the input for
    /// xlsx, stdout otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "xlsx")]
    format: OutputFormat,

    /// Text extraction mode (overrides config)
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Detail page layout (overrides config)
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Page worker threads, 0 = one per CPU (overrides config)
    #[arg(short, long)]
    workers: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Excel workbook
    Xlsx,
    /// Parsed report as JSON
    Json,
    /// Plain text summary
    Text,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    Auto,
    Positioned,
    Text,
}

impl From<ModeArg> for ExtractionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => ExtractionMode::Auto,
            ModeArg::Positioned => ExtractionMode::Positioned,
            ModeArg::Text => ExtractionMode::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LayoutArg {
    Auto,
    Anchor,
    Bands,
}

impl From<LayoutArg> for LayoutPreference {
    fn from(layout: LayoutArg) -> Self {
        match layout {
            LayoutArg::Auto => LayoutPreference::Auto,
            LayoutArg::Anchor => LayoutPreference::Anchor,
            LayoutArg::Bands => LayoutPreference::Bands,
        }
    }
}

pub async fn run(args: ConvertArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, &args);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Converting file: {}", args.input.display());
    let data = fs::read(&args.input)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Reading {}...", args.input.display()));

    let format = args.format;
    let suffix = config.output.file_suffix.clone();
    let converter = Converter::new(config);
    let result = tokio::task::spawn_blocking(move || match format {
        OutputFormat::Xlsx => converter.convert(&data).map(|c| (c.report, Some(c.bytes))),
        OutputFormat::Json | OutputFormat::Text => converter.parse(&data).map(|r| (r, None)),
    })
    .await?;

    pb.finish_and_clear();

    let (report, bytes) = match result {
        Ok(converted) => converted,
        Err(ShrinkError::EmptyResult) => {
            eprintln!(
                "{} No shrink data found in {}; nothing written.",
                style("⚠").yellow(),
                args.input.display()
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match (format, bytes) {
        (OutputFormat::Xlsx, Some(bytes)) => {
            let output_path = args
                .output
                .clone()
                .unwrap_or_else(|| default_output_path(&args.input, &suffix));
            fs::write(&output_path, &bytes)?;
            println!(
                "{} Wrote {} sheets ({} records) to {}",
                style("✓").green(),
                report.workbook.sheets.len(),
                report.record_count(),
                output_path.display()
            );
            if report.skipped_count() > 0 {
                println!(
                    "{} Skipped {} unreadable records",
                    style("ℹ").blue(),
                    report.skipped_count()
                );
            }
        }
        _ => {
            let output = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
                _ => format_text(&report),
            };
            if let Some(output_path) = &args.output {
                fs::write(output_path, &output)?;
                println!(
                    "{} Output written to {}",
                    style("✓").green(),
                    output_path.display()
                );
            } else {
                println!("{}", output);
            }
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn apply_overrides(config: &mut ShrinkConfig, args: &ConvertArgs) {
    if let Some(mode) = args.mode {
        config.pdf.mode = mode.into();
    }
    if let Some(layout) = args.layout {
        config.report.layout = layout.into();
    }
    if let Some(workers) = args.workers {
        config.pipeline.workers = workers;
    }
}

/// `<dir>/<name>_converted.xlsx` beside the input.
fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(output_file_name(&name, suffix))
}

fn format_text(report: &ParsedReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Pages: {}  Records: {}  Skipped: {}\n",
        report.pages.len(),
        report.record_count(),
        report.skipped_count()
    ));
    output.push('\n');

    output.push_str("Pages:\n");
    for page in &report.pages {
        match &page.body {
            PageBody::Detail {
                layout,
                records,
                failures,
            } => output.push_str(&format!(
                "  {:>3}  {:<24} {:?}, {} records, {} skipped\n",
                page.number,
                page.metadata.department,
                layout,
                records.len(),
                failures.total()
            )),
            PageBody::Summary(lines) => output.push_str(&format!(
                "  {:>3}  {:<24} {} summary lines\n",
                page.number,
                "(summary)",
                lines.lines.len()
            )),
        }
    }

    output.push('\n');
    output.push_str("Sheets:\n");
    for name in report.workbook.sheet_names() {
        output.push_str(&format!("  {}\n", name));
    }

    if let Some(summary) = &report.summary {
        output.push('\n');
        output.push_str("Summary:\n");
        for line in summary.subtotals() {
            output.push_str(&format!(
                "  {:<24} {:>6} {:>12.2}\n",
                line.department, line.items, line.total_retail
            ));
        }
        if let Some(total) = summary.grand_total() {
            output.push_str(&format!(
                "  {:<24} {:>6} {:>12.2}\n",
                total.department, total.items, total.total_retail
            ));
        }
        if let Some(reported) = summary.reported_total {
            output.push_str(&format!("  Reported total: {:.2}\n", reported));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        let path = default_output_path(Path::new("/tmp/reports/Week 12.PDF"), "_converted");
        assert_eq!(path, PathBuf::from("/tmp/reports/Week 12_converted.xlsx"));
    }
}
