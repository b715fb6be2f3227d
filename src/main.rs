// Entry point and high-level CLI flow.
//
// One invocation is one run: read the payroll sheet, print the four views
// as panels, and write the consolidated workbook (plus optional CSV and JSON
// side outputs). Any load or validation error stops the run before anything
// is written.
use anyhow::{Context, Result};
use clap::Parser;
use payroll_pivot::output::{self, OUTPUT_FILE_NAME};
use payroll_pivot::util::{format_decimal, format_int};
use payroll_pivot::{run, InputFormat};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "payroll-pivot")]
#[command(about = "Summarize a payroll spreadsheet into four pivot views", long_about = None)]
struct Cli {
    /// Payroll spreadsheet (xlsx, xls, ods) or CSV file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Where to write the consolidated workbook
    #[arg(short, long, default_value = OUTPUT_FILE_NAME)]
    output: PathBuf,

    /// Also write each view as a CSV file into this directory
    #[arg(long, value_name = "DIR")]
    csv_dir: Option<PathBuf>,

    /// Write a JSON summary of the run to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Skip printing the view panels
    #[arg(long)]
    no_display: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("Failed to read input file: {}", cli.input.display()))?;
    let format = InputFormat::from_path(&cli.input);
    let result = run(&bytes, format)
        .with_context(|| format!("Failed to process {}", cli.input.display()))?;

    println!(
        "Processing payroll... ({} rows read, {} records, {} blank rows skipped)\n",
        format_int(result.load_report.total_rows),
        format_int(result.summary.total_records),
        format_int(result.load_report.blank_rows)
    );

    if !cli.no_display {
        for panel in output::render_views(&result.views) {
            println!("{}", panel);
        }
    }

    std::fs::write(&cli.output, &result.artifact.bytes)
        .with_context(|| format!("Failed to write workbook: {}", cli.output.display()))?;
    info!(
        path = %cli.output.display(),
        mime = result.artifact.mime_type,
        "workbook saved"
    );
    println!("Workbook saved to {}", cli.output.display());

    if let Some(dir) = &cli.csv_dir {
        let written = output::write_csv_dir(dir, &result.views)
            .with_context(|| format!("Failed to write CSV files to {}", dir.display()))?;
        println!("{} CSV files written to {}", written.len(), dir.display());
    }

    if let Some(path) = &cli.summary {
        output::write_json(path, &result.summary)
            .with_context(|| format!("Failed to write summary: {}", path.display()))?;
        println!("Summary saved to {}", path.display());
    }

    println!(
        "Grand total VALOR DO EVENTO: {}",
        format_decimal(result.summary.grand_total)
    );
    Ok(())
}
