use crate::error::PayrollResult;
use crate::loader::{load_csv, load_spreadsheet};
use crate::output::{build_artifact, Artifact};
use crate::reports::{build_views, summarize};
use crate::types::{LoadReport, RunSummary, Views};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Any workbook calamine can open; the first sheet is read.
    Spreadsheet,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::Spreadsheet,
        }
    }
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub records_loaded: usize,
    pub load_report: LoadReport,
    pub views: Views,
    pub summary: RunSummary,
    pub artifact: Artifact,
}

/// Process one uploaded file: load, aggregate the four views, build the
/// workbook. Any error stops the run before anything is produced.
pub fn run(bytes: &[u8], format: InputFormat) -> PayrollResult<RunOutput> {
    let (records, load_report) = match format {
        InputFormat::Spreadsheet => load_spreadsheet(bytes)?,
        InputFormat::Csv => load_csv(bytes)?,
    };
    let views = build_views(&records)?;
    let summary = summarize(&records, &views)?;
    let artifact = build_artifact(&views)?;
    info!(
        records = summary.total_records,
        grand_total = %summary.grand_total,
        "run complete"
    );
    Ok(RunOutput {
        records_loaded: records.len(),
        load_report,
        views,
        summary,
        artifact,
    })
}
