//! Payroll spreadsheet pivots.
//!
//! Loads a payroll sheet, derives the resource source (`FONTE DE RECURSO`)
//! from each organograma code, and re-aggregates `VALOR DO EVENTO` into four
//! summary views that are rendered as text panels and exported as a single
//! four-sheet workbook.

pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{PayrollError, PayrollResult};
pub use pipeline::{run, InputFormat, RunOutput};
