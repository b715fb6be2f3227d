use thiserror::Error;

#[derive(Error, Debug)]
pub enum PayrollError {
    #[error("missing required column(s): {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("row {row}: VALOR DO EVENTO is not numeric: {value:?}")]
    DataType { row: usize, value: String },

    #[error("VALOR DO EVENTO total overflows in {scope}")]
    Overflow { scope: &'static str },

    #[error("spreadsheet has no sheets")]
    NoSheets,

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PayrollResult<T> = Result<T, PayrollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_lists_every_column() {
        let error = PayrollError::MissingColumns {
            columns: vec!["EVENTO".to_string(), "VALOR DO EVENTO".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "missing required column(s): EVENTO, VALOR DO EVENTO"
        );
    }

    #[test]
    fn test_data_type_error_names_row_and_value() {
        let error = PayrollError::DataType {
            row: 7,
            value: "abc".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "row 7: VALOR DO EVENTO is not numeric: \"abc\""
        );
    }

    #[test]
    fn test_overflow_error_names_sheet() {
        let error = PayrollError::Overflow {
            scope: "Vinculo_Evento_Fonte",
        };
        assert_eq!(
            error.to_string(),
            "VALOR DO EVENTO total overflows in Vinculo_Evento_Fonte"
        );
    }

    #[test]
    fn test_payroll_result_err() {
        fn returns_err() -> PayrollResult<()> {
            Err(PayrollError::NoSheets)
        }
        assert!(matches!(returns_err(), Err(PayrollError::NoSheets)));
    }
}
