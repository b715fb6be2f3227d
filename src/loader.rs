use crate::error::{PayrollError, PayrollResult};
use crate::types::{LoadReport, PayrollRecord, REQUIRED_COLUMNS};
use crate::util::{cell_amount, cell_text, fonte_de_recurso, normalize_header};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::{Cursor, Read};
use tracing::{debug, info};

/// Header plus data rows of the first sheet, before any validation.
struct RawSheet {
    headers: Vec<String>,
    rows: Vec<Vec<Data>>,
    /// 1-based sheet row of the header, for error messages.
    header_row: usize,
}

/// Column positions of the required fields in the raw sheet.
struct ColumnMap {
    organograma: usize,
    descricao_organograma: usize,
    evento: usize,
    descricao_evento: usize,
    pd_patronal: usize,
    vinculo: usize,
    descricao_vinculo: usize,
    valor_evento: usize,
}

/// Load the first sheet of a workbook (xlsx, xlsm, xlsb, xls or ods).
pub fn load_spreadsheet(bytes: &[u8]) -> PayrollResult<(Vec<PayrollRecord>, LoadReport)> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(PayrollError::NoSheets)??;

    let header_row = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|h| h.iter().map(|c| normalize_header(&cell_text(c))).collect())
        .unwrap_or_default();
    let rows = rows.map(|r| r.to_vec()).collect();

    normalize(RawSheet {
        headers,
        rows,
        header_row,
    })
}

/// Load a CSV file with a header row.
pub fn load_csv<R: Read>(rdr: R) -> PayrollResult<(Vec<PayrollRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = rdr
        .headers()?
        .iter()
        .map(|h| normalize_header(h.trim_start_matches('\u{feff}')))
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Data::Empty
                } else {
                    Data::String(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    normalize(RawSheet {
        headers,
        rows,
        header_row: 1,
    })
}

fn column_map(headers: &[String]) -> PayrollResult<ColumnMap> {
    let find = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| find(**name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PayrollError::MissingColumns { columns: missing });
    }

    let [organograma, descricao_organograma, evento, descricao_evento, pd_patronal, vinculo, descricao_vinculo, valor_evento] =
        REQUIRED_COLUMNS.map(|name| find(name).unwrap_or_default());
    Ok(ColumnMap {
        organograma,
        descricao_organograma,
        evento,
        descricao_evento,
        pd_patronal,
        vinculo,
        descricao_vinculo,
        valor_evento,
    })
}

fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|c| match c {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

fn normalize(sheet: RawSheet) -> PayrollResult<(Vec<PayrollRecord>, LoadReport)> {
    let cols = column_map(&sheet.headers)?;
    debug!(columns = sheet.headers.len(), "required columns present");

    let mut total_rows = 0usize;
    let mut blank_rows = 0usize;
    let mut records = Vec::with_capacity(sheet.rows.len());

    for (idx, row) in sheet.rows.iter().enumerate() {
        total_rows += 1;
        if is_blank(row) {
            blank_rows += 1;
            continue;
        }
        let cell = |i: usize| row.get(i).unwrap_or(&Data::Empty);

        let valor = cell(cols.valor_evento);
        let valor_evento = cell_amount(valor).ok_or_else(|| PayrollError::DataType {
            row: sheet.header_row + idx + 1,
            value: cell_text(valor),
        })?;

        let organograma = cell_text(cell(cols.organograma));
        let fonte = fonte_de_recurso(&organograma);
        records.push(PayrollRecord {
            organograma,
            descricao_organograma: cell_text(cell(cols.descricao_organograma)),
            evento: cell_text(cell(cols.evento)),
            descricao_evento: cell_text(cell(cols.descricao_evento)),
            pd_patronal: cell_text(cell(cols.pd_patronal)),
            vinculo: cell_text(cell(cols.vinculo)),
            descricao_vinculo: cell_text(cell(cols.descricao_vinculo)),
            valor_evento,
            fonte_de_recurso: fonte,
        });
    }

    let report = LoadReport {
        total_rows,
        blank_rows,
        columns: sheet.headers.len(),
    };
    info!(
        records = records.len(),
        blank_rows = report.blank_rows,
        "payroll sheet loaded"
    );
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const HEADER: &str = "Organograma,Descrição do Organograma,Evento,Descrição do Evento,P/D/Patronal,Vínculo,Descrição do Vínculo,Valor do Evento";

    fn load(body: &str) -> PayrollResult<(Vec<PayrollRecord>, LoadReport)> {
        load_csv(body.as_bytes())
    }

    #[test]
    fn test_csv_headers_are_normalized() {
        let body = " organograma ,descrição do organograma,EVENTO , descrição do evento,p/d/patronal,vínculo,descrição do vínculo,valor do evento\n\
                    12345678901234,Secretaria,1,Salário,P,1,Efetivo,1000.00\n";
        let (records, report) = load(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.columns, 8);
        assert_eq!(records[0].descricao_evento, "Salário");
    }

    #[test]
    fn test_fonte_is_derived_not_read() {
        let body = format!("{HEADER},Fonte de Recurso\n12345678901234,Sec,1,Salário,P,1,Efetivo,10,IGNORED\n");
        let (records, _) = load(&body).unwrap();
        assert_eq!(records[0].fonte_de_recurso, "78901234");
    }

    #[test]
    fn test_missing_columns_reported_in_checklist_order() {
        let body = "ORGANOGRAMA,EVENTO,P/D/PATRONAL,VÍNCULO\n1,2,P,3\n";
        match load(body) {
            Err(PayrollError::MissingColumns { columns }) => assert_eq!(
                columns,
                vec![
                    "DESCRIÇÃO DO ORGANOGRAMA",
                    "DESCRIÇÃO DO EVENTO",
                    "DESCRIÇÃO DO VÍNCULO",
                    "VALOR DO EVENTO"
                ]
            ),
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_value_is_data_type_error() {
        let body = format!("{HEADER}\n1,Sec,1,Salário,P,1,Efetivo,10\n2,Sec,1,Salário,P,1,Efetivo,dez reais\n");
        match load(&body) {
            Err(PayrollError::DataType { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "dez reais");
            }
            other => panic!("expected data type error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_rows_skipped_and_empty_value_is_zero() {
        let body = format!("{HEADER}\n,,,,,,,\n1,Sec,1,Salário,P,1,Efetivo,\n");
        let (records, report) = load(&body).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.blank_rows, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].valor_evento, Decimal::ZERO);
    }

    #[test]
    fn test_headers_only_yields_no_records() {
        let (records, report) = load(&format!("{HEADER}\n")).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.total_rows, 0);
    }

    #[test]
    fn test_decimal_precision_kept() {
        let body = format!("{HEADER}\n1,Sec,1,Salário,P,1,Efetivo,\"1.234,56\"\n");
        let (records, _) = load(&body).unwrap();
        assert_eq!(records[0].valor_evento, Decimal::from_str("1234.56").unwrap());
    }

    #[test]
    fn test_garbage_bytes_are_not_a_workbook() {
        assert!(load_spreadsheet(b"not a workbook").is_err());
    }
}
