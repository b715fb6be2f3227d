use crate::error::PayrollResult;
use crate::types::{PivotView, TotalsView, ViewKind, Views, VALOR_EVENTO};
use crate::util::{amount_to_f64, format_decimal};
use rust_decimal::Decimal;
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, Worksheet};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};
use tracing::info;

pub const OUTPUT_FILE_NAME: &str = "resultado_rh.xlsx";
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// The consolidated workbook, ready to be offered for download.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Amount(Decimal),
}

impl CellValue {
    /// Text shown in the terminal panels.
    pub fn display(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Amount(d) => format_decimal(*d),
        }
    }

    /// Text written to CSV exports.
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Amount(d) => d.normalize().to_string(),
        }
    }
}

/// A view laid out as a header row plus data rows. Panels, sheets and CSV
/// files are all written from this, so they always agree.
pub trait TabularView {
    fn kind(&self) -> ViewKind;
    fn headers(&self) -> Vec<String>;
    fn rows(&self) -> Vec<Vec<CellValue>>;
}

fn key_cells(parts: [&str; 3]) -> Vec<CellValue> {
    parts
        .iter()
        .map(|p| CellValue::Text(p.to_string()))
        .collect()
}

impl TabularView for PivotView {
    fn kind(&self) -> ViewKind {
        self.kind
    }

    fn headers(&self) -> Vec<String> {
        self.kind
            .key_columns()
            .iter()
            .map(|c| c.to_string())
            .chain(self.pivot_columns.iter().cloned())
            .collect()
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = key_cells(row.key.parts());
                cells.extend(self.pivot_columns.iter().map(|c| {
                    CellValue::Amount(row.values.get(c).copied().unwrap_or(Decimal::ZERO))
                }));
                cells
            })
            .collect()
    }
}

impl TabularView for TotalsView {
    fn kind(&self) -> ViewKind {
        self.kind
    }

    fn headers(&self) -> Vec<String> {
        self.kind
            .key_columns()
            .iter()
            .map(|c| c.to_string())
            .chain(std::iter::once(VALOR_EVENTO.to_string()))
            .collect()
    }

    fn rows(&self) -> Vec<Vec<CellValue>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = key_cells(row.key.parts());
                cells.push(CellValue::Amount(row.total));
                cells
            })
            .collect()
    }
}

/// The four views in sheet order.
pub fn tables(views: &Views) -> [&dyn TabularView; 4] {
    [
        &views.vinculo_organograma_fonte,
        &views.vinculo_evento_fonte,
        &views.totais_organograma_fonte,
        &views.organograma_evento_fonte,
    ]
}

/// Render one view as a titled panel. Every row and column is included.
pub fn render_panel(table: &dyn TabularView) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers());
    let rows = table.rows();
    for row in &rows {
        builder.push_record(row.iter().map(CellValue::display));
    }
    let rendered = builder.build().with(Style::markdown()).to_string();
    let mut panel = format!("{}\n\n{}\n", table.kind().title(), rendered);
    if rows.is_empty() {
        panel.push_str("(no rows)\n");
    }
    panel
}

pub fn render_views(views: &Views) -> Vec<String> {
    tables(views).into_iter().map(render_panel).collect()
}

fn write_sheet(ws: &mut Worksheet, table: &dyn TabularView, header: &Format) -> PayrollResult<()> {
    for (col, h) in table.headers().iter().enumerate() {
        ws.write_string_with_format(0, col as u16, h, header)?;
    }
    for (idx, row) in table.rows().iter().enumerate() {
        let r = idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                CellValue::Text(s) => ws.write_string(r, col as u16, s)?,
                CellValue::Amount(d) => ws.write_number(r, col as u16, amount_to_f64(*d))?,
            };
        }
    }
    ws.autofit();
    Ok(())
}

/// Build the consolidated workbook: one sheet per view, header row, no index
/// column. The document timestamp is pinned so the same views always produce
/// the same bytes.
pub fn write_workbook(views: &Views) -> PayrollResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    let properties = DocProperties::new().set_creation_datetime(&created);
    workbook.set_properties(&properties);

    let header = Format::new().set_bold();
    for table in tables(views) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(table.kind().sheet_name())?;
        write_sheet(worksheet, table, &header)?;
    }

    let bytes = workbook.save_to_buffer()?;
    info!(bytes = bytes.len(), file = OUTPUT_FILE_NAME, "workbook built");
    Ok(bytes)
}

pub fn build_artifact(views: &Views) -> PayrollResult<Artifact> {
    Ok(Artifact {
        file_name: OUTPUT_FILE_NAME,
        mime_type: XLSX_MIME_TYPE,
        bytes: write_workbook(views)?,
    })
}

/// Write each view to `<dir>/<sheet name>.csv`.
pub fn write_csv_dir(dir: &Path, views: &Views) -> PayrollResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for table in tables(views) {
        let path = dir.join(format!("{}.csv", table.kind().sheet_name()));
        let mut wtr = csv::Writer::from_path(&path)?;
        wtr.write_record(table.headers())?;
        for row in table.rows() {
            wtr.write_record(row.iter().map(CellValue::raw))?;
        }
        wtr.flush()?;
        written.push(path);
    }
    Ok(written)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> PayrollResult<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::build_views;
    use crate::types::PayrollRecord;
    use crate::util::fonte_de_recurso;
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;
    use std::str::FromStr;

    fn record(org: &str, desc_org: &str, pd: &str, valor: &str) -> PayrollRecord {
        PayrollRecord {
            organograma: org.to_string(),
            descricao_organograma: desc_org.to_string(),
            evento: "1".to_string(),
            descricao_evento: "Salário".to_string(),
            pd_patronal: pd.to_string(),
            vinculo: "1".to_string(),
            descricao_vinculo: "Efetivo".to_string(),
            valor_evento: Decimal::from_str(valor).unwrap(),
            fonte_de_recurso: fonte_de_recurso(org),
        }
    }

    fn sample_views() -> Views {
        build_views(&[
            record("12345678901234", "Educação", "P", "1000.00"),
            record("98765432101234", "Educação", "D", "-200.00"),
        ])
        .unwrap()
    }

    #[test]
    fn test_pivot_headers_follow_data() {
        let views = sample_views();
        assert_eq!(
            views.vinculo_organograma_fonte.headers(),
            vec![
                "DESCRIÇÃO DO VÍNCULO",
                "DESCRIÇÃO DO ORGANOGRAMA",
                "FONTE DE RECURSO",
                "D",
                "P"
            ]
        );
        assert_eq!(
            views.vinculo_evento_fonte.headers(),
            vec![
                "DESCRIÇÃO DO VÍNCULO",
                "DESCRIÇÃO DO EVENTO",
                "FONTE DE RECURSO",
                "VALOR DO EVENTO"
            ]
        );
    }

    #[test]
    fn test_panel_shows_every_row() {
        let views = sample_views();
        let panels = render_views(&views);
        assert_eq!(panels.len(), 4);
        assert!(panels[0].starts_with("Vínculo + Organograma + Fonte"));
        assert!(panels[0].contains("32101234"));
        assert!(panels[0].contains("78901234"));
        assert!(panels[0].contains("-200.00"));
        assert!(panels[0].contains("1,000.00"));
    }

    #[test]
    fn test_empty_panel_is_marked() {
        let views = build_views(&[]).unwrap();
        let panel = render_panel(&views.vinculo_evento_fonte);
        assert!(panel.contains("VALOR DO EVENTO"));
        assert!(panel.contains("(no rows)"));
    }

    #[test]
    fn test_workbook_has_four_named_sheets() {
        let bytes = write_workbook(&sample_views()).unwrap();
        let mut wb: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(
            wb.sheet_names(),
            vec![
                "Vinculo_Organograma_Fonte",
                "Vinculo_Evento_Fonte",
                "Totais_Organograma_Fonte",
                "Organograma_Evento_Fonte"
            ]
        );
        let range = wb.worksheet_range("Vinculo_Organograma_Fonte").unwrap();
        assert_eq!(range.get_size(), (3, 5));
        assert_eq!(range.get((0, 3)), Some(&Data::String("D".to_string())));
        assert_eq!(range.get((1, 2)), Some(&Data::String("32101234".to_string())));
        assert_eq!(range.get((1, 3)), Some(&Data::Float(-200.0)));
        assert_eq!(range.get((1, 4)), Some(&Data::Float(0.0)));
    }

    #[test]
    fn test_workbook_bytes_are_reproducible() {
        let views = sample_views();
        assert_eq!(write_workbook(&views).unwrap(), write_workbook(&views).unwrap());
    }

    #[test]
    fn test_artifact_metadata() {
        let artifact = build_artifact(&sample_views()).unwrap();
        assert_eq!(artifact.file_name, "resultado_rh.xlsx");
        assert_eq!(
            artifact.mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert!(!artifact.bytes.is_empty());
    }

    #[test]
    fn test_csv_dir_matches_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_csv_dir(dir.path(), &sample_views()).unwrap();
        assert_eq!(written.len(), 4);
        let text = std::fs::read_to_string(dir.path().join("Vinculo_Evento_Fonte.csv")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "DESCRIÇÃO DO VÍNCULO,DESCRIÇÃO DO EVENTO,FONTE DE RECURSO,VALOR DO EVENTO",
                "Efetivo,Salário,32101234,-200",
                "Efetivo,Salário,78901234,1000",
            ]
        );
    }
}
