//! Reads a ledger from a spreadsheet workbook (xlsx, xlsm, xls, xlsb, ods).

use crate::api::{trim_trailing_empty, LedgerSource, SheetData};
use crate::Result;
use anyhow::Context;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A workbook on disk. Every worksheet is returned, in workbook order.
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl LedgerSource for WorkbookSource {
    async fn sheets(&mut self) -> Result<Vec<SheetData>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_workbook(&path))
            .await
            .context("The workbook reader task failed")?
    }
}

fn read_workbook(path: &Path) -> Result<Vec<SheetData>> {
    trace!("opening workbook {}", path.display());
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Unable to open workbook {}", path.display()))?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("Unable to read sheet '{name}' in {}", path.display()))?;
        let rows = range_rows(&range);
        debug!("Read {} rows from sheet '{name}'", rows.len());
        sheets.push(SheetData::new(name, rows));
    }
    Ok(sheets)
}

/// Converts a calamine range into rows anchored at the top-left corner of the sheet. The range
/// only covers the used area, so leading empty rows and cells are put back so that row
/// positions and cell indexes match what a user sees in the sheet.
fn range_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells: Vec<String> = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_text));
        trim_trailing_empty(&mut cells);
        rows.push(cells);
    }
    rows
}

/// Best-effort text for a cell.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => float_text(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{e:?}"),
        // Dates are kept as their serial number.
        Data::DateTime(dt) => float_text(dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Integers without decimals, everything else in shortest round-trip form.
fn float_text(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Layout, Ledger};
    use crate::test::{ledger_row, title_rows};
    use rust_xlsxwriter::{Workbook, Worksheet};
    use tempfile::TempDir;

    /// Writes `rows` starting at `first_row`. Non-empty cells in the amount column are written
    /// as numbers, all others as strings.
    fn write_rows(sheet: &mut Worksheet, first_row: u32, rows: &[Vec<String>]) {
        for (r, row) in rows.iter().enumerate() {
            let r = first_row + r as u32;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell.parse::<f64>() {
                    Ok(n) if c == 9 => sheet.write_number(r, c, n).unwrap(),
                    _ if cell.is_empty() => continue,
                    _ => sheet.write_string(r, c, cell).unwrap(),
                };
            }
        }
    }

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();

        let enero = workbook.add_worksheet().set_name("enero").unwrap();
        let mut rows = title_rows();
        rows.push(ledger_row("Acme Corp", "150", "No"));
        rows.push(ledger_row("Otro", "9", "Si"));
        write_rows(enero, 0, &rows);

        // Row 0 is left empty, so the used range starts at row 1.
        let febrero = workbook.add_worksheet().set_name("febrero").unwrap();
        let mut rows = title_rows()[1..].to_vec();
        rows.push(ledger_row("acme", "12.5", "No"));
        write_rows(febrero, 1, &rows);

        workbook.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_reads_every_sheet_of_a_workbook() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gastos.xlsx");
        write_workbook(&path);

        let sheets = WorkbookSource::new(&path).sheets().await.unwrap();
        let names: Vec<&str> = sheets.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["enero", "febrero"]);

        let enero = sheets[0].rows();
        assert_eq!(enero[0], vec!["Reporte de gastos"]);
        assert_eq!(enero[4][4], "Acme Corp");
        assert_eq!(enero[4][9], "150");
        assert_eq!(enero[4].len(), 14);

        let febrero = sheets[1].rows();
        assert!(febrero[0].is_empty());
        assert_eq!(febrero[4][4], "acme");
        assert_eq!(febrero[4][9], "12.5");
    }

    #[tokio::test]
    async fn test_workbook_ledger_spans_sheets() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gastos.xlsx");
        write_workbook(&path);

        let mut source = WorkbookSource::new(&path);
        let ledger = Ledger::read(&mut source, &Layout::default()).await.unwrap();
        let vendors: Vec<&str> = ledger.records().iter().map(|r| r.vendor()).collect();
        assert_eq!(vendors, vec!["Acme Corp", "Otro", "acme"]);
        assert_eq!(ledger.stats().sheets, 2);
    }

    #[test]
    fn test_float_text() {
        assert_eq!(float_text(150.0), "150");
        assert_eq!(float_text(12.34), "12.34");
        assert_eq!(float_text(-0.5), "-0.5");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String(" Acme ".to_string())), " Acme ");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Float(99.5)), "99.5");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
    }

    #[test]
    fn test_range_rows_restores_offset() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("a".to_string()));
        range.set_value((3, 2), Data::Float(5.0));
        let rows = range_rows(&range);
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_empty());
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], vec!["", "a"]);
        assert_eq!(rows[3], vec!["", "", "5"]);
    }

    #[tokio::test]
    async fn test_unreadable_workbook_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        let mut source = WorkbookSource::new(&path);
        assert!(source.sheets().await.is_err());
    }
}
