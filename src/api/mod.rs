//! Sources of ledger data.
//!
//! A `LedgerSource` yields the sheets of a ledger as rows of cell text. Concrete decoders exist
//! for delimited text (`CsvSource`), spreadsheet workbooks (`WorkbookSource`) and data that is
//! already in memory (`MemorySource`). Every source is owned by the caller that opened it; no
//! ledger data is shared between invocations.

mod csv_source;
mod memory;
mod workbook;

use crate::Result;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use csv_source::CsvSource;
pub use memory::MemorySource;
pub use workbook::WorkbookSource;

/// File extensions that are read as delimited text.
pub const CSV_EXTENSIONS: &[&str] = &["csv"];

/// File extensions that are read as spreadsheet workbooks.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// The rows of one sheet, each row being the text of its cells in column order.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SheetData {
    name: String,
    rows: Vec<Vec<String>>,
}

impl SheetData {
    pub fn new<S, R, I>(name: impl Into<String>, rows: I) -> Self
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
        I: IntoIterator<Item = R>,
    {
        Self {
            name: name.into(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|s| s.into()).collect())
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

/// Anything that can produce the sheets of a ledger.
#[async_trait::async_trait]
pub trait LedgerSource {
    /// Reads every sheet, in order. An error means the source could not be read at all; rows
    /// that merely look wrong are returned as they are and left to the parser.
    async fn sheets(&mut self) -> Result<Vec<SheetData>>;
}

/// Options for opening a file-backed source.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SourceOptions {
    /// The field delimiter for delimited text files.
    pub delimiter: u8,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Opens the ledger at `path`, choosing a decoder by file extension.
///
/// # Errors
/// - Returns an error if the extension is not one of `CSV_EXTENSIONS` or `WORKBOOK_EXTENSIONS`.
pub fn source(path: &Path, options: &SourceOptions) -> Result<Box<dyn LedgerSource + Send>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if CSV_EXTENSIONS.contains(&extension.as_str()) {
        Ok(Box::new(CsvSource::new(path, options.delimiter)))
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        Ok(Box::new(WorkbookSource::new(path)))
    } else {
        bail!(
            "Invalid file type for '{}': expected one of {}",
            path.display(),
            CSV_EXTENSIONS
                .iter()
                .chain(WORKBOOK_EXTENSIONS)
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Drops empty cells from the end of `row`, so that its length is the number of cells up to
/// and including the last populated one.
pub(crate) fn trim_trailing_empty(row: &mut Vec<String>) {
    while row.last().is_some_and(|cell| cell.is_empty()) {
        row.pop();
    }
}
