//! Reads a ledger from a delimited text file.

use crate::api::{trim_trailing_empty, LedgerSource, SheetData};
use crate::{utils, Result};
use anyhow::Context;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::trace;

/// A single-sheet ledger stored as delimited text. No header handling is done here: title and
/// header rows are returned like any other row and skipped later by the record parser.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl LedgerSource for CsvSource {
    async fn sheets(&mut self) -> Result<Vec<SheetData>> {
        trace!("reading delimited text from {}", self.path.display());
        let bytes = utils::read_bytes(&self.path).await?;
        let rows = load_csv(&bytes, self.delimiter)
            .with_context(|| format!("Unable to parse {}", self.path.display()))?;
        let name = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(vec![SheetData::new(name, rows)])
    }
}

/// Loads rows from delimited text. Rows may have differing lengths. A blank line is returned as
/// an empty row so that row positions follow the lines of the file.
pub(crate) fn load_csv(bytes: &[u8], delimiter: u8) -> Result<Vec<Vec<String>>> {
    let marked = mark_blank_lines(bytes, delimiter);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(Cursor::new(marked));

    let mut rows: Vec<Vec<String>> = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let mut row: Vec<String> = record.iter().map(|field| field.to_string()).collect();
        trim_trailing_empty(&mut row);
        rows.push(row);
    }
    Ok(rows)
}

/// The csv reader drops blank lines. Writes a lone delimiter on each blank line outside a quoted
/// field so it is read as a record of empty cells instead.
fn mark_blank_lines(bytes: &[u8], delimiter: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut quoted = false;
    let mut line_start = true;
    for (ix, &byte) in bytes.iter().enumerate() {
        let terminator = !quoted && (byte == b'\n' || byte == b'\r');
        if terminator && line_start {
            out.push(delimiter);
        }
        if byte == b'"' {
            quoted = !quoted;
        }
        out.push(byte);
        // A CRLF pair ends one line, so the LF that follows a CR is not a blank line.
        line_start = terminator && !(byte == b'\r' && bytes.get(ix + 1) == Some(&b'\n'));
    }
    out
}
