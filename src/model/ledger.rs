use crate::api::{LedgerSource, SheetData};
use crate::model::{Layout, Record, Skip};
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Counts of what happened to the rows of a ledger while it was read.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LedgerStats {
    pub sheets: usize,
    pub rows: usize,
    pub records: usize,
    pub header_rows: usize,
    pub short_rows: usize,
    pub bad_amounts: usize,
}

impl LedgerStats {
    /// Rows that did not produce a record, for any reason.
    pub fn skipped(&self) -> usize {
        self.header_rows + self.short_rows + self.bad_amounts
    }

    fn count(&mut self, skip: &Skip) {
        match skip {
            Skip::Header => self.header_rows += 1,
            Skip::Short { .. } => self.short_rows += 1,
            Skip::BadAmount { .. } => self.bad_amounts += 1,
        }
    }
}

/// Every record of a ledger, in sheet order and then row order.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Ledger {
    records: Vec<Record>,
    stats: LedgerStats,
}

impl Ledger {
    /// Reads all sheets from `source` and parses them with `layout`.
    ///
    /// # Errors
    /// - Returns an error only if the source itself cannot be read. Rows that cannot be parsed
    ///   are skipped.
    pub async fn read(source: &mut (dyn LedgerSource + Send), layout: &Layout) -> Result<Self> {
        let sheets = source.sheets().await?;
        Ok(Self::from_sheets(&sheets, layout))
    }

    /// Parses already-decoded sheets. Row positions restart at zero for every sheet, so each
    /// sheet has its own title rows.
    pub fn from_sheets(sheets: &[SheetData], layout: &Layout) -> Self {
        let mut records = Vec::new();
        let mut stats = LedgerStats {
            sheets: sheets.len(),
            ..LedgerStats::default()
        };

        for sheet in sheets {
            for (position, row) in sheet.rows().iter().enumerate() {
                stats.rows += 1;
                match Record::try_parse(row, position, layout) {
                    Ok(record) => records.push(record),
                    Err(skip) => stats.count(&skip),
                }
            }
        }

        stats.records = records.len();
        debug!(
            "Read {} records from {} rows in {} sheets ({} skipped)",
            stats.records,
            stats.rows,
            stats.sheets,
            stats.skipped()
        );
        Self { records, stats }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn stats(&self) -> LedgerStats {
        self.stats
    }
}
