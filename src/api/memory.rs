//! Implements the `LedgerSource` trait using in-memory data.
//!
//! Note: this is compiled even in the "production" version of this crate so that library
//! callers who already hold decoded rows can run the pipeline without touching the filesystem.

use crate::api::{LedgerSource, SheetData};
use crate::Result;

/// An implementation of the `LedgerSource` trait that holds its sheets in memory.
#[derive(Default, Debug, Clone)]
pub struct MemorySource {
    sheets: Vec<SheetData>,
}

impl MemorySource {
    pub fn new(sheets: Vec<SheetData>) -> Self {
        Self { sheets }
    }

    /// Adds a sheet after the existing ones.
    pub fn push(&mut self, sheet: SheetData) {
        self.sheets.push(sheet);
    }
}

#[async_trait::async_trait]
impl LedgerSource for MemorySource {
    async fn sheets(&mut self) -> Result<Vec<SheetData>> {
        Ok(self.sheets.clone())
    }
}
