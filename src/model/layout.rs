//! The positional layout of a ledger sheet: which cell index holds which field, how many title
//! rows precede the data, and which cancellation value marks a record as active.

use serde::de::Error as SerdeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt::{Display, Formatter};

/// The current version of the layout table.
pub const LAYOUT_VERSION: u8 = 1;

/// Rows before this position are title and header rows.
pub const DEFAULT_HEADER_OFFSET: usize = 4;

/// Rows with fewer cells than this are incomplete.
pub const DEFAULT_MIN_CELLS: usize = 14;

/// A record is active, and therefore counted, only when its cancellation cell is exactly this.
pub const DEFAULT_ACTIVE_MARKER: &str = "No";

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LayoutError(String);

impl Display for LayoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl StdError for LayoutError {}

/// The fields of a ledger record, in their default positional order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerColumn {
    Id,
    Caja,
    Categoria,
    Fecha,
    Proveedor,
    NumeroFiscal,
    TipoComp,
    NroComp,
    Descripcion,
    Importe,
    MedioPago,
    CreadoPor,
    DeCaja,
    Cancelado,
}

serde_plain::derive_display_from_serialize!(LedgerColumn);
serde_plain::derive_fromstr_from_deserialize!(LedgerColumn);

impl LedgerColumn {
    /// Every column, in default positional order.
    pub const ALL: [LedgerColumn; 14] = [
        LedgerColumn::Id,
        LedgerColumn::Caja,
        LedgerColumn::Categoria,
        LedgerColumn::Fecha,
        LedgerColumn::Proveedor,
        LedgerColumn::NumeroFiscal,
        LedgerColumn::TipoComp,
        LedgerColumn::NroComp,
        LedgerColumn::Descripcion,
        LedgerColumn::Importe,
        LedgerColumn::MedioPago,
        LedgerColumn::CreadoPor,
        LedgerColumn::DeCaja,
        LedgerColumn::Cancelado,
    ];
}

/// The versioned positional contract between a ledger sheet and `Record`.
///
/// The default layout is the one the accounting export has always used: four title rows, then
/// fourteen cells per row with the amount at index 9 and the cancellation flag at index 13.
///
/// Serialized form:
/// ```json
/// {
///   "version": 1,
///   "header_offset": 4,
///   "min_cells": 14,
///   "active_marker": "No",
///   "columns": { "id": 0, "caja": 1, "...": 2, "cancelado": 13 }
/// }
/// ```
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Layout {
    version: u8,
    header_offset: usize,
    min_cells: usize,
    active_marker: String,
    columns: BTreeMap<LedgerColumn, usize>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            version: LAYOUT_VERSION,
            header_offset: DEFAULT_HEADER_OFFSET,
            min_cells: DEFAULT_MIN_CELLS,
            active_marker: DEFAULT_ACTIVE_MARKER.to_string(),
            columns: LedgerColumn::ALL
                .iter()
                .enumerate()
                .map(|(ix, col)| (*col, ix))
                .collect(),
        }
    }
}

impl Layout {
    /// Creates a validated `Layout`. Every `LedgerColumn` must be given exactly one index, no two
    /// columns may share an index, and every index must be below `min_cells`.
    pub fn new<I>(
        header_offset: usize,
        min_cells: usize,
        active_marker: impl Into<String>,
        columns: I,
    ) -> Result<Self, LayoutError>
    where
        I: IntoIterator<Item = (LedgerColumn, usize)>,
    {
        let mut map = BTreeMap::new();
        for (col, ix) in columns {
            if map.insert(col, ix).is_some() {
                return Err(LayoutError(format!("Column '{col}' is mapped more than once")));
            }
        }

        if let Some(missing) = LedgerColumn::ALL.iter().find(|c| !map.contains_key(c)) {
            return Err(LayoutError(format!("Column '{missing}' has no cell index")));
        }

        let mut seen: BTreeMap<usize, LedgerColumn> = BTreeMap::new();
        for (col, ix) in &map {
            if let Some(other) = seen.insert(*ix, *col) {
                return Err(LayoutError(format!(
                    "Columns '{other}' and '{col}' both use cell index {ix}"
                )));
            }
            if *ix >= min_cells {
                return Err(LayoutError(format!(
                    "Column '{col}' uses cell index {ix} but rows only need {min_cells} cells"
                )));
            }
        }

        Ok(Self {
            version: LAYOUT_VERSION,
            header_offset,
            min_cells,
            active_marker: active_marker.into(),
            columns: map,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn header_offset(&self) -> usize {
        self.header_offset
    }

    pub fn min_cells(&self) -> usize {
        self.min_cells
    }

    pub fn active_marker(&self) -> &str {
        &self.active_marker
    }

    /// The cell index that holds `column`.
    pub fn index(&self, column: LedgerColumn) -> usize {
        // Every column is present, `new` and `default` guarantee it.
        self.columns.get(&column).copied().unwrap_or_default()
    }
}

/// The on-disk shape of a `Layout`, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LayoutFile {
    version: u8,
    header_offset: usize,
    min_cells: usize,
    active_marker: String,
    columns: BTreeMap<LedgerColumn, usize>,
}

impl Serialize for Layout {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        LayoutFile {
            version: self.version,
            header_offset: self.header_offset,
            min_cells: self.min_cells,
            active_marker: self.active_marker.clone(),
            columns: self.columns.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let file = LayoutFile::deserialize(deserializer)?;
        if file.version != LAYOUT_VERSION {
            return Err(D::Error::custom(format!(
                "Unsupported layout version {}, expected {LAYOUT_VERSION}",
                file.version
            )));
        }
        Layout::new(
            file.header_offset,
            file.min_cells,
            file.active_marker,
            file.columns,
        )
        .map_err(D::Error::custom)
    }
}
