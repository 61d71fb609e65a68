use crate::model::{Amount, Layout, LedgerColumn};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::warn;

/// One line item of the expense ledger.
///
/// Text fields hold the cell values exactly as they appeared in the sheet, including case and
/// surrounding whitespace. Vendor names in particular are never normalized here because the
/// clustering stage needs to see every original spelling.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    pub(crate) id: String,
    pub(crate) caja: String,
    pub(crate) categoria: String,
    pub(crate) fecha: String,
    pub(crate) proveedor: String,
    pub(crate) numero_fiscal: String,
    pub(crate) tipo_comp: String,
    pub(crate) nro_comp: String,
    pub(crate) descripcion: String,
    pub(crate) importe: Amount,
    pub(crate) medio_pago: String,
    pub(crate) creado_por: String,
    pub(crate) de_caja: String,
    pub(crate) cancelado: String,
}

/// Why a row did not produce a `Record`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skip {
    /// The row sits above the layout's header offset.
    Header,
    /// The row has fewer cells than the layout requires.
    Short { cells: usize },
    /// The amount cell does not hold a plain decimal number.
    BadAmount { value: String },
}

impl Display for Skip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Skip::Header => write!(f, "header row"),
            Skip::Short { cells } => write!(f, "only {cells} cells"),
            Skip::BadAmount { value } => write!(f, "unparsable amount '{value}'"),
        }
    }
}

impl Record {
    /// Parses one sheet row into a `Record`, or returns `None` when the row must be skipped.
    ///
    /// `position` is the 0-based index of the row within its sheet. Rows above the header
    /// offset and rows with too few cells are skipped silently; a row whose amount cannot be
    /// parsed is skipped with a warning.
    pub fn parse<S: AsRef<str>>(row: &[S], position: usize, layout: &Layout) -> Option<Record> {
        match Record::try_parse(row, position, layout) {
            Ok(record) => Some(record),
            Err(_) => None,
        }
    }

    /// Like `parse`, but reports why a row was skipped.
    pub fn try_parse<S: AsRef<str>>(
        row: &[S],
        position: usize,
        layout: &Layout,
    ) -> Result<Record, Skip> {
        if position < layout.header_offset() {
            return Err(Skip::Header);
        }
        if row.len() < layout.min_cells() {
            return Err(Skip::Short { cells: row.len() });
        }

        let cell = |column: LedgerColumn| {
            row.get(layout.index(column))
                .map(|s| s.as_ref())
                .unwrap_or_default()
        };

        let raw_amount = cell(LedgerColumn::Importe);
        let importe = match Amount::from_str(raw_amount) {
            Ok(amount) => amount,
            Err(e) => {
                warn!("Skipping row {position}: unable to parse the amount: {e}");
                return Err(Skip::BadAmount {
                    value: raw_amount.to_string(),
                });
            }
        };

        Ok(Record {
            id: cell(LedgerColumn::Id).to_string(),
            caja: cell(LedgerColumn::Caja).to_string(),
            categoria: cell(LedgerColumn::Categoria).to_string(),
            fecha: cell(LedgerColumn::Fecha).to_string(),
            proveedor: cell(LedgerColumn::Proveedor).to_string(),
            numero_fiscal: cell(LedgerColumn::NumeroFiscal).to_string(),
            tipo_comp: cell(LedgerColumn::TipoComp).to_string(),
            nro_comp: cell(LedgerColumn::NroComp).to_string(),
            descripcion: cell(LedgerColumn::Descripcion).to_string(),
            importe,
            medio_pago: cell(LedgerColumn::MedioPago).to_string(),
            creado_por: cell(LedgerColumn::CreadoPor).to_string(),
            de_caja: cell(LedgerColumn::DeCaja).to_string(),
            cancelado: cell(LedgerColumn::Cancelado).to_string(),
        })
    }

    /// The vendor name, verbatim.
    pub fn vendor(&self) -> &str {
        &self.proveedor
    }

    pub fn amount(&self) -> Amount {
        self.importe
    }

    /// The raw cancellation flag.
    pub fn cancelled_flag(&self) -> &str {
        &self.cancelado
    }

    /// True only when the cancellation flag is exactly the layout's active marker.
    pub fn is_active(&self, layout: &Layout) -> bool {
        self.cancelado == layout.active_marker()
    }

    /// Gets a text field by column. For `Importe` this is the amount's decimal text.
    pub fn get(&self, column: LedgerColumn) -> String {
        match column {
            LedgerColumn::Id => self.id.clone(),
            LedgerColumn::Caja => self.caja.clone(),
            LedgerColumn::Categoria => self.categoria.clone(),
            LedgerColumn::Fecha => self.fecha.clone(),
            LedgerColumn::Proveedor => self.proveedor.clone(),
            LedgerColumn::NumeroFiscal => self.numero_fiscal.clone(),
            LedgerColumn::TipoComp => self.tipo_comp.clone(),
            LedgerColumn::NroComp => self.nro_comp.clone(),
            LedgerColumn::Descripcion => self.descripcion.clone(),
            LedgerColumn::Importe => self.importe.to_string(),
            LedgerColumn::MedioPago => self.medio_pago.clone(),
            LedgerColumn::CreadoPor => self.creado_por.clone(),
            LedgerColumn::DeCaja => self.de_caja.clone(),
            LedgerColumn::Cancelado => self.cancelado.clone(),
        }
    }
}
