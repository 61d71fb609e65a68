//! Types that represent the core data model, from a parsed ledger `Record` through to the ranked
//! `Report`.
mod amount;
mod group;
mod layout;
mod ledger;
mod record;
mod report;
mod vendor;

pub use amount::{Amount, AmountError};
pub use group::{fuzzy_match, Group, Groups};
pub use layout::{
    Layout, LayoutError, LedgerColumn, DEFAULT_ACTIVE_MARKER, DEFAULT_HEADER_OFFSET,
    DEFAULT_MIN_CELLS, LAYOUT_VERSION,
};
pub use ledger::{Ledger, LedgerStats};
pub use record::{Record, Skip};
pub use report::{render_rows, OutputFormat, Report, ReportRow, TableRow};
pub use vendor::{Accumulator, VendorRow, VendorTotals};
