//! Runs a ledger through every stage: read, aggregate, cluster, rank.

use crate::api::LedgerSource;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Groups, Layout, Ledger, LedgerStats, Report, VendorTotals};
use crate::Result;
use anyhow::Context;
use tracing::debug;

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct Summary {
    report: Report,
    groups: Groups,
    vendors: VendorTotals,
    stats: LedgerStats,
}

impl Summary {
    /// The ranked groups, without member lists.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// The ranked groups, each listing the vendor names folded into it.
    pub fn report_with_members(&self) -> Report {
        Report::rank_with_members(self.groups.clone())
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    /// Per-vendor totals before clustering.
    pub fn vendors(&self) -> &VendorTotals {
        &self.vendors
    }

    pub fn stats(&self) -> LedgerStats {
        self.stats
    }

    /// Records that were read but left out of the totals because they were cancelled.
    pub fn cancelled(&self) -> usize {
        self.vendors.excluded()
    }
}

/// Reads `source` and produces the ranked report.
///
/// # Errors
/// - Returns a `Source` error if the source cannot be read. No partial report is produced.
/// - Returns an `Overflow` error if a vendor or group total does not fit in an `Amount`.
pub async fn run(source: &mut (dyn LedgerSource + Send), layout: &Layout) -> Result<Summary> {
    let ledger = Ledger::read(source, layout)
        .await
        .context("Unable to read the ledger")
        .pub_result(ErrorType::Source)?;
    summarize(&ledger, layout)
}

/// Aggregates, clusters and ranks an already-read ledger.
///
/// # Errors
/// - Returns an `Overflow` error if a vendor or group total does not fit in an `Amount`.
pub fn summarize(ledger: &Ledger, layout: &Layout) -> Result<Summary> {
    let vendors =
        VendorTotals::aggregate(ledger.records(), layout).pub_result(ErrorType::Overflow)?;
    let groups = Groups::cluster(&vendors).pub_result(ErrorType::Overflow)?;
    let report = Report::rank(groups.clone());
    debug!(
        "Pipeline finished: {} records, {} vendors, {} groups",
        ledger.records().len(),
        vendors.len(),
        report.len()
    );
    Ok(Summary {
        report,
        groups,
        vendors,
        stats: ledger.stats(),
    })
}
