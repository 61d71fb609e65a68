use crate::model::{Amount, Layout, Record};
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// The running count and spend of one exact vendor name.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    count: u64,
    total: Amount,
}

impl Accumulator {
    pub fn new(count: u64, total: Amount) -> Self {
        Self { count, total }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    fn add(&mut self, amount: Amount) -> Option<()> {
        self.total = self.total.checked_add(amount)?;
        self.count += 1;
        Some(())
    }
}

/// Per-vendor totals keyed by the exact vendor name (case and whitespace sensitive).
///
/// Keys are kept in the order they were first seen, which makes every later stage that walks
/// them deterministic for a given ledger.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct VendorTotals {
    vendors: Vec<(String, Accumulator)>,
    index: HashMap<String, usize>,
    excluded: usize,
}

impl VendorTotals {
    /// Sums the active records of a ledger by vendor. A record is active only when its
    /// cancellation cell is exactly `layout.active_marker()`; all others are excluded.
    ///
    /// # Errors
    /// - Returns an error if a vendor's total does not fit in an `Amount`.
    pub fn aggregate(records: &[Record], layout: &Layout) -> Result<Self> {
        let mut totals = Self::default();
        for record in records {
            if record.is_active(layout) {
                totals.add(record.vendor(), record.amount())?;
            } else {
                totals.excluded += 1;
            }
        }
        debug!(
            "Aggregated {} vendor names ({} cancelled records excluded)",
            totals.len(),
            totals.excluded
        );
        Ok(totals)
    }

    /// Adds one record's amount to `vendor`, creating its accumulator on first sight.
    ///
    /// # Errors
    /// - Returns an error, leaving the accumulator unchanged, if the new total overflows.
    pub fn add(&mut self, vendor: &str, amount: Amount) -> Result<()> {
        match self.index.get(vendor) {
            Some(&ix) => self.vendors[ix]
                .1
                .add(amount)
                .with_context(|| format!("The total spend for vendor '{vendor}' overflows"))?,
            None => {
                self.index.insert(vendor.to_string(), self.vendors.len());
                self.vendors
                    .push((vendor.to_string(), Accumulator::new(1, amount)));
            }
        }
        Ok(())
    }

    pub fn get(&self, vendor: &str) -> Option<&Accumulator> {
        self.index.get(vendor).map(|&ix| &self.vendors[ix].1)
    }

    /// Vendor names and their accumulators, in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Accumulator)> {
        self.vendors.iter().map(|(name, acc)| (name.as_str(), acc))
    }

    pub fn len(&self) -> usize {
        self.vendors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vendors.is_empty()
    }

    /// The number of records left out because they were cancelled.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// One row per vendor name, in first-seen order.
    pub fn to_rows(&self) -> Vec<VendorRow> {
        self.iter()
            .map(|(name, acc)| VendorRow {
                vendor: name.to_string(),
                count: acc.count(),
                total: acc.total(),
            })
            .collect()
    }
}

/// The output projection of a single vendor name before clustering.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct VendorRow {
    #[serde(rename = "Proveedor")]
    pub vendor: String,
    #[serde(rename = "Cantidad")]
    pub count: u64,
    #[serde(rename = "Gasto")]
    pub total: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ledger;
    use crate::test::{ledger_row, ledger_sheet};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn totals(rows: Vec<Vec<String>>) -> VendorTotals {
        let layout = Layout::default();
        let ledger = Ledger::from_sheets(&[ledger_sheet("s", rows)], &layout);
        VendorTotals::aggregate(ledger.records(), &layout).unwrap()
    }

    #[test]
    fn test_accumulates_exact_names() {
        let totals = totals(vec![
            ledger_row("Acme", "10", "No"),
            ledger_row("Acme", "2.5", "No"),
            ledger_row("Other", "1", "No"),
        ]);
        let acme = totals.get("Acme").unwrap();
        assert_eq!(acme.count(), 2);
        assert_eq!(acme.total().value(), Decimal::new(125, 1));
        assert_eq!(totals.get("Other").unwrap().count(), 1);
    }

    #[test]
    fn test_spelling_variants_stay_separate() {
        let totals = totals(vec![
            ledger_row("ACME Corp", "1", "No"),
            ledger_row("acme corp.", "1", "No"),
            ledger_row("ACME Corp ", "1", "No"),
        ]);
        assert_eq!(totals.len(), 3);
    }

    #[test]
    fn test_only_exact_active_marker_counts() {
        let totals = totals(vec![
            ledger_row("Kept", "1", "No"),
            ledger_row("Lower", "1", "no"),
            ledger_row("Upper", "1", "NO"),
            ledger_row("Empty", "1", ""),
            ledger_row("Accent", "1", "Sí"),
            ledger_row("Yes", "1", "Si"),
        ]);
        let names: Vec<&str> = totals.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Kept"]);
        assert_eq!(totals.excluded(), 5);
    }

    #[test]
    fn test_keys_keep_first_seen_order() {
        let totals = totals(vec![
            ledger_row("Zeta", "1", "No"),
            ledger_row("Alfa", "1", "No"),
            ledger_row("Zeta", "1", "No"),
            ledger_row("Mu", "1", "No"),
        ]);
        let names: Vec<&str> = totals.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["Zeta", "Alfa", "Mu"]);
    }

    #[test]
    fn test_overflowing_total_is_an_error() {
        let layout = Layout::default();
        let huge = "50000000000000000000000000000";
        let ledger = Ledger::from_sheets(
            &[ledger_sheet(
                "s",
                vec![ledger_row("Acme", huge, "No"), ledger_row("Acme", huge, "No")],
            )],
            &layout,
        );
        let err = VendorTotals::aggregate(ledger.records(), &layout).unwrap_err();
        assert!(err.to_string().contains("'Acme'"), "{err}");
    }

    #[test]
    fn test_failed_add_leaves_total_unchanged() {
        let huge = Amount::from_str("50000000000000000000000000000").unwrap();
        let mut totals = VendorTotals::default();
        totals.add("Acme", huge).unwrap();
        assert!(totals.add("Acme", huge).is_err());
        let acme = totals.get("Acme").unwrap();
        assert_eq!(acme.count(), 1);
        assert_eq!(acme.total(), huge);
    }

    #[test]
    fn test_to_rows_serializes_with_ledger_keys() {
        let totals = totals(vec![ledger_row("Acme", "3", "No")]);
        let json = serde_json::to_string(&totals.to_rows()).unwrap();
        assert_eq!(json, r#"[{"Proveedor":"Acme","Cantidad":1,"Gasto":3}]"#);
    }
}
