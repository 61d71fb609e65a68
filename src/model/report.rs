use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Group, Groups, VendorRow};
use crate::Result;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// The encodings a report can be rendered to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A pretty-printed JSON array of objects.
    #[default]
    Json,
    /// A markdown table with thousands separators in the spend column.
    Table,
    /// Comma-separated values with a header row.
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// One line of the ranked report: a group label with its combined count and spend.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Grupo")]
    pub label: String,
    #[serde(rename = "Cantidad")]
    pub count: u64,
    #[serde(rename = "Gasto")]
    pub total: Amount,
    #[serde(rename = "Miembros", default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

impl ReportRow {
    fn from_group(group: Group, with_members: bool) -> Self {
        let label = group.canonical().to_string();
        let count = group.count();
        let total = group.total();
        let members = with_members.then(|| group.members().to_vec());
        Self {
            label,
            count,
            total,
            members,
        }
    }
}

/// Groups ordered by total spend, highest first. Equal totals are ordered by label.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(Vec<ReportRow>);

impl Report {
    /// Ranks `groups` into report rows of label, count and spend.
    pub fn rank(groups: Groups) -> Self {
        Self::build(groups, false)
    }

    /// Like `rank`, but each row also lists the vendor names folded into its group.
    pub fn rank_with_members(groups: Groups) -> Self {
        Self::build(groups, true)
    }

    fn build(groups: Groups, with_members: bool) -> Self {
        let mut rows: Vec<ReportRow> = groups
            .into_iter()
            .map(|g| ReportRow::from_group(g, with_members))
            .collect();
        rows.sort_by(by_spend_then_label);
        debug!("Ranked {} groups", rows.len());
        Self(rows)
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes the report.
    ///
    /// # Errors
    /// - Returns a `Serialization` error if the report cannot be encoded.
    pub fn render(&self, format: OutputFormat) -> Result<String> {
        render_rows(&self.0, format)
    }
}

fn by_spend_then_label(a: &ReportRow, b: &ReportRow) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| a.label.cmp(&b.label))
}

/// A row that can be rendered as a table or CSV line.
pub trait TableRow: Serialize {
    /// Column names for `rows`.
    fn header(rows: &[Self]) -> Vec<&'static str>
    where
        Self: Sized;

    /// Cell text for this row. When `grouped` is true amounts use thousands separators.
    fn cells(&self, grouped: bool) -> Vec<String>;
}

impl TableRow for ReportRow {
    fn header(rows: &[Self]) -> Vec<&'static str> {
        let mut header = vec!["Grupo", "Cantidad", "Gasto"];
        if rows.iter().any(|r| r.members.is_some()) {
            header.push("Miembros");
        }
        header
    }

    fn cells(&self, grouped: bool) -> Vec<String> {
        let mut cells = vec![
            self.label.clone(),
            self.count.to_string(),
            amount_text(self.total, grouped),
        ];
        if let Some(members) = &self.members {
            cells.push(members.join("; "));
        }
        cells
    }
}

impl TableRow for VendorRow {
    fn header(_: &[Self]) -> Vec<&'static str> {
        vec!["Proveedor", "Cantidad", "Gasto"]
    }

    fn cells(&self, grouped: bool) -> Vec<String> {
        vec![
            self.vendor.clone(),
            self.count.to_string(),
            amount_text(self.total, grouped),
        ]
    }
}

fn amount_text(amount: Amount, grouped: bool) -> String {
    if grouped {
        amount.to_grouped_string()
    } else {
        amount.to_string()
    }
}

/// Encodes `rows` in `format`.
///
/// # Errors
/// - Returns a `Serialization` error if the rows cannot be encoded.
pub fn render_rows<T: TableRow>(rows: &[T], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(rows)
            .context("Unable to encode the report as JSON")
            .pub_result(ErrorType::Serialization),
        OutputFormat::Table => Ok(markdown_table(rows)),
        OutputFormat::Csv => csv_text(rows).pub_result(ErrorType::Serialization),
    }
}

fn markdown_table<T: TableRow>(rows: &[T]) -> String {
    let header = T::header(rows);
    let mut out = String::new();
    out.push_str(&markdown_line(header.iter().map(|h| h.to_string())));
    out.push_str(&markdown_line(header.iter().map(|_| "---".to_string())));
    for row in rows {
        out.push_str(&markdown_line(row.cells(true).into_iter()));
    }
    out
}

fn markdown_line(cells: impl Iterator<Item = String>) -> String {
    let cells: Vec<String> = cells.map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |\n", cells.join(" | "))
}

fn csv_text<T: TableRow>(rows: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(T::header(rows))
        .context("Unable to write the CSV header")?;
    for row in rows {
        writer
            .write_record(row.cells(false))
            .context("Unable to write a CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Unable to flush the CSV output: {}", e.error()))?;
    String::from_utf8(bytes).context("The CSV output is not valid UTF-8")
}
