//! These structs provide the CLI interface for the vendor-spend CLI.

use crate::model::OutputFormat;
use crate::Config;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// vendor-spend: A command-line tool for finding out where the money goes.
///
/// The program reads an expense ledger exported from the accounting system (a CSV file or a
/// spreadsheet workbook), adds up the spend for every vendor, merges vendors whose names are
/// spelled slightly differently, and prints the resulting groups ranked by total spend.
///
/// Rows are read positionally: the first four rows of every sheet are titles, and each data row
/// needs fourteen cells with the amount in the tenth and the cancellation flag in the last. Run
/// `vendor-spend init` to write a config file in which this layout can be changed.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Write a default config file.
    ///
    /// The file holds the positional layout of ledger rows. You only need it if your ledger
    /// export does not use the standard layout.
    Init(InitArgs),
    /// Rank vendor groups by total spend.
    ///
    /// Cancelled records are left out. Vendors whose names differ only slightly (casing,
    /// abbreviations, missing letters) are merged into the group of the first spelling seen.
    Report(ReportArgs),
    /// List the spend of every exact vendor name, before any merging.
    Vendors(VendorsArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The path to the config file. Defaults to <config dir>/vendor-spend/config.json
    #[arg(long, env = "VENDOR_SPEND_CONFIG", default_value_t = default_config())]
    config: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn config(&self) -> &DisplayPath {
        &self.config
    }
}

/// (Not shown): Args for the `vendor-spend init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    force: bool,
}

impl InitArgs {
    pub fn force(&self) -> bool {
        self.force
    }
}

/// Where a ledger comes from and where its output goes. Shared by `report` and `vendors`.
#[derive(Debug, Parser, Clone)]
pub struct LedgerArgs {
    /// The ledger file: .csv, .xlsx, .xlsm, .xls, .xlsb or .ods
    file: PathBuf,

    /// The output encoding.
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write the output to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// The field delimiter for .csv files.
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

impl LedgerArgs {
    pub fn new(
        file: impl Into<PathBuf>,
        format: OutputFormat,
        output: Option<PathBuf>,
        delimiter: char,
    ) -> Self {
        Self {
            file: file.into(),
            format,
            output,
            delimiter,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }
}

/// (Not shown): Args for the `vendor-spend report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    #[clap(flatten)]
    ledger: LedgerArgs,

    /// Also list the vendor names that were merged into each group.
    #[arg(long)]
    members: bool,
}

impl ReportArgs {
    pub fn new(ledger: LedgerArgs, members: bool) -> Self {
        Self { ledger, members }
    }

    pub fn ledger(&self) -> &LedgerArgs {
        &self.ledger
    }

    pub fn members(&self) -> bool {
        self.members
    }
}

/// (Not shown): Args for the `vendor-spend vendors` command.
#[derive(Debug, Parser, Clone)]
pub struct VendorsArgs {
    #[clap(flatten)]
    ledger: LedgerArgs,
}

impl VendorsArgs {
    pub fn new(ledger: LedgerArgs) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &LedgerArgs {
        &self.ledger
    }
}

fn default_config() -> DisplayPath {
    DisplayPath(Config::default_path())
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_args() {
        let args = Args::try_parse_from([
            "vendor-spend",
            "--config",
            "/tmp/c.json",
            "report",
            "ledger.csv",
            "--format",
            "table",
            "--members",
            "--delimiter",
            ";",
        ])
        .unwrap();
        assert_eq!(args.common().config().path(), Path::new("/tmp/c.json"));
        assert_eq!(args.common().log_level(), LevelFilter::INFO);
        match args.command() {
            Command::Report(report) => {
                assert!(report.members());
                assert_eq!(report.ledger().file(), Path::new("ledger.csv"));
                assert_eq!(report.ledger().format(), OutputFormat::Table);
                assert_eq!(report.ledger().delimiter(), ';');
                assert!(report.ledger().output().is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_vendors_defaults() {
        let args = Args::try_parse_from([
            "vendor-spend",
            "--log-level",
            "debug",
            "vendors",
            "ledger.xlsx",
            "--output",
            "out.json",
        ])
        .unwrap();
        assert_eq!(args.common().log_level(), LevelFilter::DEBUG);
        match args.command() {
            Command::Vendors(vendors) => {
                assert_eq!(vendors.ledger().format(), OutputFormat::Json);
                assert_eq!(vendors.ledger().delimiter(), ',');
                assert_eq!(vendors.ledger().output(), Some(Path::new("out.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result = Args::try_parse_from(["vendor-spend", "report", "a.csv", "--format", "xml"]);
        assert!(result.is_err());
    }
}
