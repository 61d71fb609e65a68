use crate::api::SourceOptions;
use crate::args::{LedgerArgs, ReportArgs, VendorsArgs};
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{render_rows, LedgerStats};
use crate::pipeline::{self, Summary};
use crate::{api, utils, Config, Result};
use anyhow::{bail, Context};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Runs the whole pipeline over a ledger file and writes the ranked report.
///
/// # Errors
/// - Returns a `Source` error if the ledger cannot be opened or read.
/// - Returns a `Serialization` error if the report cannot be encoded.
/// - Returns an `Output` error if the report cannot be written.
pub async fn report(config: &Config, args: &ReportArgs) -> Result<Out<LedgerStats>> {
    let ledger = args.ledger();
    let summary = summarize(config, ledger).await?;
    let report = if args.members() {
        summary.report_with_members()
    } else {
        summary.report().clone()
    };
    let text = report.render(ledger.format())?;
    emit(&text, ledger.output()).await?;
    Ok(Out::new(
        format!(
            "Ranked {} vendor groups from {} records ({} cancelled, {} rows skipped)",
            report.len(),
            summary.stats().records,
            summary.cancelled(),
            summary.stats().skipped()
        ),
        summary.stats(),
    ))
}

/// Writes the per-vendor totals of a ledger file, keyed by exact vendor name, without clustering.
///
/// # Errors
/// - Returns the same errors as `report`.
pub async fn vendors(config: &Config, args: &VendorsArgs) -> Result<Out<LedgerStats>> {
    let ledger = args.ledger();
    let summary = summarize(config, ledger).await?;
    let rows = summary.vendors().to_rows();
    let text = render_rows(&rows, ledger.format())?;
    emit(&text, ledger.output()).await?;
    Ok(Out::new(
        format!(
            "Listed {} vendor names from {} records ({} cancelled, {} rows skipped)",
            rows.len(),
            summary.stats().records,
            summary.cancelled(),
            summary.stats().skipped()
        ),
        summary.stats(),
    ))
}

async fn summarize(config: &Config, args: &LedgerArgs) -> Result<Summary> {
    let options = SourceOptions {
        delimiter: delimiter_byte(args.delimiter()).pub_result(ErrorType::Source)?,
    };
    let mut source = api::source(args.file(), &options).pub_result(ErrorType::Source)?;
    debug!("Reading the ledger at {}", args.file().display());
    pipeline::run(source.as_mut(), config.layout()).await
}

fn delimiter_byte(c: char) -> Result<u8> {
    if !c.is_ascii() {
        bail!("The delimiter must be a single ASCII character, got '{c}'")
    }
    Ok(c as u8)
}

/// Writes `text` to `output`, or to stdout when there is no output path.
async fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    let mut text = text.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }
    let written = match output {
        Some(path) => utils::write(path, text).await,
        None => write_stdout(&text).await,
    };
    written.pub_result(ErrorType::Output)
}

async fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(text.as_bytes())
        .await
        .context("Unable to write to stdout")?;
    stdout.flush().await.context("Unable to flush stdout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutputFormat;
    use crate::test::{ledger_csv, ledger_row, TestEnv};

    #[tokio::test]
    async fn test_report_to_file() {
        let env = TestEnv::new().await;
        let file = env.write_ledger(
            "ledger.csv",
            &ledger_csv(
                &[
                    ledger_row("Acme Corp", "100", "No"),
                    ledger_row("acme corp", "50", "No"),
                    ledger_row("Other Co", "10", "Si"),
                    ledger_row("Beta", "12,34", "No"),
                ],
                ',',
            ),
        );
        let output = env.path("report.json");
        let args = ReportArgs::new(
            LedgerArgs::new(&file, OutputFormat::Json, Some(output.clone()), ','),
            false,
        );

        let out = report(&env.config(), &args).await.unwrap();
        assert!(out.message().contains("Ranked 1 vendor groups"), "{}", out.message());
        let stats = out.structure().unwrap();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.bad_amounts, 1);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"Grupo": "Acme Corp", "Cantidad": 2, "Gasto": 150}])
        );
    }

    #[tokio::test]
    async fn test_report_with_members_and_delimiter() {
        let env = TestEnv::new().await;
        let file = env.write_ledger(
            "ledger.csv",
            &ledger_csv(
                &[
                    ledger_row("Acme Corp", "100", "No"),
                    ledger_row("acme", "1.5", "No"),
                ],
                ';',
            ),
        );
        let output = env.path("report.csv");
        let args = ReportArgs::new(
            LedgerArgs::new(&file, OutputFormat::Csv, Some(output.clone()), ';'),
            true,
        );
        report(&env.config(), &args).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Grupo,Cantidad,Gasto,Miembros\nAcme Corp,2,101.5,Acme Corp; acme\n"
        );
    }

    #[tokio::test]
    async fn test_vendors_lists_exact_names() {
        let env = TestEnv::new().await;
        let file = env.write_ledger(
            "ledger.csv",
            &ledger_csv(
                &[
                    ledger_row("Acme Corp", "100", "No"),
                    ledger_row("acme corp", "50", "No"),
                ],
                ',',
            ),
        );
        let output = env.path("vendors.json");
        let args = VendorsArgs::new(LedgerArgs::new(
            &file,
            OutputFormat::Json,
            Some(output.clone()),
            ',',
        ));
        vendors(&env.config(), &args).await.unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["Proveedor"], "acme corp");
    }

    #[tokio::test]
    async fn test_missing_ledger_is_a_source_error() {
        let env = TestEnv::new().await;
        let args = ReportArgs::new(
            LedgerArgs::new(env.path("missing.csv"), OutputFormat::Json, None, ','),
            false,
        );
        let err = report(&env.config(), &args).await.unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Source));
    }

    #[tokio::test]
    async fn test_unsupported_file_type_is_a_source_error() {
        let env = TestEnv::new().await;
        let file = env.write_ledger("ledger.txt", "whatever");
        let args = ReportArgs::new(LedgerArgs::new(file, OutputFormat::Json, None, ','), false);
        let err = report(&env.config(), &args).await.unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Source));
    }

    #[tokio::test]
    async fn test_unwritable_output_is_an_output_error() {
        let env = TestEnv::new().await;
        let file = env.write_ledger(
            "ledger.csv",
            &ledger_csv(&[ledger_row("Acme", "1", "No")], ','),
        );
        let output = env.path("no-such-dir").join("report.json");
        let args = ReportArgs::new(
            LedgerArgs::new(file, OutputFormat::Json, Some(output), ','),
            false,
        );
        let err = report(&env.config(), &args).await.unwrap_err();
        assert_eq!(ErrorType::of(&err), Some(ErrorType::Output));
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert_eq!(delimiter_byte('\t').unwrap(), b'\t');
        assert!(delimiter_byte('¦').is_err());
    }
}
