use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Writes a default `config.json` at `path`, creating its directory if needed.
///
/// # Errors
/// - Returns a `Config` error if a file exists and `force` is false, or if writing fails.
pub async fn init(path: &Path, force: bool) -> Result<Out<()>> {
    let config = Config::create(path, force)
        .await
        .context("Unable to create the config file")
        .pub_result(ErrorType::Config)?;
    Ok(format!("Wrote the default config to '{}'", config.path().display()).into())
}
