//! Crate-wide error handling.
//!
//! Errors are carried as `anyhow::Error`. When an error is fatal for a command it is tagged with
//! an `ErrorType` through `IntoResult::pub_result`, so that callers can tell a ledger that could
//! not be read apart from a report that could not be encoded. Rows that are skipped during
//! ingestion are never errors.

use serde::{Deserialize, Serialize};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The category of a fatal error.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration file could not be read, parsed, validated or written.
    Config,
    /// The ledger source could not be opened or read at all.
    Source,
    /// A vendor or group total does not fit in a decimal amount.
    Overflow,
    /// The report could not be encoded into the requested output format.
    Serialization,
    /// The encoded report could not be written to its destination.
    Output,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

impl ErrorType {
    /// Returns the outermost `ErrorType` tag attached to `error`, if there is one.
    pub fn of(error: &Error) -> Option<ErrorType> {
        error.downcast_ref::<ErrorType>().copied()
    }
}

/// Tags the error side of a `Result` with an `ErrorType`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| e.into().context(error_type))
    }
}
