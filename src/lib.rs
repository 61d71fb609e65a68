//! vendor-spend reads an expense ledger, totals the spend of every vendor, merges vendors whose
//! names are approximately equal, and ranks the resulting groups by spend.
//!
//! The stages are, in order: `model::Record::parse` for single rows, `model::Ledger` for whole
//! sources, `model::VendorTotals::aggregate`, `model::Groups::cluster` and `model::Report::rank`.
//! `pipeline::run` drives all of them over any `api::LedgerSource`.

pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod pipeline;
mod utils;


pub use config::Config;
pub use error::{Error, ErrorType, IntoResult, Result};
