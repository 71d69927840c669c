//! Sanador CLI Library
//!
//! Command-line interface for the Sanar engine: run test artifacts through
//! execution, evidence reconciliation, classification and the heal loop, or
//! use each stage on its own.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    ClassifyArgs, Cli, ColorArg, Commands, ConfigArgs, DetectArgs, FormatArg, HealArgs, KindArg,
    LogFormatArg, RunArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{
    emit, render, render_healing, render_locators, render_result, render_summary, to_json,
    OutputFormat, ProgressReporter,
};
