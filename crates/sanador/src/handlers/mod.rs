//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains the execution logic for one CLI command
//! plus its pure helpers and tests.

pub mod classify;
pub mod config;
pub mod detect;
pub mod heal;
pub mod run;

pub use classify::execute_classify;
pub use config::{execute_config, load_engine_config};
pub use detect::execute_detect;
pub use heal::execute_heal;
pub use run::execute_run;

use crate::error::{CliError, CliResult};

/// Multi-threaded runtime for the async engine calls
pub(crate) fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("failed to start async runtime: {e}")))
}
