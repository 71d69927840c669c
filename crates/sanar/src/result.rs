//! Result and error types for Sanar.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Sanar operations
pub type SanarResult<T> = Result<T, SanarError>;

/// Errors that can occur in Sanar
///
/// Most failure modes of a run are absorbed into degraded results
/// (synthetic failures, default classifications, un-healed locators).
/// Only [`SanarError::RunnerLaunch`] is expected to reach the caller of a
/// pipeline run; the remaining variants surface from explicit file and
/// configuration operations.
#[derive(Debug, Error)]
pub enum SanarError {
    /// The test runner process could not be started at all
    #[error("Failed to launch test runner `{program}` for {artifact}: {message}")]
    RunnerLaunch {
        /// Program that failed to spawn
        program: String,
        /// Artifact the run was for
        artifact: PathBuf,
        /// Underlying error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A pattern table entry failed to compile
    #[error("Invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        /// Offending pattern source
        pattern: String,
        /// Error message
        message: String,
    },

    /// Source file for healing could not be read or written
    #[error("Cannot access test source {path}: {source}")]
    Source {
        /// Path of the artifact source
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SanarError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, err: &regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        }
    }

    /// Whether this error means the run itself could not happen
    #[must_use]
    pub const fn is_launch_failure(&self) -> bool {
        matches!(self, Self::RunnerLaunch { .. })
    }
}
