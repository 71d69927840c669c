//! Execution data model shared by the runner, reconciler, classifier and healer.

use crate::classify::RootCauseResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Declared category of a test artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Browser-driven end-to-end flow
    #[default]
    E2e,
    /// API-level checks
    Api,
    /// Accessibility audit
    Accessibility,
    /// Regression suite
    Regression,
}

impl ArtifactKind {
    /// Short tag used in reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::E2e => "e2e",
            Self::Api => "api",
            Self::Accessibility => "accessibility",
            Self::Regression => "regression",
        }
    }

    /// Parse a tag; unknown tags are rejected
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "e2e" | "ui" => Some(Self::E2e),
            "api" => Some(Self::Api),
            "accessibility" | "a11y" => Some(Self::Accessibility),
            "regression" => Some(Self::Regression),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generated test file handed to the runner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestArtifact {
    /// Path of the test source
    pub path: PathBuf,
    /// Declared category
    pub kind: ArtifactKind,
}

impl TestArtifact {
    /// Create a new artifact
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Path of the test source
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name used as a fallback title
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A network request captured by artifact instrumentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkEntry {
    /// HTTP method
    #[serde(default = "default_method")]
    pub method: String,
    /// Request URL
    #[serde(default)]
    pub url: String,
    /// Response status (0 when the request never completed)
    #[serde(default)]
    pub status: u16,
    /// Response time in milliseconds
    #[serde(default, alias = "duration", alias = "timing", alias = "responseTimeMs")]
    pub response_time: u64,
}

fn default_method() -> String {
    "GET".to_string()
}

impl NetworkEntry {
    /// Create a new entry
    #[must_use]
    pub fn new(method: &str, url: &str, status: u16, response_time: u64) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
            status,
            response_time,
        }
    }

    /// Whether the response carried an HTTP error status
    #[must_use]
    pub const fn is_error_status(&self) -> bool {
        self.status >= 400
    }

    /// Whether the response exceeded the given budget
    #[must_use]
    pub const fn is_slow(&self, threshold_ms: u64) -> bool {
        self.response_time > threshold_ms
    }
}

/// One failing test within an execution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Test title (key for evidence matching)
    pub title: String,
    /// File the test lives in
    pub file: String,
    /// Truncated error text
    pub error: String,
    /// Screenshot path, if one was captured
    pub screenshot: Option<PathBuf>,
    /// Console errors (filled only by reconciliation)
    pub console_errors: Vec<String>,
    /// Network requests (filled only by reconciliation)
    pub network: Vec<NetworkEntry>,
    /// DOM snapshot (filled only by reconciliation)
    pub dom_snapshot: Option<String>,
    /// Root-cause diagnosis, attached by the classifier
    pub root_cause: Option<RootCauseResult>,
}

impl FailureRecord {
    /// Create a record carrying only runner-supplied detail
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        file: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            file: file.into(),
            error: error.into(),
            screenshot: None,
            console_errors: Vec::new(),
            network: Vec::new(),
            dom_snapshot: None,
            root_cause: None,
        }
    }

    /// Attach a screenshot path
    #[must_use]
    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot = Some(path.into());
        self
    }

    /// Whether any out-of-band evidence has been merged in
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        !self.console_errors.is_empty() || !self.network.is_empty() || self.dom_snapshot.is_some()
    }
}

/// Outcome of running one artifact once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Artifact that was run
    pub artifact: PathBuf,
    /// Declared category of the artifact
    pub kind: ArtifactKind,
    /// Tests passed
    pub passed: usize,
    /// Tests failed
    pub failed: usize,
    /// Tests skipped
    pub skipped: usize,
    /// Tests counted
    pub total: usize,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Failures in report order
    pub failures: Vec<FailureRecord>,
    /// Heal-and-rerun cycles consumed to reach this result
    pub heal_attempts: u32,
    /// `failed == 0` after all attempts
    pub success: bool,
    /// Whether the runner output had to be synthesized
    pub unparseable: bool,
}

impl ExecutionResult {
    /// Build a result from counted tests
    #[must_use]
    pub fn from_counts(
        artifact: &TestArtifact,
        passed: usize,
        failed: usize,
        skipped: usize,
        failures: Vec<FailureRecord>,
        duration: Duration,
    ) -> Self {
        Self {
            artifact: artifact.path.clone(),
            kind: artifact.kind,
            passed,
            failed,
            skipped,
            total: passed + failed + skipped,
            duration,
            failures,
            heal_attempts: 0,
            success: failed == 0,
            unparseable: false,
        }
    }

    /// Whether any test failed
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Pass rate in percent (100 when nothing ran)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }
}
