//! Runner report model and parsing.
//!
//! The runner writes one JSON document describing a tree of suites, specs,
//! per-project tests and per-retry attempts. Tooling commonly prints a
//! preamble (install hints, warnings) before the document, so parsing starts
//! at the first `{` and stops after one complete JSON value.
//!
//! ```text
//! Report
//!  ├─ stats    (aggregate counts, used when the tree is empty)
//!  ├─ errors   (file-level load errors)
//!  └─ suites ─┬─ specs ── tests ── results (attempts; the LAST one counts)
//!             └─ suites (nested describe blocks)
//! ```

use crate::model::FailureRecord;
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level runner report
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Root suites (one per file)
    #[serde(default)]
    pub suites: Vec<Suite>,
    /// Aggregate counts
    #[serde(default)]
    pub stats: Option<Stats>,
    /// Errors raised outside any test
    #[serde(default)]
    pub errors: Vec<ReportError>,
}

/// A suite (file or describe block)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suite {
    /// Suite title
    #[serde(default)]
    pub title: String,
    /// Source file
    #[serde(default)]
    pub file: Option<String>,
    /// Specs declared directly in this suite
    #[serde(default)]
    pub specs: Vec<Spec>,
    /// Nested suites
    #[serde(default)]
    pub suites: Vec<Suite>,
}

/// A single `test(...)` declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    /// Test title
    #[serde(default)]
    pub title: String,
    /// Source file
    #[serde(default)]
    pub file: Option<String>,
    /// One entry per configured project
    #[serde(default)]
    pub tests: Vec<SpecTest>,
}

/// A spec run under one project
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecTest {
    /// Project name (browser)
    #[serde(default)]
    pub project_name: Option<String>,
    /// Outcome summary (`expected`, `unexpected`, `flaky`, `skipped`)
    #[serde(default)]
    pub status: Option<String>,
    /// Attempts in execution order
    #[serde(default)]
    pub results: Vec<TestAttempt>,
}

/// One attempt (initial run or retry)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAttempt {
    /// Attempt status
    #[serde(default)]
    pub status: AttemptStatus,
    /// Attempt duration in milliseconds
    #[serde(default)]
    pub duration: u64,
    /// Primary error
    #[serde(default)]
    pub error: Option<ReportError>,
    /// All errors raised during the attempt
    #[serde(default)]
    pub errors: Vec<ReportError>,
    /// Files attached to the attempt
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Retry index
    #[serde(default)]
    pub retry: u32,
}

/// Status of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptStatus {
    /// Attempt passed
    Passed,
    /// Assertion or runtime failure
    #[default]
    Failed,
    /// Exceeded the test timeout
    TimedOut,
    /// Skipped
    Skipped,
    /// Interrupted by the runner
    Interrupted,
    /// Unknown status string
    #[serde(other)]
    Other,
}

/// Error payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportError {
    /// Message text
    #[serde(default)]
    pub message: Option<String>,
    /// Stack trace
    #[serde(default)]
    pub stack: Option<String>,
}

impl ReportError {
    /// Message, falling back to stack
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.stack.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// Attached file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Attachment name
    #[serde(default)]
    pub name: String,
    /// MIME type
    #[serde(default)]
    pub content_type: String,
    /// Path on disk (inline bodies have none)
    #[serde(default)]
    pub path: Option<String>,
}

impl Attachment {
    fn is_image(&self) -> bool {
        self.content_type.starts_with("image/") || self.name.eq_ignore_ascii_case("screenshot")
    }

    fn is_full_page(&self) -> bool {
        let name: String = self
            .name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        name.contains("fullpage")
    }
}

/// Aggregate counts
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Tests that behaved as expected
    #[serde(default)]
    pub expected: usize,
    /// Tests that failed
    #[serde(default)]
    pub unexpected: usize,
    /// Tests that passed on retry
    #[serde(default)]
    pub flaky: usize,
    /// Skipped tests
    #[serde(default)]
    pub skipped: usize,
}

/// Counts and failures extracted from a report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tally {
    /// Passed tests
    pub passed: usize,
    /// Failed tests
    pub failed: usize,
    /// Skipped tests
    pub skipped: usize,
    /// Failure detail in traversal order
    pub failures: Vec<FailureRecord>,
    /// Counts came from `stats` because the tree was empty
    pub from_stats: bool,
}

impl Tally {
    /// Total counted tests
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }
}

/// Decode the first JSON object in `raw`, ignoring any preamble and trailer
#[must_use]
pub fn extract_report(raw: &str) -> Option<Report> {
    let start = raw.find('{')?;
    let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Report>();
    match stream.next() {
        Some(Ok(report)) => Some(report),
        Some(Err(e)) => {
            tracing::debug!(error = %e, "runner output is not a report document");
            None
        }
        None => None,
    }
}

/// Walk a report into counts and failure records
#[must_use]
pub fn tally(report: &Report, excerpt_chars: usize) -> Tally {
    let mut out = Tally::default();
    for suite in &report.suites {
        walk_suite(suite, None, excerpt_chars, &mut out);
    }

    if out.total() > 0 {
        return out;
    }

    // Load errors carry the only useful detail when nothing ran
    if !report.errors.is_empty() {
        for err in &report.errors {
            let text = err.text().unwrap_or("runner reported an error");
            out.failed += 1;
            out.failures.push(FailureRecord::new(
                "Test file failed to load",
                String::new(),
                excerpt(text, excerpt_chars),
            ));
        }
    } else if let Some(stats) = report.stats {
        out.passed = stats.expected + stats.flaky;
        out.failed = stats.unexpected;
        out.skipped = stats.skipped;
        out.from_stats = true;
    }
    out
}

fn walk_suite(
    suite: &Suite,
    parent_file: Option<&str>,
    excerpt_chars: usize,
    out: &mut Tally,
) {
    let file = suite.file.as_deref().or(parent_file);
    for spec in &suite.specs {
        let spec_file = spec.file.as_deref().or(file).unwrap_or("");
        for test in &spec.tests {
            count_test(spec, spec_file, test, excerpt_chars, out);
        }
    }
    for child in &suite.suites {
        walk_suite(child, file, excerpt_chars, out);
    }
}

fn count_test(
    spec: &Spec,
    file: &str,
    test: &SpecTest,
    excerpt_chars: usize,
    out: &mut Tally,
) {
    let Some(last) = test.results.last() else {
        // No attempts recorded: fall back to the summary status
        match test.status.as_deref() {
            Some("expected" | "flaky") => out.passed += 1,
            Some("skipped") => out.skipped += 1,
            _ => {
                out.failed += 1;
                out.failures.push(FailureRecord::new(
                    spec.title.clone(),
                    file,
                    "test did not record any attempt",
                ));
            }
        }
        return;
    };

    tracing::debug!(
        title = %spec.title,
        status = ?last.status,
        attempts = test.results.len(),
        "test outcome"
    );
    match last.status {
        AttemptStatus::Passed => out.passed += 1,
        AttemptStatus::Skipped => out.skipped += 1,
        _ => {
            out.failed += 1;
            out.failures
                .push(failure_from_attempt(&spec.title, file, last, excerpt_chars));
        }
    }
}

fn failure_from_attempt(
    title: &str,
    file: &str,
    attempt: &TestAttempt,
    excerpt_chars: usize,
) -> FailureRecord {
    let text = attempt
        .error
        .as_ref()
        .and_then(ReportError::text)
        .or_else(|| attempt.errors.iter().find_map(ReportError::text))
        .map_or_else(
            || match attempt.status {
                AttemptStatus::TimedOut => "Test timed out".to_string(),
                AttemptStatus::Interrupted => "Test was interrupted".to_string(),
                _ => "Test failed without an error message".to_string(),
            },
            |t| excerpt(t, excerpt_chars),
        );

    let mut record = FailureRecord::new(title, file, text);
    if let Some(path) = pick_screenshot(&attempt.attachments) {
        record.screenshot = Some(path);
    }
    record
}

/// Full-page capture wins over any other image attachment
fn pick_screenshot(attachments: &[Attachment]) -> Option<PathBuf> {
    let with_path = || attachments.iter().filter(|a| a.path.is_some());
    with_path()
        .find(|a| a.is_full_page())
        .or_else(|| with_path().find(|a| a.is_image()))
        .and_then(|a| a.path.as_ref())
        .map(PathBuf::from)
}

/// Strip ANSI escapes and keep the first `max_chars` characters
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> String {
    strip_ansi(text).chars().take(max_chars).collect()
}

/// Remove terminal escape sequences (colours, hyperlinks, cursor moves)
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}
