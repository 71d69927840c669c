//! Output formatting and progress reporting

use crate::error::CliResult;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use sanar::{DetectedLocator, ExecutionResult, HealingReport, RunSummary};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Progress reporter for artifact processing (stderr)
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` artifacts
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message (shown even in quiet mode)
    pub fn failure(&self, message: &str) {
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    fn line(&self, text: &str) {
        match &self.progress_bar {
            Some(pb) if !pb.is_finished() => pb.println(text),
            _ => {
                let _ = self.term.write_line(text);
            }
        }
    }
}

/// Serialize a value as pretty JSON
pub fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Render `value` as pretty JSON or through the `text` renderer
pub fn render<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(text(value)),
        OutputFormat::Json => to_json(value),
    }
}

/// Write a rendered report to `output`, or stdout when absent
pub fn emit(text: &str, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => std::fs::write(path, text)?,
        None => println!("{}", text.trim_end()),
    }
    Ok(())
}

fn paint(text: &str, with: &Style, use_color: bool) -> String {
    if use_color {
        with.apply_to(text).to_string()
    } else {
        text.to_string()
    }
}

/// Text block for one execution result and its diagnosed failures
#[must_use]
pub fn render_result(result: &ExecutionResult, use_color: bool) -> String {
    let mut out = String::new();
    let (mark, mark_style) = if result.success {
        ("PASSED", Style::new().green().bold())
    } else {
        ("FAILED", Style::new().red().bold())
    };
    let _ = writeln!(
        out,
        "{} {} [{}] {} passed, {} failed, {} skipped in {:.2}s",
        paint(mark, &mark_style, use_color),
        result.artifact.display(),
        result.kind,
        result.passed,
        result.failed,
        result.skipped,
        result.duration.as_secs_f64()
    );
    if result.heal_attempts > 0 {
        let _ = writeln!(out, "  heal attempts: {}", result.heal_attempts);
    }
    if result.unparseable {
        let _ = writeln!(out, "  runner output could not be parsed");
    }

    for failure in &result.failures {
        let _ = writeln!(out, "  - {}", paint(&failure.title, &Style::new().bold(), use_color));
        let first_line = failure.error.lines().next().unwrap_or_default();
        let _ = writeln!(out, "      error:    {first_line}");
        if let Some(rca) = &failure.root_cause {
            let _ = writeln!(
                out,
                "      category: {} ({}; signal: {})",
                paint(rca.category.label(), &Style::new().yellow(), use_color),
                rca.assignee,
                rca.signal
            );
            let _ = writeln!(out, "      reason:   {}", rca.reason);
            let _ = writeln!(out, "      fix:      {}", rca.suggested_fix);
            for (i, line) in rca.api_log.lines().enumerate() {
                let label = if i == 0 { "api:     " } else { "         " };
                let _ = writeln!(out, "      {label} {line}");
            }
            if !rca.evidence.is_empty() {
                let _ = writeln!(out, "      evidence: {}", rca.evidence.join(", "));
            }
        }
    }
    out
}

/// Text block for one healing pass
#[must_use]
pub fn render_healing(report: &HealingReport, use_color: bool) -> String {
    let mut out = String::new();
    let verb = if report.dry_run { "would heal" } else { "healed" };
    let _ = writeln!(
        out,
        "{}: {} locator(s) found, {verb} {}, {} left{}",
        report.artifact.display(),
        report.total_locators,
        report.healed,
        report.failed,
        if report.rewritten { " (file rewritten)" } else { "" }
    );
    for r in &report.results {
        let status = if r.success {
            paint("healed", &Style::new().green(), use_color)
        } else {
            paint("unhealed", &Style::new().red(), use_color)
        };
        let _ = writeln!(out, "  line {:>4}  {status}  {}", r.line, r.original);
        if r.success {
            let _ = writeln!(
                out,
                "             -> {}  [{}, confidence {:.2}]",
                r.healed, r.tier, r.confidence
            );
        }
    }
    out
}

/// Text listing of detected locators
#[must_use]
pub fn render_locators(path: &Path, locators: &[DetectedLocator]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: {} brittle locator(s)", path.display(), locators.len());
    for l in locators {
        let _ = writeln!(out, "  line {:>4}  {:<10}  {}", l.line, l.kind, l.expression);
    }
    out
}

/// Text summary of a batch
#[must_use]
pub fn render_summary(summary: &RunSummary, use_color: bool) -> String {
    let mut out = String::new();
    for outcome in &summary.outcomes {
        out.push_str(&render_result(&outcome.result, use_color));
        for report in &outcome.healing {
            out.push_str(&render_healing(report, use_color));
        }
    }
    let status = if summary.success() {
        paint("ALL GREEN", &Style::new().green().bold(), use_color)
    } else {
        paint("NEEDS REVIEW", &Style::new().red().bold(), use_color)
    };
    let _ = writeln!(
        out,
        "\n{status} {} artifact(s): {} passed, {} failed, {} skipped; \
         {} locator(s) healed; {} still failing",
        summary.outcomes.len(),
        summary.passed,
        summary.failed,
        summary.skipped,
        summary.healed_locators,
        summary.still_failing
    );
    out
}
