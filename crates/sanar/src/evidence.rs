//! Evidence reconciliation.
//!
//! Artifact instrumentation writes one JSON file per failing test into the
//! evidence directory, named after a slug of the test title. The reconciler
//! finds that file for each [`FailureRecord`] and overlays its captures.
//!
//! Lookup order:
//!
//! 1. `<dir>/<slug>.json` exactly
//! 2. any `<dir>/*.json` whose stem slug is a prefix of, or prefixed by, the
//!    derived slug (titles drift slightly between the report and the
//!    instrumentation that wrote the file); the closest-length candidate
//!    wins, ties broken by name
//!
//! A missing or unreadable file is never an error.

use crate::model::{ExecutionResult, FailureRecord, NetworkEntry};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Captures written by artifact instrumentation for one failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Evidence {
    /// Title the instrumentation saw
    pub title: Option<String>,
    /// Screenshot path
    #[serde(alias = "screenshotPath")]
    pub screenshot: Option<PathBuf>,
    /// Console errors
    #[serde(alias = "consoleLogs")]
    pub console_errors: Vec<String>,
    /// Network requests
    #[serde(alias = "networkRequests", alias = "networkLog")]
    pub network: Vec<NetworkEntry>,
    /// Serialized DOM at failure time
    #[serde(alias = "dom")]
    pub dom_snapshot: Option<String>,
}

impl Evidence {
    /// Read and decode an evidence file
    pub fn load(path: &Path) -> Option<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "evidence file unreadable");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(evidence) => Some(evidence),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "evidence file is not valid JSON"
                );
                None
            }
        }
    }
}

/// Derive the filesystem-safe slug for a test title
///
/// Lowercase ASCII alphanumerics are kept; every run of anything else
/// becomes one `-`; leading and trailing separators are trimmed.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Whether one slug is the other cut at a `-` boundary
fn word_prefix(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    long.strip_prefix(short)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
}

/// Matches failures to evidence files in one directory
#[derive(Debug, Clone)]
pub struct EvidenceReconciler {
    dir: PathBuf,
}

impl EvidenceReconciler {
    /// Create a reconciler over `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Evidence directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Locate the evidence file for a title
    #[must_use]
    pub fn locate(&self, title: &str) -> Option<PathBuf> {
        let slug = slugify(title);
        if slug.is_empty() {
            return None;
        }
        let exact = self.dir.join(format!("{slug}.json"));
        if exact.is_file() {
            return Some(exact);
        }
        self.fuzzy_match(&slug)
    }

    fn fuzzy_match(&self, slug: &str) -> Option<PathBuf> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(
                    dir = %self.dir.display(),
                    error = %e,
                    "evidence directory unavailable"
                );
                return None;
            }
        };

        let mut best: Option<(usize, String, PathBuf)> = None;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let candidate = slugify(stem);
            if candidate.is_empty() || !word_prefix(&candidate, slug) {
                continue;
            }
            let distance = candidate.len().abs_diff(slug.len());
            let name = stem.to_string();
            let better = best
                .as_ref()
                .map_or(true, |(d, n, _)| (distance, &name) < (*d, n));
            if better {
                best = Some((distance, name, path));
            }
        }
        best.map(|(_, _, path)| path)
    }

    /// Overlay evidence onto one record; returns whether a file matched
    pub fn reconcile_record(&self, record: &mut FailureRecord) -> bool {
        let Some(path) = self.locate(&record.title) else {
            tracing::debug!(title = %record.title, "no evidence for failure");
            return false;
        };
        let Some(evidence) = Evidence::load(&path) else {
            return false;
        };
        tracing::debug!(title = %record.title, path = %path.display(), "evidence matched");
        apply(record, evidence);
        true
    }

    /// Overlay evidence onto every failure of a result; returns match count
    pub fn reconcile(&self, result: &mut ExecutionResult) -> usize {
        result
            .failures
            .iter_mut()
            .map(|record| self.reconcile_record(record))
            .filter(|matched| *matched)
            .count()
    }
}

/// The evidence file is the authoritative capture: its fields replace the
/// record's. The runner's screenshot is kept only when the file has none.
fn apply(record: &mut FailureRecord, evidence: Evidence) {
    if let Some(shot) = evidence.screenshot {
        record.screenshot = Some(shot);
    }
    record.console_errors = evidence.console_errors;
    record.network = evidence.network;
    record.dom_snapshot = evidence.dom_snapshot;
}
