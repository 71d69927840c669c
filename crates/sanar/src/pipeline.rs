//! Sequential orchestration.
//!
//! One artifact at a time, in input order:
//!
//! ```text
//! execute ─► reconcile evidence ─► classify ─► [failed > 0 && healing] heal loop ─► reconcile + classify
//! ```
//!
//! Only a runner that cannot be launched aborts; every other degradation
//! shows up as missing detail in the outcome.

use crate::classify::FailureClassifier;
use crate::config::SanarConfig;
use crate::evidence::EvidenceReconciler;
use crate::execution::{CommandBackend, ExecutionRunner, RunnerBackend};
use crate::heal::{HealingReport, LocatorHealer};
use crate::llm::{generator_from_config, Generator};
use crate::model::{ExecutionResult, TestArtifact};
use crate::result::SanarResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Everything produced for one artifact
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactOutcome {
    /// Final (possibly post-healing) result
    pub result: ExecutionResult,
    /// One report per healing pass
    pub healing: Vec<HealingReport>,
}

impl ArtifactOutcome {
    /// Locators healed across all passes
    #[must_use]
    pub fn healed_locators(&self) -> usize {
        self.healing.iter().map(|r| r.healed).sum()
    }

    /// Whether a human has to look at this artifact
    #[must_use]
    pub const fn needs_review(&self) -> bool {
        !self.result.success
    }
}

/// Outcome of a batch
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the batch started
    pub started_at: DateTime<Utc>,
    /// When the batch finished
    pub finished_at: DateTime<Utc>,
    /// Per-artifact outcomes in input order
    pub outcomes: Vec<ArtifactOutcome>,
    /// Passed tests across artifacts
    pub passed: usize,
    /// Failed tests across artifacts
    pub failed: usize,
    /// Skipped tests across artifacts
    pub skipped: usize,
    /// All tests across artifacts
    pub total: usize,
    /// Locators healed across artifacts
    pub healed_locators: usize,
    /// Artifacts still failing after healing
    pub still_failing: usize,
}

impl RunSummary {
    /// Aggregate outcomes
    #[must_use]
    pub fn from_outcomes(started_at: DateTime<Utc>, outcomes: Vec<ArtifactOutcome>) -> Self {
        let sum = |f: fn(&ExecutionResult) -> usize| outcomes.iter().map(|o| f(&o.result)).sum();
        Self {
            started_at,
            finished_at: Utc::now(),
            passed: sum(|r| r.passed),
            failed: sum(|r| r.failed),
            skipped: sum(|r| r.skipped),
            total: sum(|r| r.total),
            healed_locators: outcomes.iter().map(ArtifactOutcome::healed_locators).sum(),
            still_failing: outcomes.iter().filter(|o| o.needs_review()).count(),
            outcomes,
        }
    }

    /// Whether every artifact ended green
    #[must_use]
    pub const fn success(&self) -> bool {
        self.still_failing == 0
    }
}

/// Runs the full engine over artifacts
#[derive(Debug, Clone)]
pub struct Pipeline {
    runner: ExecutionRunner,
    reconciler: EvidenceReconciler,
    classifier: FailureClassifier,
    healer: LocatorHealer,
    heal_enabled: bool,
}

impl Pipeline {
    /// Assemble a pipeline over explicit collaborators
    pub fn new(
        config: &SanarConfig,
        backend: Arc<dyn RunnerBackend>,
        generator: Arc<dyn Generator>,
    ) -> SanarResult<Self> {
        config.validate()?;
        Ok(Self {
            runner: ExecutionRunner::new(&config.runner, backend),
            reconciler: EvidenceReconciler::new(config.evidence.dir.clone()),
            classifier: FailureClassifier::new(&config.classifier, Arc::clone(&generator))?,
            healer: LocatorHealer::new(&config.healer, generator)?,
            heal_enabled: true,
        })
    }

    /// Assemble the production pipeline described by configuration
    pub fn from_config(config: &SanarConfig) -> SanarResult<Self> {
        Self::new(
            config,
            Arc::new(CommandBackend::new(config.runner.clone())),
            generator_from_config(config.llm.as_ref()),
        )
    }

    /// Enable or disable the heal loop
    #[must_use]
    pub const fn with_healing(mut self, enabled: bool) -> Self {
        self.heal_enabled = enabled;
        self
    }

    /// The runner
    #[must_use]
    pub const fn runner(&self) -> &ExecutionRunner {
        &self.runner
    }

    /// The evidence reconciler
    #[must_use]
    pub const fn reconciler(&self) -> &EvidenceReconciler {
        &self.reconciler
    }

    /// The classifier
    #[must_use]
    pub const fn classifier(&self) -> &FailureClassifier {
        &self.classifier
    }

    /// The healer
    #[must_use]
    pub const fn healer(&self) -> &LocatorHealer {
        &self.healer
    }

    /// Reconcile evidence and classify every failure of a result
    pub async fn diagnose(&self, result: &mut ExecutionResult) {
        if result.failures.is_empty() {
            return;
        }
        let matched = self.reconciler.reconcile(result);
        let classified = self.classifier.classify_all(result).await;
        tracing::info!(
            artifact = %result.artifact.display(),
            failures = result.failures.len(),
            evidence = matched,
            classified,
            "failures diagnosed"
        );
    }

    /// Process one artifact
    pub async fn process(&self, artifact: &TestArtifact) -> SanarResult<ArtifactOutcome> {
        let mut result = self.runner.execute(artifact).await?;
        self.diagnose(&mut result).await;

        if result.failed == 0 || !self.heal_enabled {
            return Ok(ArtifactOutcome {
                result,
                healing: Vec::new(),
            });
        }

        let outcome = self.healer.heal_and_rerun(&self.runner, artifact, result).await?;
        let mut result = outcome.result;
        if outcome.attempts > 0 {
            self.diagnose(&mut result).await;
        }
        Ok(ArtifactOutcome {
            result,
            healing: outcome.reports,
        })
    }

    /// Process artifacts sequentially in input order
    pub async fn process_all(&self, artifacts: &[TestArtifact]) -> SanarResult<RunSummary> {
        self.process_all_with(artifacts, |_| {}).await
    }

    /// Like [`Pipeline::process_all`], calling `on_outcome` after each artifact
    pub async fn process_all_with(
        &self,
        artifacts: &[TestArtifact],
        mut on_outcome: impl FnMut(&ArtifactOutcome),
    ) -> SanarResult<RunSummary> {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let outcome = self.process(artifact).await?;
            on_outcome(&outcome);
            outcomes.push(outcome);
        }
        let summary = RunSummary::from_outcomes(started_at, outcomes);
        tracing::info!(
            artifacts = artifacts.len(),
            passed = summary.passed,
            failed = summary.failed,
            healed = summary.healed_locators,
            still_failing = summary.still_failing,
            "batch complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::classify::RootCauseCategory;
    use crate::execution::{report_with, ScriptedBackend};
    use crate::llm::ScriptedGenerator;
    use crate::model::ArtifactKind;

    fn pipeline(
        config: &SanarConfig,
        backend: Arc<ScriptedBackend>,
        generator: Arc<ScriptedGenerator>,
    ) -> Pipeline {
        Pipeline::new(config, backend, generator).unwrap()
    }

    #[tokio::test]
    async fn test_failure_is_diagnosed_with_evidence() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("saves-profile.json"),
            r#"{"networkRequests":[{"method":"PUT","url":"/api/profile","status":503,"responseTime":12}]}"#,
        )
        .unwrap();
        let config = SanarConfig::default().with_evidence_dir(dir.path());
        let backend = Arc::new(ScriptedBackend::repeating(&report_with(&[(
            "saves profile",
            "failed",
        )])));
        let generator = Arc::new(ScriptedGenerator::replying(
            r#"{"reason": "PUT /api/profile returned 503.", "fix": "Restore the profile service."}"#,
        ));
        let p = pipeline(&config, backend, generator).with_healing(false);

        let outcome = p
            .process(&TestArtifact::new("profile.spec.ts", ArtifactKind::E2e))
            .await
            .unwrap();
        let rca = outcome.result.failures[0].root_cause.as_ref().unwrap();
        assert_eq!(rca.category, RootCauseCategory::Backend);
        assert_eq!(rca.reason, "PUT /api/profile returned 503.");
        assert!(rca.api_log.contains("PUT /api/profile -> 503"));
        assert!(outcome.healing.is_empty());
        assert!(outcome.needs_review());
    }

    #[tokio::test]
    async fn test_heals_and_rediagnoses_final_result() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("menu.spec.ts");
        std::fs::write(&spec, "await page.locator('.open-menu').click();\n").unwrap();
        let config = SanarConfig::default().with_evidence_dir(dir.path());
        let backend = Arc::new(ScriptedBackend::sequence(&[
            &report_with(&[("opens menu", "failed"), ("closes menu", "failed")]),
            &report_with(&[("opens menu", "passed"), ("closes menu", "failed")]),
            &report_with(&[("opens menu", "passed"), ("closes menu", "passed")]),
        ]));
        let p = pipeline(&config, backend.clone(), Arc::new(ScriptedGenerator::failing()));

        let outcome = p.process(&TestArtifact::new(&spec, ArtifactKind::E2e)).await.unwrap();
        assert!(outcome.result.success);
        assert_eq!(outcome.result.heal_attempts, 2);
        assert_eq!(outcome.healing.len(), 2);
        assert_eq!(outcome.healed_locators(), 1);
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_still_failing_result_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("x.spec.ts");
        std::fs::write(&spec, "await page.getByRole('button').click();\n").unwrap();
        let mut config = SanarConfig::default().with_evidence_dir(dir.path());
        config.healer.max_attempts = 2;
        let backend = Arc::new(ScriptedBackend::repeating(&report_with(&[("x", "failed")])));
        let p = pipeline(&config, backend.clone(), Arc::new(ScriptedGenerator::failing()));

        let outcome = p.process(&TestArtifact::new(&spec, ArtifactKind::E2e)).await.unwrap();
        assert!(!outcome.result.success);
        assert_eq!(outcome.result.heal_attempts, 2);
        assert!(outcome.result.failures[0].root_cause.is_some());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_process_all_totals_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = SanarConfig::default().with_evidence_dir(dir.path());
        let backend = Arc::new(ScriptedBackend::sequence(&[
            &report_with(&[("a", "passed"), ("b", "skipped")]),
            &report_with(&[("c", "failed")]),
        ]));
        let p = pipeline(&config, backend, Arc::new(ScriptedGenerator::failing()))
            .with_healing(false);
        let artifacts = [
            TestArtifact::new("one.spec.ts", ArtifactKind::E2e),
            TestArtifact::new("two.spec.ts", ArtifactKind::Api),
        ];

        let summary = p.process_all(&artifacts).await.unwrap();
        assert_eq!((summary.passed, summary.failed, summary.skipped, summary.total), (1, 1, 1, 3));
        assert_eq!(summary.still_failing, 1);
        assert!(!summary.success());
        assert_eq!(summary.outcomes[1].result.kind, ArtifactKind::Api);
        assert!(summary.finished_at >= summary.started_at);
    }

    #[tokio::test]
    async fn test_process_all_with_reports_each_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let config = SanarConfig::default().with_evidence_dir(dir.path());
        let backend = Arc::new(ScriptedBackend::repeating(&report_with(&[("a", "passed")])));
        let p = pipeline(&config, backend, Arc::new(ScriptedGenerator::failing()));
        let artifacts = [
            TestArtifact::new("one.spec.ts", ArtifactKind::E2e),
            TestArtifact::new("two.spec.ts", ArtifactKind::E2e),
        ];

        let mut seen = Vec::new();
        let summary = p
            .process_all_with(&artifacts, |o| seen.push(o.result.artifact.clone()))
            .await
            .unwrap();
        assert!(summary.success());
        assert_eq!(
            seen,
            vec![
                std::path::PathBuf::from("one.spec.ts"),
                std::path::PathBuf::from("two.spec.ts"),
            ]
        );
    }

    #[tokio::test]
    async fn test_launch_failure_aborts_batch() {
        let config = SanarConfig::default();
        let p = pipeline(
            &config,
            Arc::new(ScriptedBackend::default()),
            Arc::new(ScriptedGenerator::failing()),
        );
        let err = p
            .process_all(&[TestArtifact::new("a.spec.ts", ArtifactKind::E2e)])
            .await
            .unwrap_err();
        assert!(err.is_launch_failure());
    }
}
