//! Test execution.
//!
//! [`ExecutionRunner`] invokes the external runner for one artifact through a
//! [`RunnerBackend`] and always turns whatever came back into an
//! [`ExecutionResult`]. A non-zero exit usually just means tests failed, so
//! stdout is parsed regardless of exit status; output with no parseable report
//! becomes one synthetic failure. The only error a caller sees is a runner
//! that could not be launched.

use crate::config::RunnerConfig;
use crate::model::{ExecutionResult, FailureRecord, TestArtifact};
use crate::report::{excerpt, extract_report, tally};
use crate::result::{SanarError, SanarResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Raw output of one runner invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRun {
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Exit code (None when killed by a signal)
    pub exit_code: Option<i32>,
    /// Wall-clock duration
    pub duration: Duration,
}

/// Something that can run a test artifact and capture its output
#[async_trait]
pub trait RunnerBackend: Send + Sync + std::fmt::Debug {
    /// Run the artifact once; `Err` only when the runner cannot start
    async fn invoke(&self, artifact: &TestArtifact) -> SanarResult<RawRun>;
}

/// Spawns the configured runner program
#[derive(Debug, Clone)]
pub struct CommandBackend {
    config: RunnerConfig,
}

impl CommandBackend {
    /// Create a backend for the given runner configuration
    #[must_use]
    pub const fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Full argument list for an artifact
    #[must_use]
    pub fn arguments(&self, artifact: &TestArtifact) -> Vec<String> {
        let mut args = self.config.args.clone();
        args.push(artifact.path.display().to_string());
        if !self.config.reporter_flag.is_empty() {
            args.push(self.config.reporter_flag.clone());
        }
        args
    }
}

#[async_trait]
impl RunnerBackend for CommandBackend {
    async fn invoke(&self, artifact: &TestArtifact) -> SanarResult<RawRun> {
        let mut cmd = tokio::process::Command::new(&self.config.program);
        cmd.args(self.arguments(artifact))
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let output = cmd.output().await.map_err(|e| SanarError::RunnerLaunch {
            program: self.config.program.clone(),
            artifact: artifact.path.clone(),
            message: e.to_string(),
        })?;

        Ok(RawRun {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            duration: start.elapsed(),
        })
    }
}

/// Runs artifacts and normalizes their reports
#[derive(Debug, Clone)]
pub struct ExecutionRunner {
    backend: Arc<dyn RunnerBackend>,
    excerpt_chars: usize,
}

impl ExecutionRunner {
    /// Create a runner over an explicit backend
    #[must_use]
    pub fn new(config: &RunnerConfig, backend: Arc<dyn RunnerBackend>) -> Self {
        Self {
            backend,
            excerpt_chars: config.error_excerpt_chars,
        }
    }

    /// Create a runner that spawns the configured program
    #[must_use]
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config, Arc::new(CommandBackend::new(config.clone())))
    }

    /// Run one artifact
    pub async fn execute(&self, artifact: &TestArtifact) -> SanarResult<ExecutionResult> {
        tracing::info!(
            artifact = %artifact.path.display(),
            kind = %artifact.kind,
            "running artifact"
        );
        let raw = self.backend.invoke(artifact).await?;
        let result = self.interpret(artifact, &raw);
        tracing::info!(
            artifact = %artifact.path.display(),
            passed = result.passed,
            failed = result.failed,
            skipped = result.skipped,
            exit_code = ?raw.exit_code,
            "run finished"
        );
        Ok(result)
    }

    /// Turn captured output into a result; never fails
    #[must_use]
    pub fn interpret(&self, artifact: &TestArtifact, raw: &RawRun) -> ExecutionResult {
        let Some(report) = extract_report(&raw.stdout) else {
            tracing::warn!(artifact = %artifact.path.display(), "runner output unparseable");
            return self.synthetic_failure(artifact, raw, "Runner output could not be parsed");
        };

        let t = tally(&report, self.excerpt_chars);
        if t.from_stats {
            tracing::warn!(
                artifact = %artifact.path.display(),
                "empty suite tree, using aggregate counts"
            );
        }
        if t.total() == 0 && raw.exit_code.is_some_and(|c| c != 0) {
            return self.synthetic_failure(
                artifact,
                raw,
                "Runner exited with an error and reported no tests",
            );
        }

        ExecutionResult::from_counts(
            artifact,
            t.passed,
            t.failed,
            t.skipped,
            t.failures,
            raw.duration,
        )
    }

    fn synthetic_failure(
        &self,
        artifact: &TestArtifact,
        raw: &RawRun,
        headline: &str,
    ) -> ExecutionResult {
        let detail = if raw.stderr.trim().is_empty() {
            raw.stdout.trim()
        } else {
            raw.stderr.trim()
        };
        let text = if detail.is_empty() {
            format!("{headline} (exit code {:?}, no output)", raw.exit_code)
        } else {
            excerpt(&format!("{headline}: {detail}"), self.excerpt_chars)
        };
        let record = FailureRecord::new(
            artifact.display_name(),
            artifact.path.display().to_string(),
            text,
        );
        let mut result =
            ExecutionResult::from_counts(artifact, 0, 1, 0, vec![record], raw.duration);
        result.unparseable = true;
        result
    }
}

/// Backend replaying scripted outputs, for tests across the crate
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
    runs: std::sync::Mutex<std::collections::VecDeque<RawRun>>,
    repeat: Option<RawRun>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedBackend {
    pub(crate) fn repeating(stdout: &str) -> Self {
        Self {
            repeat: Some(RawRun {
                stdout: stdout.to_string(),
                exit_code: Some(1),
                ..RawRun::default()
            }),
            ..Self::default()
        }
    }

    pub(crate) fn sequence(outputs: &[&str]) -> Self {
        let runs = outputs
            .iter()
            .map(|s| RawRun {
                stdout: (*s).to_string(),
                exit_code: Some(1),
                ..RawRun::default()
            })
            .collect();
        Self {
            runs: std::sync::Mutex::new(runs),
            ..Self::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl RunnerBackend for ScriptedBackend {
    async fn invoke(&self, artifact: &TestArtifact) -> SanarResult<RawRun> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let next = self
            .runs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        next.or_else(|| self.repeat.clone())
            .ok_or_else(|| SanarError::RunnerLaunch {
                program: "scripted".to_string(),
                artifact: artifact.path.clone(),
                message: "script exhausted".to_string(),
            })
    }
}

/// Minimal report JSON with one spec per (title, final status)
#[cfg(test)]
pub(crate) fn report_with(tests: &[(&str, &str)]) -> String {
    let specs: Vec<String> = tests
        .iter()
        .map(|(title, status)| {
            format!(
                r#"{{"title":"{title}","tests":[{{"results":[{{"status":"{status}","error":{{"message":"locator.click: element not found"}}}}]}}]}}"#
            )
        })
        .collect();
    format!(
        r#"{{"suites":[{{"title":"a.spec.ts","file":"a.spec.ts","specs":[{}]}}]}}"#,
        specs.join(",")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::ArtifactKind;

    fn artifact() -> TestArtifact {
        TestArtifact::new("tests/login.spec.ts", ArtifactKind::E2e)
    }

    fn runner(backend: ScriptedBackend) -> ExecutionRunner {
        ExecutionRunner::new(&RunnerConfig::default(), Arc::new(backend))
    }

    #[tokio::test]
    async fn test_parses_report_despite_nonzero_exit() {
        let out = report_with(&[("logs in", "passed"), ("logs out", "failed")]);
        let result = runner(ScriptedBackend::sequence(&[&out]))
            .execute(&artifact())
            .await
            .unwrap();
        assert_eq!((result.passed, result.failed, result.total), (1, 1, 2));
        assert_eq!(result.failures[0].title, "logs out");
        assert!(!result.success);
        assert!(!result.unparseable);
        assert_eq!(result.heal_attempts, 0);
    }

    #[tokio::test]
    async fn test_unparseable_output_is_one_failure() {
        let r = runner(ScriptedBackend::default());
        let raw = RawRun {
            stdout: String::new(),
            stderr: "Error: Cannot find module '@playwright/test'".to_string(),
            exit_code: Some(1),
            duration: Duration::from_millis(5),
        };
        let result = r.interpret(&artifact(), &raw);
        assert!(result.unparseable);
        assert_eq!((result.failed, result.total), (1, 1));
        assert_eq!(result.failures[0].title, "login.spec.ts");
        assert!(result.failures[0].error.contains("Cannot find module"));
    }

    #[tokio::test]
    async fn test_empty_output_mentions_exit_code() {
        let r = runner(ScriptedBackend::default());
        let raw = RawRun {
            exit_code: Some(137),
            ..RawRun::default()
        };
        let result = r.interpret(&artifact(), &raw);
        assert!(result.failures[0].error.contains("137"));
    }

    #[tokio::test]
    async fn test_empty_report_with_error_exit_is_failure() {
        let r = runner(ScriptedBackend::default());
        let raw = RawRun {
            stdout: r#"{"suites":[]}"#.to_string(),
            exit_code: Some(1),
            ..RawRun::default()
        };
        let result = r.interpret(&artifact(), &raw);
        assert_eq!(result.failed, 1);
        assert!(result.unparseable);
    }

    #[tokio::test]
    async fn test_load_error_reported_instead_of_raw_output() {
        let r = runner(ScriptedBackend::default());
        let raw = RawRun {
            stdout: format!(
                r#"{{"config":{{"rootDir":"{}"}},"suites":[],"errors":[{{"message":"SyntaxError: Unexpected token (3:5)"}}],"stats":{{"expected":0,"unexpected":0,"flaky":0,"skipped":0}}}}"#,
                "x".repeat(600)
            ),
            exit_code: Some(1),
            ..RawRun::default()
        };
        let result = r.interpret(&artifact(), &raw);
        assert_eq!(result.failed, 1);
        assert!(!result.unparseable);
        assert!(result.failures[0].error.contains("SyntaxError"));
        assert!(!result.failures[0].error.contains("rootDir"));
    }

    #[tokio::test]
    async fn test_empty_report_with_clean_exit_is_empty_success() {
        let r = runner(ScriptedBackend::default());
        let raw = RawRun {
            stdout: r#"{"suites":[]}"#.to_string(),
            exit_code: Some(0),
            ..RawRun::default()
        };
        let result = r.interpret(&artifact(), &raw);
        assert_eq!(result.total, 0);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_launch_failure_propagates() {
        let err = runner(ScriptedBackend::default())
            .execute(&artifact())
            .await
            .unwrap_err();
        assert!(err.is_launch_failure());
    }

    #[test]
    fn test_command_arguments() {
        let backend = CommandBackend::new(RunnerConfig::default());
        assert_eq!(
            backend.arguments(&artifact()),
            vec!["playwright", "test", "tests/login.spec.ts", "--reporter=json"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_backend_captures_stdout_on_failure() {
        let config = RunnerConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"echo 'Running 1 test'; echo '{"suites":[],"stats":{"expected":0,"unexpected":1}}'; exit 1"#
                    .to_string(),
            ],
            ..RunnerConfig::default()
        };
        let runner = ExecutionRunner::from_config(&config);
        let result = runner.execute(&artifact()).await.unwrap();
        assert_eq!(result.failed, 1);
        assert!(!result.unparseable);
    }

    #[tokio::test]
    async fn test_command_backend_missing_program() {
        let config = RunnerConfig {
            program: "sanar-no-such-runner-binary".to_string(),
            ..RunnerConfig::default()
        };
        let err = ExecutionRunner::from_config(&config)
            .execute(&artifact())
            .await
            .unwrap_err();
        assert!(err.is_launch_failure());
        assert!(err.to_string().contains("sanar-no-such-runner-binary"));
    }
}
