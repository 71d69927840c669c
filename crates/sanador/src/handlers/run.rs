//! Run command handler

use super::{load_engine_config, runtime};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{emit, render, render_summary, ProgressReporter};
use crate::RunArgs;
use sanar::{ArtifactKind, ArtifactOutcome, Pipeline, SanarConfig, TestArtifact};
use std::path::PathBuf;

/// Execute the run command
pub fn execute_run(cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let config = apply_overrides(load_engine_config(cli)?, args);
    let pipeline = Pipeline::from_config(&config)?.with_healing(!args.no_heal);
    let artifacts = build_artifacts(&args.artifacts, args.kind.into());

    let use_color = cli.color.should_color();
    let mut reporter = ProgressReporter::new(use_color, cli.verbosity.is_quiet());
    reporter.start_progress(artifacts.len() as u64, "running artifacts");

    let rt = runtime()?;
    let summary = rt.block_on(pipeline.process_all_with(&artifacts, |outcome| {
        reporter.increment(1);
        report_outcome(&reporter, outcome);
    }))?;
    reporter.finish();

    let text = render(args.format.into(), &summary, |s| {
        render_summary(s, use_color && args.output.is_none())
    })?;
    emit(&text, args.output.as_deref())?;

    if summary.success() {
        Ok(())
    } else {
        Err(CliError::StillFailing {
            artifacts: summary.still_failing,
        })
    }
}

/// Apply command-line overrides on top of the loaded configuration
#[must_use]
pub fn apply_overrides(mut config: SanarConfig, args: &RunArgs) -> SanarConfig {
    if let Some(attempts) = args.max_heal_attempts {
        config = config.with_max_heal_attempts(attempts);
    }
    if let Some(dir) = &args.evidence_dir {
        config = config.with_evidence_dir(dir.clone());
    }
    config
}

/// Artifacts in command-line order, all of one kind
#[must_use]
pub fn build_artifacts(paths: &[PathBuf], kind: ArtifactKind) -> Vec<TestArtifact> {
    paths
        .iter()
        .map(|path| TestArtifact::new(path.clone(), kind))
        .collect()
}

fn report_outcome(reporter: &ProgressReporter, outcome: &ArtifactOutcome) {
    let result = &outcome.result;
    let line = format!(
        "{}: {} passed, {} failed, {} skipped",
        result.artifact.display(),
        result.passed,
        result.failed,
        result.skipped
    );
    if result.success {
        reporter.success(&line);
    } else {
        reporter.failure(&line);
    }
    if result.unparseable {
        reporter.warning(&format!(
            "{}: runner output could not be parsed",
            result.artifact.display()
        ));
    }
    let healed = outcome.healed_locators();
    if healed > 0 {
        reporter.info(&format!(
            "{healed} locator(s) healed over {} attempt(s)",
            result.heal_attempts
        ));
    }
}
