//! Classify command handler
//!
//! Works on a saved runner report instead of launching the runner, so
//! failures can be triaged after the fact (for example from CI artifacts).

use super::{load_engine_config, runtime};
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{emit, render, render_result};
use crate::ClassifyArgs;
use sanar::{ArtifactKind, Pipeline, RawRun, TestArtifact};
use std::path::Path;

/// Execute the classify command
pub fn execute_classify(cli: &CliConfig, args: &ClassifyArgs) -> CliResult<()> {
    let mut config = load_engine_config(cli)?;
    if let Some(dir) = &args.evidence_dir {
        config = config.with_evidence_dir(dir.clone());
    }
    let stdout = std::fs::read_to_string(&args.report)?;
    let artifact = TestArtifact::new(
        artifact_name(&args.report, args.artifact.as_deref()),
        ArtifactKind::E2e,
    );

    let pipeline = Pipeline::from_config(&config)?;
    let mut result = pipeline.runner().interpret(
        &artifact,
        &RawRun {
            stdout,
            ..RawRun::default()
        },
    );
    runtime()?.block_on(pipeline.diagnose(&mut result));

    let text = render(args.format.into(), &result, |r| {
        render_result(r, cli.color.should_color())
    })?;
    emit(&text, None)
}

/// Name shown for the classified result
#[must_use]
pub fn artifact_name(report: &Path, explicit: Option<&str>) -> String {
    explicit.map_or_else(
        || {
            report
                .file_name()
                .map_or_else(|| report.display().to_string(), |n| n.to_string_lossy().into_owned())
        },
        str::to_string,
    )
}
