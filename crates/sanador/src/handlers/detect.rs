//! Detect command handler

use super::load_engine_config;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{emit, render, render_locators};
use crate::DetectArgs;
use sanar::LocatorDetector;

/// Execute the detect command
pub fn execute_detect(cli: &CliConfig, args: &DetectArgs) -> CliResult<()> {
    let config = load_engine_config(cli)?;
    let source = std::fs::read_to_string(&args.file)?;
    let locators = LocatorDetector::new(&config.healer.receivers)?.detect(&source);

    let text = render(args.format.into(), &locators, |l| {
        render_locators(&args.file, l)
    })?;
    emit(&text, None)
}
