//! Sanador: self-healing triage for E2E test artifacts
//!
//! ## Usage
//!
//! ```bash
//! sanador run tests/login.spec.ts            # Execute, diagnose, heal, re-run
//! sanador run tests/*.spec.ts --no-heal      # Diagnose only
//! sanador classify --report results.json     # Triage a saved runner report
//! sanador heal tests/login.spec.ts --dry-run # Preview locator heals
//! sanador detect tests/login.spec.ts         # List brittle locators
//! ```

use clap::Parser;
use sanador::{
    handlers::{execute_classify, execute_config, execute_detect, execute_heal, execute_run},
    logging::init_logging,
    Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_logging(&config);

    match cli.command {
        Commands::Run(args) => execute_run(&config, &args),
        Commands::Classify(args) => execute_classify(&config, &args),
        Commands::Heal(args) => execute_heal(&config, &args),
        Commands::Detect(args) => execute_detect(&config, &args),
        Commands::Config(args) => execute_config(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(color)
        .with_log_format(cli.log_format.into())
        .with_config_path(cli.config.clone())
}
