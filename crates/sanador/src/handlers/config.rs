//! Config command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::ConfigArgs;
use sanar::SanarConfig;

/// Load the engine configuration named by the CLI, defaulting when absent
pub fn load_engine_config(cli: &CliConfig) -> CliResult<SanarConfig> {
    SanarConfig::load_or_default(&cli.config_path).map_err(|e| CliError::config(e.to_string()))
}

/// Execute the config command
pub fn execute_config(cli: &CliConfig, args: &ConfigArgs) -> CliResult<()> {
    let config = load_engine_config(cli)?;
    if args.show {
        print!("{}", config.to_yaml()?);
    } else {
        println!("{}", describe_source(cli));
        println!("Use `sanador config --show` to print the effective configuration.");
    }
    Ok(())
}

/// One line naming where the configuration comes from
#[must_use]
pub fn describe_source(cli: &CliConfig) -> String {
    if cli.config_path.is_file() {
        format!("Configuration file: {}", cli.config_path.display())
    } else {
        format!(
            "Configuration file: {} (not found, using defaults)",
            cli.config_path.display()
        )
    }
}
