//! Heal command handler

use super::{load_engine_config, runtime};
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{emit, render, render_healing};
use crate::HealArgs;
use sanar::{generator_from_config, LocatorHealer};

/// Execute the heal command
pub fn execute_heal(cli: &CliConfig, args: &HealArgs) -> CliResult<()> {
    let config = load_engine_config(cli)?;
    let healer = LocatorHealer::new(&config.healer, generator_from_config(config.llm.as_ref()))?;
    let report = runtime()?.block_on(healer.heal_file(&args.file, args.dry_run))?;

    let text = render(args.format.into(), &report, |r| {
        render_healing(r, cli.color.should_color())
    })?;
    emit(&text, None)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::FormatArg;

    fn cli(dir: &std::path::Path) -> CliConfig {
        CliConfig::new().with_config_path(dir.join("missing.yaml"))
    }

    #[test]
    fn test_heal_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.spec.ts");
        std::fs::write(&file, "await page.locator('#sign-in').click();\n").unwrap();
        let args = HealArgs {
            file: file.clone(),
            dry_run: false,
            format: FormatArg::Text,
        };
        execute_heal(&cli(dir.path()), &args).unwrap();
        assert_eq!(
            std::fs::read_to_string(file).unwrap(),
            "await page.getByTestId('sign_in').click();\n"
        );
    }

    #[test]
    fn test_heal_dry_run_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.spec.ts");
        let source = "await page.locator('#sign-in').click();\n";
        std::fs::write(&file, source).unwrap();
        let args = HealArgs {
            file: file.clone(),
            dry_run: true,
            format: FormatArg::Json,
        };
        execute_heal(&cli(dir.path()), &args).unwrap();
        assert_eq!(std::fs::read_to_string(file).unwrap(), source);
    }

    #[test]
    fn test_heal_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = HealArgs {
            file: dir.path().join("nope.spec.ts"),
            dry_run: false,
            format: FormatArg::Text,
        };
        assert!(execute_heal(&cli(dir.path()), &args).is_err());
    }
}
