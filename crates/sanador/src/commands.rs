//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use sanar::ArtifactKind;
use std::path::PathBuf;

/// Sanador: run E2E test artifacts, classify their failures and heal brittle locators
#[derive(Parser, Debug)]
#[command(name = "sanador")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Engine configuration file (YAML); defaults apply when it is absent
    #[arg(long, global = true, env = "SANAR_CONFIG", default_value = "sanar.yaml")]
    pub config: PathBuf,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run artifacts through execute, diagnose and heal
    ///
    /// Exits with status 2 when any artifact is still failing after healing.
    Run(RunArgs),

    /// Classify the failures of a saved runner report
    Classify(ClassifyArgs),

    /// Run one healing pass over a test source file
    Heal(HealArgs),

    /// List brittle locators in a test source file
    Detect(DetectArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Test artifacts to run, in order
    #[arg(required = true)]
    pub artifacts: Vec<PathBuf>,

    /// Artifact category
    #[arg(short, long, default_value = "e2e")]
    pub kind: KindArg,

    /// Maximum heal-and-rerun cycles per artifact
    #[arg(long, env = "SANAR_MAX_HEAL_ATTEMPTS")]
    pub max_heal_attempts: Option<u32>,

    /// Skip the heal loop
    #[arg(long)]
    pub no_heal: bool,

    /// Evidence directory
    #[arg(long, env = "SANAR_EVIDENCE_DIR")]
    pub evidence_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the classify command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Saved runner output (JSON report, preamble allowed)
    #[arg(long)]
    pub report: PathBuf,

    /// Evidence directory
    #[arg(long, env = "SANAR_EVIDENCE_DIR")]
    pub evidence_dir: Option<PathBuf>,

    /// Artifact name used for the result (defaults to the report file name)
    #[arg(long)]
    pub artifact: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the heal command
#[derive(Parser, Debug)]
pub struct HealArgs {
    /// Test source file
    pub file: PathBuf,

    /// Compute heals without rewriting the file
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Test source file
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print the effective configuration as YAML
    #[arg(long)]
    pub show: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Compact text lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Artifact category argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KindArg {
    /// Browser end-to-end suite
    #[default]
    E2e,
    /// API suite
    Api,
    /// Accessibility suite
    Accessibility,
    /// Visual or functional regression suite
    Regression,
}

impl From<KindArg> for ArtifactKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::E2e => Self::E2e,
            KindArg::Api => Self::Api,
            KindArg::Accessibility => Self::Accessibility,
            KindArg::Regression => Self::Regression,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["sanador", "run", "a.spec.ts", "b.spec.ts"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.artifacts.len(), 2);
        assert_eq!(args.kind, KindArg::E2e);
        assert_eq!(args.format, FormatArg::Text);
        assert!(!args.no_heal);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_parse_run_options() {
        let cli = Cli::try_parse_from([
            "sanador",
            "-vv",
            "--log-format",
            "json",
            "run",
            "a.spec.ts",
            "--kind",
            "api",
            "--max-heal-attempts",
            "5",
            "--no-heal",
            "--format",
            "json",
            "--output",
            "out.json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, LogFormatArg::Json);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(ArtifactKind::from(args.kind), ArtifactKind::Api);
        assert_eq!(args.max_heal_attempts, Some(5));
        assert!(args.no_heal);
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_run_requires_artifact() {
        assert!(Cli::try_parse_from(["sanador", "run"]).is_err());
    }

    #[test]
    fn test_parse_classify() {
        let cli = Cli::try_parse_from([
            "sanador",
            "classify",
            "--report",
            "out.json",
            "--artifact",
            "login.spec.ts",
        ])
        .unwrap();
        let Commands::Classify(args) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(args.report, PathBuf::from("out.json"));
        assert_eq!(args.artifact.as_deref(), Some("login.spec.ts"));
    }

    #[test]
    fn test_parse_heal_dry_run() {
        let cli = Cli::try_parse_from(["sanador", "heal", "a.spec.ts", "--dry-run"]).unwrap();
        let Commands::Heal(args) = cli.command else {
            panic!("expected heal");
        };
        assert!(args.dry_run);
    }

    #[test]
    fn test_color_conversion() {
        use crate::config::ColorChoice;
        assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
        assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
        assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
    }
}
