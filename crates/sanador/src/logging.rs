//! Diagnostic logging on stderr
//!
//! `RUST_LOG` wins when set; otherwise the level follows `-q`/`-v`.

use crate::config::{CliConfig, LogFormat};
use tracing_subscriber::EnvFilter;

/// Filter directives used when `RUST_LOG` is unset
#[must_use]
pub fn default_directives(config: &CliConfig) -> String {
    let level = config.verbosity.log_level();
    format!("warn,sanar={level},sanador={level}")
}

/// Install the global subscriber; a second call is a no-op
pub fn init_logging(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder
            .with_target(false)
            .with_ansi(config.color.should_color())
            .compact()
            .try_init(),
    };
    if let Err(e) = installed {
        tracing::debug!(error = %e, "logging already initialised");
    }
}
