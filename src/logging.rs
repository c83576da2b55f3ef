// 📜 Logging - console output plus optional daily JSON log files

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE_NAME: &str = "club-pricing.log";

pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "club_pricing=debug"
    } else {
        "club_pricing=info"
    }
}

/// Install the global subscriber. `RUST_LOG` directives are honored on top
/// of the default level.
///
/// Keep the returned guard alive until exit, or buffered file lines are lost.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive(default_directive(verbose).parse()?);

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::Directive;

    #[test]
    fn test_default_directives_parse() {
        assert!(default_directive(false).parse::<Directive>().is_ok());
        assert!(default_directive(true).parse::<Directive>().is_ok());
        assert_eq!(default_directive(true), "club_pricing=debug");
    }
}
