use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self},
    prelude::*,
};

/// Console verbosity for the given flags. `quiet` wins over any `-v`.
pub fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Builds the console layer plus, when `log_file` is set, a plain file layer that records at
/// INFO or finer regardless of the console level.
pub fn build_subscriber(
    verbosity: u8,
    quiet: bool,
    log_file: Option<&Path>,
) -> Result<impl Subscriber + Send + Sync + 'static> {
    let console = console_level(verbosity, quiet);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(console);

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(console.max(LevelFilter::INFO)),
            )
        }
        None => None,
    };

    Ok(tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer))
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    build_subscriber(verbosity, quiet, log_file)?
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;
    use tracing::{debug, info, warn};

    #[test]
    fn quiet_turns_the_console_off() {
        assert_eq!(console_level(3, true), LevelFilter::OFF);
        assert_eq!(console_level(0, false), LevelFilter::WARN);
        assert_eq!(console_level(2, false), LevelFilter::DEBUG);
        assert_eq!(console_level(9, false), LevelFilter::TRACE);
    }

    #[test]
    #[serial]
    fn file_layer_records_info_even_when_quiet() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("run.log");

        let subscriber = build_subscriber(0, true, Some(&log_path)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            info!("Applying repair step: add missing heavy atoms");
            debug!("not recorded at INFO");
            warn!("2 parse warning(s)");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Applying repair step"));
        assert!(content.contains("WARN"));
        assert!(!content.contains("not recorded"));
        assert!(!content.contains("\u{1b}["));
    }

    #[test]
    #[serial]
    fn file_layer_follows_a_finer_console_level() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("debug.log");

        let subscriber = build_subscriber(2, false, Some(&log_path)).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            debug!("Installing new structure handle");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("DEBUG"));
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");
        if cfg!(unix) && invalid_path.is_dir() {
            let result = build_subscriber(0, false, Some(&invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
