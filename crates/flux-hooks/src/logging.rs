//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! The engine crates only emit `tracing` events. A host embedding the
//! hooks installs a subscriber once at startup:
//!
//! ```ignore
//! use flux_hooks::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from_verbosity(1))?;
//! ```
//!
//! # Log Levels
//!
//! - `warn`: refused moves, failing providers, corrupt ancestor chains
//! - `info`: persisted moves
//! - `debug`: record resolution, provider reloads, cache sweeps

use crate::{Error, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const CRATES: &[&str] = &["flux_core", "flux_engine", "flux_db", "flux_hooks"];

/// Where and how the hooks' events are written
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level for the flux crates; other crates stay at `warn`.
    pub level: Level,
    pub format: LogFormat,
    pub ansi: bool,
    /// Append to this file instead of writing to stderr.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    /// One JSON object per event.
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
            ansi: true,
            log_file: None,
        }
    }
}

impl LogConfig {
    /// 0 is info, 1 debug, anything higher trace
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            ..Default::default()
        }
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Fails if the log file cannot be opened or a global subscriber is
/// already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            init_logging_with_writer(config, Mutex::new(file))
        }
        None => init_logging_with_writer(config, io::stderr),
    }
}

/// Install the global tracing subscriber writing to `writer`.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> Result<()>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = build_env_filter(config.level);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(writer)
                    .with_ansi(config.ansi)
                    .without_time(),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_writer(writer)
                    .with_ansi(config.ansi)
                    .without_time(),
            )
            .try_init(),
    };
    installed.map_err(|e| Error::Logging(e.to_string()))
}

/// `RUST_LOG` wins; otherwise the flux crates log at `level`, the rest at `warn`.
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATES.iter().map(|name| format!("{}={}", name, level)));
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_from_verbosity() {
        assert_eq!(LogConfig::from_verbosity(0).level, Level::INFO);
        assert_eq!(LogConfig::from_verbosity(1).level, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(5).level, Level::TRACE);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,flux_core=debug,flux_engine=debug,flux_db=debug,flux_hooks=debug"
        );
    }

    #[derive(Clone, Default)]
    struct Buffer(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_events_reach_the_writer() {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let config = LogConfig {
            format: LogFormat::Json,
            ..LogConfig::default()
        };
        init_logging_with_writer(&config, move || writer.clone()).expect("first install");

        tracing::warn!(table = "tt_content", uid = 10, "move into own subtree refused");
        let output = String::from_utf8(buffer.0.lock().clone()).expect("utf8");
        assert!(output.contains("move into own subtree refused"));
        assert!(output.contains("\"uid\":10"));

        assert!(matches!(
            init_logging_with_writer(&config, io::sink),
            Err(Error::Logging(_))
        ));
    }
}
