//! Logging setup for binaries and tests embedding the converter.
//!
//! The library only emits `tracing` events. Applications that want to
//! see them install a subscriber, either their own or the one built
//! here from environment variables:
//!
//! - `COCO_LOG` (falls back to `RUST_LOG`): filter directives, default `warn`
//! - `COCO_LOG_FORMAT`: `pretty`, `compact` (default) or `json`
//! - `COCO_LOG_OUTPUT`: `stderr` (default) or `stdout`

use std::env;
use std::io;

use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Configuration for logging setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Output destination
    pub output: LogOutput,
    /// `EnvFilter` directives
    pub filter: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line human-readable output
    Compact,
    /// JSON lines
    Json,
}

/// Log output destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            output: LogOutput::Stderr,
            filter: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Create a logging configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(format) = lookup("COCO_LOG_FORMAT") {
            config.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                "compact" => LogFormat::Compact,
                _ => config.format,
            };
        }

        if let Some(output) = lookup("COCO_LOG_OUTPUT") {
            config.output = match output.to_lowercase().as_str() {
                "stdout" => LogOutput::Stdout,
                "stderr" => LogOutput::Stderr,
                _ => config.output,
            };
        }

        if let Some(filter) = lookup("COCO_LOG").or_else(|| lookup("RUST_LOG")) {
            if !filter.trim().is_empty() {
                config.filter = filter;
            }
        }

        config
    }

    /// Override the filter directives.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// Install a global subscriber for `config`.
///
/// Returns `false` if a global subscriber was already installed, which
/// is not treated as an error so tests and embedders can call this freely.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    let writer = match config.output {
        LogOutput::Stdout => BoxMakeWriter::new(io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(io::stderr),
    };

    let registry = tracing_subscriber::registry();
    let installed = match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(true)
                .with_current_span(true)
                .with_filter(filter);
            registry.with(layer).try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_writer(writer)
                .with_target(true)
                .with_filter(filter);
            registry.with(layer).try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(writer)
                .with_target(false)
                .with_filter(filter);
            registry.with(layer).try_init()
        }
    };

    if installed.is_ok() {
        tracing::debug!(format = ?config.format, output = ?config.output, "logging initialized");
    }
    installed.is_ok()
}
