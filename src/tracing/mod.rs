//! Tracing Module - Logging setup for host applications
//!
//! The library itself only emits `tracing` events. Hosts that do not install
//! their own subscriber can call [`init_tracing`] with one of the
//! [`TracingConfig`] presets. `RUST_LOG` always overrides the configured level.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::LlmError;

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `EnvFilter` directive, e.g. `info` or `genadapt=debug`.
    pub level: String,
    pub format: OutputFormat,
    /// Also append to this file, through a non-blocking writer.
    pub file_path: Option<PathBuf>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl TracingConfig {
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: OutputFormat::Pretty,
            file_path: None,
        }
    }

    pub fn minimal() -> Self {
        Self {
            level: "warn".to_string(),
            format: OutputFormat::Compact,
            file_path: None,
        }
    }

    pub fn json_production() -> Self {
        Self {
            level: "info".to_string(),
            format: OutputFormat::Json,
            file_path: None,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Filter used when `RUST_LOG` is unset or invalid.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if self.level.trim().is_empty() {
                EnvFilter::new("info")
            } else {
                EnvFilter::new(&self.level)
            }
        })
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(format: OutputFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339());
    match format {
        OutputFormat::Pretty => Box::new(layer.pretty()),
        OutputFormat::Compact => Box::new(layer.compact()),
        OutputFormat::Json => Box::new(layer.json()),
    }
}

/// Install a global subscriber.
///
/// Returns the file writer's guard when a file is configured; keep it alive
/// for as long as logs should be flushed. Calling this a second time in one
/// process is a configuration error.
pub fn init_tracing(config: &TracingConfig) -> Result<Option<WorkerGuard>, LlmError> {
    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(config.format, std::io::stderr, true)];

    let guard = match &config.file_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LlmError::ConfigurationError(format!(
                        "create log dir {}: {e}",
                        parent.display()
                    ))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    LlmError::ConfigurationError(format!("open log file {}: {e}", path.display()))
                })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            layers.push(fmt_layer(config.format, writer, false));
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(config.env_filter())
        .try_init()
        .map_err(|e| LlmError::ConfigurationError(format!("tracing already initialized: {e}")))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(TracingConfig::development().format, OutputFormat::Pretty);
        assert_eq!(TracingConfig::minimal().level, "warn");
        let prod = TracingConfig::json_production().with_file("/tmp/x.log");
        assert_eq!(prod.format, OutputFormat::Json);
        assert_eq!(prod.file_path, Some(PathBuf::from("/tmp/x.log")));
    }
}
