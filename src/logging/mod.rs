//! Logging System
//!
//! Structured `tracing` output with configurable verbosity, console and/or
//! rolling file sinks, and text or JSON formatting.

mod config;


pub use config::{default_log_directory, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Base name of the log file inside the log directory
pub const LOG_FILE_NAME: &str = "multimodal-search.log";

/// Logging system errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitializationError(String),

    #[error("Failed to create log directory: {0}")]
    DirectoryCreationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for logging operations
pub type LoggingResult<T> = Result<T, LoggingError>;

/// Global logging system state
///
/// Keep it alive for the life of the process: dropping it flushes and
/// stops the file writer.
pub struct LoggingSystem {
    config: LoggingConfig,
    _guards: Vec<WorkerGuard>,
}

impl LoggingSystem {
    /// Initialize the logging system with the given configuration
    pub fn init(config: LoggingConfig) -> LoggingResult<Self> {
        let rust_log = std::env::var("RUST_LOG").ok();
        let env_filter = build_env_filter(&config, rust_log.as_deref());
        let mut guards = Vec::new();

        let registry = tracing_subscriber::registry().with(env_filter);

        match config.output {
            LogOutput::Console => registry
                .with(console_layer(&config))
                .try_init()
                .map_err(|e| LoggingError::InitializationError(e.to_string()))?,
            LogOutput::File => {
                let (file, guard) = file_layer(&config)?;
                guards.push(guard);
                registry
                    .with(file)
                    .try_init()
                    .map_err(|e| LoggingError::InitializationError(e.to_string()))?
            }
            LogOutput::Both => {
                let (file, guard) = file_layer(&config)?;
                guards.push(guard);
                registry
                    .with(console_layer(&config))
                    .with(file)
                    .try_init()
                    .map_err(|e| LoggingError::InitializationError(e.to_string()))?
            }
        }

        Ok(Self {
            config,
            _guards: guards,
        })
    }

    /// Directory the file sink writes to, if enabled
    pub fn log_directory(&self) -> Option<std::path::PathBuf> {
        match self.config.output {
            LogOutput::Console => None,
            LogOutput::File | LogOutput::Both => Some(self.config.effective_log_directory()),
        }
    }

    /// Get current log level
    pub fn log_level(&self) -> LogLevel {
        self.config.level
    }
}

/// Filter from the configured level, then per-module levels, then `RUST_LOG`
pub(crate) fn build_env_filter(config: &LoggingConfig, rust_log: Option<&str>) -> EnvFilter {
    let mut filter = EnvFilter::new(config.level.as_str());

    let mut modules: Vec<_> = config.module_levels.iter().collect();
    modules.sort_by(|a, b| a.0.cmp(b.0));
    for (module, level) in modules {
        if let Ok(directive) = format!("{}={}", module, level.as_str()).parse() {
            filter = filter.add_directive(directive);
        }
    }

    if let Some(rust_log) = rust_log {
        for part in rust_log.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Ok(directive) = part.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    filter
}

fn console_layer<S>(config: &LoggingConfig) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info);

    if config.format == LogFormat::Json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

fn file_layer<S>(
    config: &LoggingConfig,
) -> LoggingResult<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard)>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let log_dir = config.effective_log_directory();
    std::fs::create_dir_all(&log_dir).map_err(|e| {
        LoggingError::DirectoryCreationError(format!("{}: {}", log_dir.display(), e))
    })?;

    let rotation = match config.rotation {
        LogRotation::Daily => Rotation::DAILY,
        LogRotation::Hourly => Rotation::HOURLY,
        LogRotation::Never => Rotation::NEVER,
    };

    let file_appender = RollingFileAppender::new(rotation, &log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_info)
        .with_line_number(config.include_file_info)
        .with_ansi(false);

    if config.format == LogFormat::Json {
        Ok((layer.json().boxed(), guard))
    } else {
        Ok((layer.boxed(), guard))
    }
}
