//! Structured logging setup for the binlog index
//!
//! Builds a `tracing-subscriber` registry from a [`LogConfig`]: JSON or
//! pretty events on stderr, plus optional rolling JSON-lines files.
//!
//! ```ignore
//! use binlog_logging::{BinlogSubscriberBuilder, LogConfig};
//!
//! let _guard = BinlogSubscriberBuilder::new()
//!     .with_config(LogConfig::default().pretty(true))
//!     .try_init()?;
//! ```
//!
//! `RUST_LOG` always wins over the configured level.

pub mod config;

pub use config::{FileConfig, LogConfig, LogFormat, RotationStrategy};

use std::fs::{self, File};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Errors from subscriber setup
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Log file or directory could not be created
    #[error("log file setup failed: {0}")]
    Io(#[from] std::io::Error),

    /// A global subscriber is already installed
    #[error("subscriber already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Builder for configuring and initializing the logging subscriber
pub struct BinlogSubscriberBuilder {
    config: LogConfig,
}

impl BinlogSubscriberBuilder {
    /// Builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration this builder will apply
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally
    ///
    /// Keep the returned guard alive so buffered file output is flushed.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.level));

        let mut layers: Vec<BoxedLayer> = Vec::new();
        let mut guard = None;

        if self.config.stderr {
            layers.push(self.stderr_layer());
        }

        if let Some(file_config) = &self.config.file {
            let (writer, file_guard) = create_file_writer(file_config)?;
            guard = Some(file_guard);
            layers.push(json_layer(writer));
        }

        Registry::default().with(layers).with(env_filter).try_init()?;
        Ok(guard)
    }

    fn stderr_layer(&self) -> BoxedLayer {
        match self.config.format {
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .with_ansi(self.config.ansi)
                .with_target(true)
                .with_writer(std::io::stderr)
                .boxed(),
            LogFormat::Json => json_layer(std::io::stderr),
        }
    }
}

fn json_layer<W>(writer: W) -> BoxedLayer
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .flatten_event(true)
        .with_writer(writer)
        .boxed()
}

impl Default for BinlogSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Truncates for Never rotation, appends for others
fn create_file_writer(file_config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&file_config.directory)?;
    let writer = match file_config.rotation {
        RotationStrategy::Never => {
            let file_path = file_config
                .directory
                .join(format!("{}.log", file_config.prefix));
            tracing_appender::non_blocking(File::create(file_path)?)
        }
        RotationStrategy::Daily => tracing_appender::non_blocking(RollingFileAppender::new(
            Rotation::DAILY,
            &file_config.directory,
            &file_config.prefix,
        )),
        RotationStrategy::Hourly => tracing_appender::non_blocking(RollingFileAppender::new(
            Rotation::HOURLY,
            &file_config.directory,
            &file_config.prefix,
        )),
    };
    Ok(writer)
}

/// Install a quiet subscriber for tests
///
/// Safe to call from many tests; only the first call installs one.
///
/// # Panics
///
/// Panics if setup fails for any reason other than an existing subscriber.
pub fn init_testing() {
    match BinlogSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init()
    {
        Ok(_) | Err(LoggingError::Init(_)) => {}
        Err(e) => panic!("failed to initialize test logging: {e}"),
    }
}
