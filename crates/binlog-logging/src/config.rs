//! Logging configuration, loadable from the `[log]` table of an index config

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How events are rendered on stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable, one line per event
    Pretty,
}

/// Logging configuration
///
/// stdout is left alone; the CLI prints its results there.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Write events to stderr
    pub stderr: bool,
    /// stderr format
    pub format: LogFormat,
    /// Color pretty output
    pub ansi: bool,
    /// Also write JSON lines to a log directory
    pub file: Option<FileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            stderr: true,
            format: LogFormat::Json,
            ansi: false,
            file: None,
        }
    }
}

impl LogConfig {
    /// Quiet pretty output for tests
    pub fn testing() -> Self {
        Self {
            format: LogFormat::Pretty,
            ..Default::default()
        }
    }

    /// Switch stderr to pretty output, colored when `ansi` is set
    pub fn pretty(mut self, ansi: bool) -> Self {
        self.format = LogFormat::Pretty;
        self.ansi = ansi;
        self
    }

    /// Write JSON lines under `directory`, keeping any configured rotation
    pub fn with_log_dir(mut self, directory: PathBuf) -> Self {
        let file = self.file.get_or_insert_with(FileConfig::default);
        file.directory = directory;
        self
    }
}

/// Rolling JSON-lines file output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name prefix; rotated files get a date suffix
    pub prefix: String,
    pub rotation: RotationStrategy,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "binlog-index".to_string(),
            rotation: RotationStrategy::Daily,
        }
    }
}

/// When to start a new log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One `<prefix>.log`, truncated on start
    Never,
}
