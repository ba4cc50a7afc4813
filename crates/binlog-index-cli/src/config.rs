use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use binlog_index::RedbStoreConfig;
use binlog_logging::LogConfig;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading the index configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings for one index process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Store location and cache
    pub store: RedbStoreConfig,
    /// Logging output
    pub log: LogConfig,
}

impl IndexConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Resolve the configuration for a CLI invocation
    ///
    /// Defaults, then the config file if given, then command-line flags.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        if let Some(db) = &cli.db {
            config.store.db_path = db.clone();
        }
        if let Some(level) = &cli.log_level {
            config.log.level = level.clone();
        }
        if cli.pretty {
            config.log = config.log.pretty(std::io::stderr().is_terminal());
        }
        if let Some(dir) = &cli.log_dir {
            config.log = config.log.with_log_dir(dir.clone());
        }
        Ok(config)
    }
}

#[derive(Parser)]
#[command(name = "binlog-index", about = "Inspect and edit a GTID event index")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,
    /// Database file (overrides the config file)
    #[arg(long)]
    pub db: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
    /// Human-readable logs on stderr instead of JSON
    #[arg(long)]
    pub pretty: bool,
    /// Also write JSON-lines logs to this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record where a transaction is stored
    Put {
        /// GTID as origin:sequence
        gtid: String,
        /// Binlog file name
        #[arg(long)]
        file: String,
        /// Byte offset in the file
        #[arg(long)]
        offset: u64,
        /// Length in bytes
        #[arg(long)]
        length: u64,
        /// Checksum of the event bytes
        #[arg(long, default_value_t = 0)]
        checksum: u32,
    },
    /// Look up exactly one GTID
    Get { gtid: String },
    /// Look up a GTID or the next one recorded for its origin
    LowerBound { gtid: String },
    /// Show the highest sequence recorded for an origin
    Latest { origin: String },
    /// Check whether an entry exists for a GTID
    Exists { gtid: String },
    /// Remove the entry for a GTID
    Delete { gtid: String },
    /// List the entries of one origin in sequence order
    Scan {
        origin: String,
        /// Maximum entries to print (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use binlog_logging::{LogFormat, RotationStrategy};

    #[test]
    fn test_toml_partial_config_keeps_defaults() {
        let config = IndexConfig::from_toml_str(
            r#"
            [store]
            db_path = "/var/lib/binlog/index.redb"

            [log]
            level = "debug"
            format = "pretty"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.db_path, PathBuf::from("/var/lib/binlog/index.redb"));
        assert_eq!(config.store.cache_size, RedbStoreConfig::default().cache_size);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert!(config.log.stderr);
    }

    #[test]
    fn test_flags_override_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("index.toml");
        std::fs::write(&path, "[store]\ndb_path = \"from-file.redb\"\n").unwrap();

        let cli = Cli::parse_from([
            "binlog-index",
            "--config",
            path.to_str().unwrap(),
            "--db",
            "from-flag.redb",
            "get",
            "A:1",
        ]);
        let config = IndexConfig::load(&cli).unwrap();
        assert_eq!(config.store.db_path, PathBuf::from("from-flag.redb"));
        assert_eq!(config.log.level, "warn");
        assert!(config.log.file.is_none());
    }

    #[test]
    fn test_log_flags_shape_output() {
        let cli = Cli::parse_from([
            "binlog-index",
            "--pretty",
            "--log-dir",
            "/var/log/binlog",
            "--log-level",
            "debug",
            "latest",
            "A",
        ]);
        let config = IndexConfig::load(&cli).unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Pretty);
        let file = config.log.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/var/log/binlog"));
        assert_eq!(file.rotation, RotationStrategy::Daily);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = IndexConfig::from_toml_file("/nonexistent/index.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        std::fs::write(&path, "[store\n").unwrap();
        let err = IndexConfig::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_cli_parses_put() {
        let cli = Cli::parse_from([
            "binlog-index",
            "put",
            "A:7",
            "--file",
            "binlog.000001",
            "--offset",
            "120",
            "--length",
            "64",
        ]);
        match cli.command {
            Command::Put {
                gtid,
                offset,
                checksum,
                ..
            } => {
                assert_eq!(gtid, "A:7");
                assert_eq!(offset, 120);
                assert_eq!(checksum, 0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
