// SPDX-License-Identifier: GPL-3.0-only

//! Command line and config file
//!
//! Precedence is command line, then config file, then built-in defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Default, Parser)]
#[command(name = "nfs-ganesha-exporter", version)]
#[command(about = "Export NFS-Ganesha statistics as Prometheus metrics", long_about = None)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on [default: 0.0.0.0]
    #[arg(long)]
    pub listen_address: Option<IpAddr>,

    /// Port to listen on [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// HTTP path of the metrics endpoint [default: /metrics]
    #[arg(long)]
    pub metrics_path: Option<String>,

    /// D-Bus address to connect to instead of the system bus
    #[arg(long)]
    pub bus_address: Option<String>,

    /// Per-entity stats calls in flight per scrape [default: 1]
    #[arg(long)]
    pub fetch_concurrency: Option<usize>,

    /// Give up on a collector after this many seconds
    #[arg(long)]
    pub scrape_timeout_secs: Option<u64>,

    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Skip the bus connection check at start-up
    #[arg(long)]
    pub no_probe: bool,
}

/// Config file contents; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub listen_address: Option<IpAddr>,
    pub port: Option<u16>,
    pub metrics_path: Option<String>,
    pub bus_address: Option<String>,
    pub fetch_concurrency: Option<usize>,
    pub scrape_timeout_secs: Option<u64>,
    pub log_level: Option<LogLevel>,
    pub probe_on_start: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub listen_address: IpAddr,
    pub port: u16,
    pub metrics_path: String,
    pub bus_address: Option<String>,
    pub fetch_concurrency: usize,
    pub scrape_timeout: Option<Duration>,
    pub log_level: LogLevel,
    pub probe_on_start: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            bus_address: None,
            fetch_concurrency: 1,
            scrape_timeout: None,
            log_level: LogLevel::default(),
            probe_on_start: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ExporterConfig {
    /// Reads the config file named on the command line, if any, and merges.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => read_file(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            listen_address: cli
                .listen_address
                .or(file.listen_address)
                .unwrap_or(defaults.listen_address),
            port: cli.port.or(file.port).unwrap_or(defaults.port),
            metrics_path: cli
                .metrics_path
                .clone()
                .or(file.metrics_path)
                .unwrap_or(defaults.metrics_path),
            bus_address: cli.bus_address.clone().or(file.bus_address),
            fetch_concurrency: cli
                .fetch_concurrency
                .or(file.fetch_concurrency)
                .unwrap_or(defaults.fetch_concurrency),
            scrape_timeout: cli
                .scrape_timeout_secs
                .or(file.scrape_timeout_secs)
                .map(Duration::from_secs),
            log_level: cli
                .log_level
                .or(file.log_level)
                .unwrap_or(defaults.log_level),
            probe_on_start: !cli.no_probe
                && file.probe_on_start.unwrap_or(defaults.probe_on_start),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.metrics_path.starts_with('/') || self.metrics_path == "/" {
            return Err(ConfigError::Invalid {
                key: "metrics_path",
                reason: format!(
                    "{:?} must start with '/' and must not be the root path",
                    self.metrics_path
                ),
            });
        }
        if self.fetch_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "fetch_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.scrape_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::Invalid {
                key: "scrape_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("nfs-ganesha-exporter").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_without_flags_or_file() {
        let config = ExporterConfig::merge(&parse(&[]), FileConfig::default()).unwrap();
        assert_eq!(config, ExporterConfig::default());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(config.probe_on_start);
    }

    #[test]
    fn cli_overrides_file_and_file_overrides_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
            port = 9587
            metrics_path = "/stats"
            fetch_concurrency = 4
            log_level = "debug"
            probe_on_start = false
            "#,
        )
        .unwrap();
        let cli = parse(&["--port", "9100", "--scrape-timeout-secs", "10"]);

        let config = ExporterConfig::merge(&cli, file).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.metrics_path, "/stats");
        assert_eq!(config.fetch_concurrency, 4);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.scrape_timeout, Some(Duration::from_secs(10)));
        assert!(!config.probe_on_start);
    }

    #[test]
    fn no_probe_flag_wins() {
        let config = ExporterConfig::merge(&parse(&["--no-probe"]), FileConfig::default()).unwrap();
        assert!(!config.probe_on_start);
    }

    #[test]
    fn rejects_bad_values() {
        for args in [
            &["--metrics-path", "metrics"][..],
            &["--metrics-path", "/"][..],
            &["--fetch-concurrency", "0"][..],
            &["--scrape-timeout-secs", "0"][..],
        ] {
            let err = ExporterConfig::merge(&parse(args), FileConfig::default()).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{args:?}");
        }
    }

    #[test]
    fn zero_timeout_from_file_is_rejected() {
        let file: FileConfig = toml::from_str("scrape_timeout_secs = 0").unwrap();
        let err = ExporterConfig::merge(&parse(&[]), file).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "scrape_timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("prot = 1").is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let cli = parse(&["--config", "/nonexistent/nfs-ganesha-exporter.toml"]);
        assert!(matches!(
            ExporterConfig::load(&cli),
            Err(ConfigError::Read { .. })
        ));
    }
}
