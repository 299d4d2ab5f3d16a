// Configuration management for mtr-trace
// Supports CLI arguments, config file (TOML), and environment variables

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

use crate::probe::ProbeOptions;

/// mtr-trace - Run mtr against a target and report per-hop latency
#[derive(Parser, Debug, Clone)]
#[command(name = "mtr-trace")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Target IPv4 or IPv6 address
    pub target: String,

    /// Probe payload size in bytes
    #[arg(long, env = "MTR_TRACE_PACKET_LEN")]
    pub packet_len: Option<u32>,

    /// Resolve hop addresses to hostnames
    #[arg(long, env = "MTR_TRACE_RESOLVE_DNS", conflicts_with = "no_resolve_dns")]
    pub resolve_dns: bool,

    /// Keep hop addresses numeric, even if the config file enables DNS
    #[arg(long)]
    pub no_resolve_dns: bool,

    /// Number of measurement cycles to run
    #[arg(long, env = "MTR_TRACE_REPORT_CYCLES")]
    pub report_cycles: Option<u32>,

    /// Path to the mtr executable
    #[arg(long, env = "MTR_TRACE_MTR_PATH")]
    pub mtr_path: Option<String>,

    /// Kill mtr if it runs longer than this many seconds
    #[arg(long, env = "MTR_TRACE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Print hops as JSON instead of a table
    #[arg(long, env = "MTR_TRACE_JSON")]
    pub json: bool,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(short, long, env = "MTR_TRACE_LOG")]
    pub log_level: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "MTR_TRACE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Configuration file structure (TOML format)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Probe settings
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// mtr executable
    #[serde(default = "default_mtr_path")]
    pub mtr_path: String,

    /// Timeout in seconds, unlimited when absent
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    #[serde(flatten)]
    pub options: ProbeOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_mtr_path() -> String {
    "mtr".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            mtr_path: default_mtr_path(),
            timeout_seconds: None,
            options: ProbeOptions::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

/// Merged configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub target: String,
    pub probe: ProbeOptions,
    pub mtr_path: String,
    pub timeout: Option<Duration>,
    pub json: bool,
    pub log_level: Level,
}

impl Config {
    /// Load configuration from all sources (CLI args, config file, defaults)
    /// Priority: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> anyhow::Result<Self> {
        let cli_args = CliArgs::parse();

        let config_file = match &cli_args.config {
            Some(config_path) => read_config_file(config_path)?,
            None => {
                // Try loading from default locations
                let default_paths = [PathBuf::from("mtr-trace.toml"), PathBuf::from("config.toml")];

                match default_paths.iter().find(|path| path.exists()) {
                    Some(path) => read_config_file(path)?,
                    None => ConfigFile::default(),
                }
            }
        };

        Self::merge(cli_args, config_file)
    }

    /// Merge CLI args over a config file
    pub fn merge(cli_args: CliArgs, config_file: ConfigFile) -> anyhow::Result<Self> {
        let file_probe = config_file.probe;

        let probe = ProbeOptions {
            packet_len: cli_args.packet_len.unwrap_or(file_probe.options.packet_len),
            resolve_dns: match (cli_args.resolve_dns, cli_args.no_resolve_dns) {
                (true, _) => true,
                (_, true) => false,
                _ => file_probe.options.resolve_dns,
            },
            report_cycles: cli_args.report_cycles.or(file_probe.options.report_cycles),
        };

        let mtr_path = cli_args.mtr_path.unwrap_or(file_probe.mtr_path);
        let timeout = cli_args
            .timeout
            .or(file_probe.timeout_seconds)
            .map(Duration::from_secs);

        let log_level = parse_log_level(
            cli_args
                .log_level
                .as_deref()
                .unwrap_or(&config_file.logging.level),
        )?;

        Ok(Config {
            target: cli_args.target,
            probe,
            mtr_path,
            timeout,
            json: cli_args.json,
            log_level,
        })
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<ConfigFile> {
    tracing::info!("Loading configuration from: {}", path.display());
    let config_content = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<ConfigFile>(&config_content)?)
}

fn parse_log_level(level_str: &str) -> anyhow::Result<Level> {
    match level_str.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(anyhow::anyhow!("Invalid log level: {}", level_str)),
    }
}
