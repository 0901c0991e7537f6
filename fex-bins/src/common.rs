//! Common utilities for all binaries
//!
//! CLI parsing, configuration assembly and logging setup.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fex_core::config::{
    read_password_file, AutopauseConfig, ExporterConfig, RconConfig, ServerConfig,
    DEFAULT_PASSWORD_FILE,
};

/// Prometheus exporter for Factorio servers
///
/// Every flag can also be set through an environment variable prefixed
/// with `FACTORIO_PROMETHEUS_EXPORTER_`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct ExporterArgs {
    /// Port for the metrics endpoint
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_METRICS_PORT", default_value_t = 9102)]
    pub metrics_port: u16,

    /// Address for the metrics endpoint
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_METRICS_ADDRESS", default_value = "0.0.0.0")]
    pub metrics_address: IpAddr,

    /// Host of the Factorio RCON server
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_RCON_ADDRESS", default_value = "localhost")]
    pub rcon_address: String,

    /// Port of the Factorio RCON server
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_RCON_PORT", default_value_t = 27015)]
    pub rcon_port: u16,

    /// RCON password; prefer the environment variable over the flag
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_RCON_PASSWORD", hide_env_values = true)]
    pub rcon_password: Option<String>,

    /// File holding the RCON password, used when no password is given
    #[arg(
        long,
        env = "FACTORIO_PROMETHEUS_EXPORTER_RCON_PASSWORD_FILE",
        default_value = DEFAULT_PASSWORD_FILE
    )]
    pub rcon_password_file: PathBuf,

    /// Timeout for connecting and for each RCON round trip, in milliseconds
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_RCON_TIMEOUT_MS", default_value_t = 5000)]
    pub rcon_timeout_ms: u64,

    /// Extra entity name to always report (repeatable)
    #[arg(long = "track-entity", env = "FACTORIO_PROMETHEUS_EXPORTER_TRACK_ENTITY", value_delimiter = ',')]
    pub track_entities: Vec<String>,

    /// Pause the game while no players are connected
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_AUTOPAUSE")]
    pub autopause: bool,

    /// Autopause check interval, in milliseconds
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_AUTOPAUSE_INTERVAL_MS", default_value_t = 1000)]
    pub autopause_interval_ms: u64,

    /// Log level
    #[arg(short, long, env = "FACTORIO_PROMETHEUS_EXPORTER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "FACTORIO_PROMETHEUS_EXPORTER_JSON_LOGS")]
    pub json_logs: bool,
}

impl ExporterArgs {
    /// Resolve the password and assemble the runtime configuration
    pub fn to_config(&self) -> Result<ExporterConfig> {
        let password = match self.rcon_password.as_deref().map(str::trim) {
            Some(password) if !password.is_empty() => password.to_string(),
            _ => read_password_file(&self.rcon_password_file).with_context(|| {
                format!(
                    "No RCON password given and {} is unusable",
                    self.rcon_password_file.display()
                )
            })?,
        };

        if self.rcon_timeout_ms == 0 {
            anyhow::bail!("--rcon-timeout-ms must be greater than zero");
        }
        if self.autopause && self.autopause_interval_ms == 0 {
            anyhow::bail!("--autopause-interval-ms must be greater than zero");
        }

        let rcon = RconConfig::new(self.rcon_address.clone(), self.rcon_port, password)
            .with_timeout(Duration::from_millis(self.rcon_timeout_ms));

        Ok(ExporterConfig {
            rcon,
            server: ServerConfig {
                listen_addr: SocketAddr::new(self.metrics_address, self.metrics_port),
            },
            autopause: AutopauseConfig {
                enabled: self.autopause,
                interval: Duration::from_millis(self.autopause_interval_ms),
            },
            extra_entities: self
                .track_entities
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// Initialize tracing/logging
pub fn init_logging(args: &ExporterArgs) -> Result<()> {
    fex_core::utils::init_logger(&args.log_level, args.json_logs)
}
