//! Runtime configuration
//!
//! Plain structs filled in by the binary from CLI flags and environment
//! variables. The RCON secret never appears in `Debug` output.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default location of the password file written by the headless server image
pub const DEFAULT_PASSWORD_FILE: &str = "/factorio/config/rconpw";

/// Default RCON port of a Factorio server
pub const DEFAULT_RCON_PORT: u16 = 27015;

/// Default port for the metrics endpoint
pub const DEFAULT_METRICS_PORT: u16 = 9102;

/// Connection settings for the RCON client
#[derive(Clone)]
pub struct RconConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Bound on connect and on each request/reply round trip
    pub timeout: Duration,
    /// Largest accepted packet size field
    pub max_packet_size: usize,
}

impl RconConfig {
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port` for connecting and logging
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_RCON_PORT,
            password: String::new(),
            timeout: Duration::from_secs(5),
            max_packet_size: 16 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for RconConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RconConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("max_packet_size", &self.max_packet_size)
            .finish()
    }
}

/// Read the RCON password from a file, trimming surrounding whitespace
pub fn read_password_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read RCON password file {}", path.display()))?;
    let password = raw.trim().to_string();
    if password.is_empty() {
        anyhow::bail!("RCON password file {} is empty", path.display());
    }
    Ok(password)
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_METRICS_PORT)),
        }
    }
}

/// Background autopause task settings
#[derive(Debug, Clone)]
pub struct AutopauseConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for AutopauseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(1),
        }
    }
}

/// Everything the exporter needs at startup
#[derive(Debug, Clone, Default)]
pub struct ExporterConfig {
    pub rcon: RconConfig,
    pub server: ServerConfig,
    pub autopause: AutopauseConfig,
    /// Entity names added to the built-in zero-fill universe
    pub extra_entities: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_debug_redacts_password() {
        let config = RconConfig::new("factorio", 27015, "hunter2");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_defaults() {
        let config = ExporterConfig::default();
        assert_eq!(config.rcon.port, 27015);
        assert_eq!(config.rcon.timeout, Duration::from_secs(5));
        assert_eq!(config.server.listen_addr.port(), 9102);
        assert!(!config.autopause.enabled);
    }

    #[test]
    fn test_read_password_file_trims() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  s3cret  ").unwrap();

        let password = read_password_file(file.path()).unwrap();
        assert_eq!(password, "s3cret");
    }

    #[test]
    fn test_read_password_file_rejects_empty() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(read_password_file(file.path()).is_err());
    }

    #[test]
    fn test_read_password_file_missing() {
        let err = read_password_file("/nonexistent/rconpw").unwrap_err();
        assert!(format!("{}", err).contains("/nonexistent/rconpw"));
    }
}
