//! Startup connection loop
//!
//! The exporter usually starts alongside the game server and has to wait
//! for RCON to come up. Scrape-time calls never retry; only this initial
//! handshake does.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::backoff::{BackoffConfig, ExponentialBackoff};
use crate::rcon::RconConnection;

/// Authenticate `connection`, retrying on the backoff schedule
///
/// Returns the number of attempts it took. Fails only when the schedule
/// is exhausted; with `BackoffConfig::startup()` that never happens.
pub async fn establish_connection(
    connection: Arc<RconConnection>,
    config: BackoffConfig,
) -> Result<usize> {
    let mut backoff = ExponentialBackoff::with_config(config);
    let addr = connection.config().address();
    let mut attempts = 0usize;

    loop {
        attempts += 1;
        let conn = connection.clone();
        let result = tokio::task::spawn_blocking(move || conn.connect())
            .await
            .context("Connection task panicked")?;

        match result {
            Ok(()) => {
                info!("Connected to RCON at {} (attempt #{})", addr, attempts);
                return Ok(attempts);
            }
            Err(e) => {
                warn!(kind = e.kind(), "Failed to connect to RCON at {}: {}", addr, e);
                match backoff.next_delay() {
                    Some(delay) => {
                        debug!(
                            "Waiting {:?} before connection attempt #{}",
                            delay,
                            attempts + 1
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        return Err(e).with_context(|| {
                            format!("Giving up on RCON at {} after {} attempts", addr, attempts)
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RconConfig;
    use std::net::TcpListener;

    #[tokio::test]
    async fn test_gives_up_when_schedule_exhausted() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let connection = Arc::new(RconConnection::new(RconConfig::new(
            "127.0.0.1",
            port,
            "secret",
        )));

        let config = BackoffConfig {
            max_retries: Some(2),
            ..BackoffConfig::fast()
        };
        let err = establish_connection(connection.clone(), config)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("after 3 attempts"));
        assert!(!connection.is_established());
        assert_eq!(connection.stats().auth_failures, 3);
    }
}
