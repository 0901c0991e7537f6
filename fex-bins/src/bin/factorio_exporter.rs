//! Factorio Prometheus exporter
//!
//! Connects to the game's RCON port (waiting for it to come up), then
//! serves `/metrics/<category>` and `/metrics/all` until interrupted.
//! Optionally pauses the game while nobody is connected.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use fex_bins::common::{init_logging, ExporterArgs};
use fex_core::autopause::spawn_autopauser;
use fex_core::monitoring::MetricsServer;
use fex_core::resilience::{establish_connection, BackoffConfig};
use fex_core::{Exporter, RconConnection, Translator};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = ExporterArgs::parse();
    init_logging(&args)?;

    let config = args.to_config()?;

    info!("=== Factorio Prometheus Exporter ===");
    info!("RCON: {:?}", config.rcon);
    info!("Metrics: http://{}", config.server.listen_addr);
    if !config.extra_entities.is_empty() {
        info!("Tracking extra entities: {:?}", config.extra_entities);
    }

    let connection = Arc::new(RconConnection::new(config.rcon.clone()));

    tokio::select! {
        result = establish_connection(connection.clone(), BackoffConfig::startup()) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C before RCON came up, exiting");
            return Ok(());
        }
    }

    let autopauser = config
        .autopause
        .enabled
        .then(|| spawn_autopauser(connection.clone(), config.autopause.interval));

    let translator = Translator::new().extend_entity_universe(config.extra_entities.iter().cloned());
    let exporter = Arc::new(Exporter::new(connection.clone(), translator));
    let server = MetricsServer::new(config.server.clone(), exporter);

    let outcome = tokio::select! {
        result = server.serve() => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C, shutting down...");
            Ok(())
        }
    };

    if let Some(handle) = autopauser {
        handle.abort();
    }
    connection.reset();

    let stats = connection.stats();
    info!("=== Final Statistics ===");
    info!("Authentications: {}", stats.authentications);
    info!("Authentication failures: {}", stats.auth_failures);
    info!("Commands sent: {}", stats.commands);
    info!("Sessions dropped: {}", stats.invalidations);

    outcome
}
