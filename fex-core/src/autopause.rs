//! Background task pausing the game while nobody is connected
//!
//! Shares the scrape connection and its lock, so each tick is one ordinary
//! round trip queued between scrapes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::data::commands;
use crate::rcon::CommandTransport;

/// Spawn the autopause loop; runs until the handle is aborted
pub fn spawn_autopauser<T>(transport: Arc<T>, interval: Duration) -> JoinHandle<()>
where
    T: CommandTransport + 'static,
{
    info!("Autopause enabled, checking every {:?}", interval);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let transport = transport.clone();
            let outcome =
                tokio::task::spawn_blocking(move || transport.execute(&commands::AUTOPAUSE)).await;

            match outcome {
                Ok(Ok(reply)) => debug!(request_id = reply.request_id, "autopause applied"),
                Ok(Err(e)) => warn!(kind = e.kind(), "Autopause command failed: {}", e),
                Err(e) => warn!("Autopause task failed: {}", e),
            }
        }
    })
}
