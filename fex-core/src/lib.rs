//! Fex Core - Prometheus exporter for Factorio servers over RCON
//!
//! Each scrape sends a fixed Lua command to the game over the Source RCON
//! protocol, parses the JSON state snapshot it prints, flattens it into
//! metric records and renders them in Prometheus text format.
//!
//! ## Pipeline
//! ```text
//!   HTTP GET /metrics/<category>
//!        │
//!        ▼
//!   rcon (one shared, mutex-guarded session)
//!        │  raw reply
//!        ▼
//!   data (envelope → typed snapshot)
//!        │
//!        ▼
//!   translate (snapshot → sorted metric records)
//!        │
//!        ▼
//!   monitoring::registry (validation → text exposition)
//! ```
//!
//! ## Core Modules
//! - `core`: categories, commands, metric records and the error taxonomy
//! - `config`: connection, listener and autopause settings
//! - `rcon`: packet codec, authenticated session, shared connection
//! - `data`: Lua commands and snapshot fetching
//! - `translate`: per-category metric schemas and translation
//! - `monitoring`: registry, exposition and the HTTP router
//! - `engine`: the fetch → translate → render pipeline
//! - `autopause`: optional background pause-when-empty task
//! - `resilience`: startup connection with backoff
//! - `testing`: scripted transport and reply fixtures

pub mod core;
pub mod config;
pub mod rcon;
pub mod data;
pub mod translate;
pub mod monitoring;
pub mod engine;
pub mod autopause;
pub mod resilience;
pub mod utils;
pub mod testing;

pub use self::core::{
    AuthError, Category, Command, ConnectionError, FetchError, MetricRecord, ProtocolError,
    RenderConflictError, SchemaMismatchError, ScrapeError,
};
pub use config::{ExporterConfig, RconConfig, ServerConfig};
pub use engine::{AllScrape, Exporter};
pub use rcon::{CommandTransport, RconConnection};
pub use translate::Translator;

pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::core::{Category, MetricRecord, ScrapeError};

    pub use crate::config::{ExporterConfig, RconConfig};
    pub use crate::engine::{AllScrape, Exporter};
    pub use crate::monitoring::MetricsServer;
    pub use crate::rcon::{CommandTransport, RconConnection};
    pub use crate::translate::Translator;

    pub use crate::{Error, Result};
}
