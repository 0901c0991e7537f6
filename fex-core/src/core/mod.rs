//! Core types shared by every stage of the scrape pipeline
//!
//! - `Category`: named slice of game state, one per endpoint
//! - `Command` / `RawReply`: one RCON round trip
//! - `MetricDesc` / `MetricRecord`: flattened series
//! - Error taxonomy, split by blast radius

pub mod errors;
pub mod types;

pub use errors::{
    AuthError, ConnectionError, FetchError, ProtocolError, RenderConflictError, SchemaMismatchError,
    ScrapeError,
};
pub use types::{
    Category, Command, MetricDesc, MetricKind, MetricRecord, RawReply, UnknownCategory,
};
