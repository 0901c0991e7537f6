//! Snapshot fetching
//!
//! Maps each category to its static Lua command, runs it through a
//! `CommandTransport` and parses the reply envelope into a typed tree.

pub mod commands;
pub mod fetcher;
pub mod snapshot;

pub use fetcher::{parse_reply, SnapshotFetcher};
pub use snapshot::{Node, Scalar, Snapshot};
