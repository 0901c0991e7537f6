//! Exposition and HTTP serving
//!
//! - `registry`: request-scoped series validation and Prometheus text encoding
//! - `server`: hyper endpoint router running scrapes on the blocking pool

pub mod registry;
pub mod server;

pub use registry::{render, Registry};
pub use server::{route, serve_on, status_for, MetricsServer, EXPOSITION_CONTENT_TYPE};
