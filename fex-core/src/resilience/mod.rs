//! Startup resilience
//!
//! - `backoff`: jittered exponential retry schedule
//! - `reconnect`: initial RCON connection loop driven by that schedule

pub mod backoff;
pub mod reconnect;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use reconnect::establish_connection;
