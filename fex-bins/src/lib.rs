//! Binary support for the Factorio exporter
//!
//! CLI parsing and startup plumbing shared by the binaries.

pub mod common;
