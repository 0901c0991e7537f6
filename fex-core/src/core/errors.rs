//! Error taxonomy for the scrape pipeline
//!
//! Errors are split by blast radius:
//! - Connection scoped (`AuthError`, `ProtocolError`): the shared RCON
//!   session is dropped and the next call re-authenticates.
//! - Category scoped (`FetchError::Remote`, `FetchError::MalformedReply`,
//!   `SchemaMismatchError`): only the affected category fails.
//! - Defects (`RenderConflictError`): a schema bug produced an invalid
//!   series set and the render is rejected.
//!
//! Every error exposes a stable `kind()` label. HTTP bodies and scrape
//! markers only ever carry that label, never the underlying message.

use std::io;
use thiserror::Error;

use super::types::Category;

/// Failure to open an authenticated RCON session
#[derive(Debug, Error)]
pub enum AuthError {
    /// TCP connect failed (refused, unreachable, DNS)
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Server answered the handshake with id -1
    #[error("RCON password rejected by server")]
    Rejected,

    /// Handshake broke at the protocol level
    #[error("RCON handshake failed: {0}")]
    Handshake(#[from] ProtocolError),
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Connect { .. } => "connect",
            AuthError::Rejected => "auth_rejected",
            AuthError::Handshake(_) => "handshake",
        }
    }
}

/// Failure during a single request/reply round trip
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// No matching reply before the deadline
    #[error("timed out after {timeout_ms}ms waiting for reply {request_id}")]
    Timeout { request_id: i32, timeout_ms: u64 },

    /// Peer closed the socket mid-call
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Packet could not be decoded
    #[error("framing error: {reason}")]
    Framing { reason: String },

    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

impl ProtocolError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::Timeout { .. } => "timeout",
            ProtocolError::ConnectionClosed => "connection_closed",
            ProtocolError::Framing { .. } => "framing",
            ProtocolError::Io(_) => "io",
        }
    }

    pub(crate) fn framing(reason: impl Into<String>) -> Self {
        ProtocolError::Framing {
            reason: reason.into(),
        }
    }
}

/// Any failure that invalidates the shared connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ConnectionError {
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionError::Auth(e) => e.kind(),
            ConnectionError::Protocol(e) => e.kind(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ConnectionError::Auth(_))
    }
}

/// Failure to obtain a parsed snapshot for one category
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Well-formed envelope with a non-success status
    #[error("remote command for {category} returned status {code}: {message}")]
    Remote {
        category: Category,
        code: i64,
        message: String,
    },

    /// Reply is not a valid envelope
    #[error("malformed reply for {category}: {reason}")]
    MalformedReply { category: Category, reason: String },
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Connection(e) => e.kind(),
            FetchError::Remote { .. } => "remote_error",
            FetchError::MalformedReply { .. } => "malformed_reply",
        }
    }
}

/// Snapshot does not have the shape its category declares
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("schema mismatch in {category} at `{path}`: expected {expected}")]
pub struct SchemaMismatchError {
    pub category: Category,
    pub path: String,
    pub expected: &'static str,
}

/// Invalid series set handed to the exposition layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderConflictError {
    /// Same metric name and label set inserted twice
    #[error("duplicate series {name}{{{labels}}}")]
    DuplicateSeries { name: String, labels: String },

    /// Metric name reused with a different help, type or label keys
    #[error("metric family {name} declared with conflicting descriptors")]
    InconsistentFamily { name: String },

    /// Counters cannot go below zero
    #[error("negative value {value} for counter {name}")]
    NegativeCounter { name: String, value: f64 },

    /// The prometheus encoder refused the family
    #[error("failed to encode metrics: {reason}")]
    Encoding { reason: String },
}

impl RenderConflictError {
    pub fn kind(&self) -> &'static str {
        "render_conflict"
    }
}

/// Anything that can fail one category's fetch-translate-render cycle
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Schema(#[from] SchemaMismatchError),

    #[error(transparent)]
    Render(#[from] RenderConflictError),
}

impl ScrapeError {
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Fetch(e) => e.kind(),
            ScrapeError::Schema(_) => "schema_mismatch",
            ScrapeError::Render(e) => e.kind(),
        }
    }

    /// True when the shared connection was dropped by this failure
    pub fn is_connection_scoped(&self) -> bool {
        matches!(self, ScrapeError::Fetch(FetchError::Connection(_)))
    }

    /// True when the handshake itself failed
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ScrapeError::Fetch(FetchError::Connection(ConnectionError::Auth(_)))
        )
    }
}

impl From<ConnectionError> for ScrapeError {
    fn from(e: ConnectionError) -> Self {
        ScrapeError::Fetch(FetchError::Connection(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_are_stable() {
        let timeout = ProtocolError::Timeout {
            request_id: 7,
            timeout_ms: 5000,
        };
        assert_eq!(timeout.kind(), "timeout");

        let scrape: ScrapeError = ConnectionError::from(timeout).into();
        assert_eq!(scrape.kind(), "timeout");
        assert!(scrape.is_connection_scoped());
        assert!(!scrape.is_auth());
    }

    #[test]
    fn test_auth_error_is_connection_scoped() {
        let scrape: ScrapeError = ConnectionError::from(AuthError::Rejected).into();
        assert!(scrape.is_auth());
        assert!(scrape.is_connection_scoped());
        assert_eq!(scrape.kind(), "auth_rejected");
    }

    #[test]
    fn test_category_errors_do_not_touch_connection() {
        let remote: ScrapeError = FetchError::Remote {
            category: Category::Pollution,
            code: 500,
            message: "attempt to index nil".to_string(),
        }
        .into();
        assert!(!remote.is_connection_scoped());
        assert_eq!(remote.kind(), "remote_error");

        let schema: ScrapeError = SchemaMismatchError {
            category: Category::Time,
            path: "time.ticks".to_string(),
            expected: "mapping",
        }
        .into();
        assert!(!schema.is_connection_scoped());
        assert_eq!(schema.kind(), "schema_mismatch");
    }

    #[test]
    fn test_schema_mismatch_display() {
        let err = SchemaMismatchError {
            category: Category::Production,
            path: "forces.player.nauvis.prototypes".to_string(),
            expected: "mapping",
        };
        let msg = format!("{}", err);
        assert!(msg.contains("production"));
        assert!(msg.contains("forces.player.nauvis.prototypes"));
    }

    #[test]
    fn test_auth_display_never_contains_secret() {
        let err = AuthError::Rejected;
        assert_eq!(format!("{}", err), "RCON password rejected by server");
    }
}
