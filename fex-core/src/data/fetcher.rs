//! Snapshot fetcher: category → command → reply → parsed snapshot

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::commands;
use super::snapshot::Snapshot;
use crate::core::{Category, FetchError, RawReply};
use crate::rcon::CommandTransport;

/// JSON envelope printed by every category script
#[derive(Debug, Deserialize)]
struct Envelope {
    status: i64,
    #[serde(default)]
    metrics: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn malformed(category: Category, reason: impl Into<String>) -> FetchError {
    FetchError::MalformedReply {
        category,
        reason: reason.into(),
    }
}

/// Parse a raw reply into a snapshot
///
/// - not UTF-8, empty, or not a JSON envelope → `MalformedReply`
/// - status outside 2xx → `Remote` with the reported code
/// - 2xx without a `metrics` field → `MalformedReply`
pub fn parse_reply(category: Category, reply: &RawReply) -> Result<Snapshot, FetchError> {
    let text = reply
        .text()
        .map_err(|e| malformed(category, format!("reply is not UTF-8: {}", e)))?
        .trim();

    if text.is_empty() {
        return Err(malformed(category, "empty reply"));
    }

    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| malformed(category, format!("invalid JSON envelope: {}", e)))?;

    if !(200..300).contains(&envelope.status) {
        return Err(FetchError::Remote {
            category,
            code: envelope.status,
            message: envelope.error.unwrap_or_default(),
        });
    }

    let metrics = envelope
        .metrics
        .ok_or_else(|| malformed(category, "envelope has no metrics payload"))?;

    Ok(Snapshot::from_json(category, metrics))
}

/// Fetches category snapshots through a command transport
pub struct SnapshotFetcher<T> {
    transport: T,
}

impl<T: CommandTransport> SnapshotFetcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the category's command and parse its reply
    pub fn fetch(&self, category: Category) -> Result<Snapshot, FetchError> {
        let command = commands::for_category(category);
        let reply = self.transport.execute(&command)?;
        debug!(
            category = %category,
            request_id = reply.request_id,
            bytes = reply.body.len(),
            "fetched snapshot"
        );
        parse_reply(category, &reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConnectionError, ProtocolError};
    use crate::data::Node;
    use crate::testing::ScriptedTransport;

    fn reply(body: &str) -> RawReply {
        RawReply::new(1, body.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_success_envelope() {
        let snapshot = parse_reply(
            Category::Player,
            &reply("{\"status\":200,\"metrics\":{\"players\":{\"alice\":{\"connected\":true}}}}\n"),
        )
        .unwrap();

        assert_eq!(snapshot.category, Category::Player);
        let connected = snapshot
            .root
            .get("players")
            .and_then(|p| p.get("alice"))
            .and_then(|a| a.get("connected"))
            .and_then(Node::as_f64);
        assert_eq!(connected, Some(1.0));
    }

    #[test]
    fn test_any_2xx_status_is_success() {
        let snapshot = parse_reply(
            Category::Research,
            &reply("{\"status\":204,\"metrics\":{\"forces\":{}}}"),
        )
        .unwrap();
        assert_eq!(snapshot.category, Category::Research);

        let err = parse_reply(Category::Research, &reply("{\"status\":300,\"error\":\"moved\"}"))
            .unwrap_err();
        assert!(matches!(err, FetchError::Remote { code: 300, .. }));
    }

    #[test]
    fn test_non_success_status_is_remote_error() {
        let err = parse_reply(
            Category::Research,
            &reply("{\"status\":500,\"error\":\"attempt to index nil\"}"),
        )
        .unwrap_err();

        match err {
            FetchError::Remote {
                category,
                code,
                message,
            } => {
                assert_eq!(category, Category::Research);
                assert_eq!(code, 500);
                assert_eq!(message, "attempt to index nil");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_lua_error_text_is_malformed() {
        let err = parse_reply(
            Category::Time,
            &reply("Cannot execute command. Error: [string \"...\"]:1: unexpected symbol"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "malformed_reply");
    }

    #[test]
    fn test_empty_and_binary_replies_are_malformed() {
        assert_eq!(
            parse_reply(Category::Time, &reply("  \n")).unwrap_err().kind(),
            "malformed_reply"
        );
        assert_eq!(
            parse_reply(Category::Time, &RawReply::new(1, vec![0xc3, 0x28]))
                .unwrap_err()
                .kind(),
            "malformed_reply"
        );
    }

    #[test]
    fn test_missing_metrics_is_malformed() {
        let err = parse_reply(Category::Time, &reply("{\"status\":200}")).unwrap_err();
        assert!(matches!(err, FetchError::MalformedReply { .. }));
    }

    #[test]
    fn test_fetch_sends_category_command() {
        let transport = ScriptedTransport::new()
            .reply(Category::Launches, "{\"status\":200,\"metrics\":{\"forces\":{}}}");
        let fetcher = SnapshotFetcher::new(transport);

        let snapshot = fetcher.fetch(Category::Launches).unwrap();
        assert_eq!(snapshot.category, Category::Launches);
        assert_eq!(fetcher.transport().calls(), vec!["launches"]);
    }

    #[test]
    fn test_fetch_propagates_connection_errors() {
        let transport = ScriptedTransport::new().fail_with(Category::Pollution, || {
            ConnectionError::Protocol(ProtocolError::ConnectionClosed)
        });
        let fetcher = SnapshotFetcher::new(transport);

        let err = fetcher.fetch(Category::Pollution).unwrap_err();
        assert!(matches!(err, FetchError::Connection(_)));
        assert_eq!(err.kind(), "connection_closed");
    }
}
