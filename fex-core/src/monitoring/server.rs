//! HTTP server exposing category scrapes to Prometheus
//!
//! One tokio task per connection. Scrapes run on the blocking pool: when a
//! client goes away mid-scrape the remote call still completes under the
//! connection lock and its result is dropped, so the socket never sees a
//! half-finished round trip.

use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Context, Result};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::core::{Category, ScrapeError};
use crate::engine::{self, Exporter};
use crate::rcon::CommandTransport;

/// Prometheus text exposition format
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// HTTP front end for an `Exporter`
pub struct MetricsServer<T> {
    config: ServerConfig,
    exporter: Arc<Exporter<T>>,
}

impl<T: CommandTransport + 'static> MetricsServer<T> {
    pub fn new(config: ServerConfig, exporter: Arc<Exporter<T>>) -> Self {
        Self { config, exporter }
    }

    /// Bind the configured address and serve until the task is dropped
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)
            .await
            .with_context(|| format!("Failed to bind metrics server on {}", self.config.listen_addr))?;

        info!(
            "Metrics server listening on http://{}/metrics/all",
            self.config.listen_addr
        );

        serve_on(listener, self.exporter).await
    }
}

/// Accept loop on an already bound listener
pub async fn serve_on<T: CommandTransport + 'static>(
    listener: TcpListener,
    exporter: Arc<Exporter<T>>,
) -> Result<()> {
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let exporter = exporter.clone();

        tokio::spawn(async move {
            let io = TokioIo::new(stream);

            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let exporter = exporter.clone();
                async move { handle_request(req, exporter).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection error from {}: {}", remote_addr, err);
            }
        });
    }
}

async fn handle_request<T: CommandTransport + 'static>(
    req: Request<hyper::body::Incoming>,
    exporter: Arc<Exporter<T>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(route(req.method(), req.uri().path(), exporter).await)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Health,
    Help,
    All,
    Category(Category),
    NotFound,
}

fn resolve(path: &str) -> Route {
    match path {
        "/health" | "/healthz" => Route::Health,
        "/" | "/metrics" | "/metrics/" => Route::Help,
        "/metrics/all" => Route::All,
        _ => match path.strip_prefix("/metrics/").map(str::parse::<Category>) {
            Some(Ok(category)) => Route::Category(category),
            _ => Route::NotFound,
        },
    }
}

/// Dispatch one request
pub async fn route<T: CommandTransport + 'static>(
    method: &Method,
    path: &str,
    exporter: Arc<Exporter<T>>,
) -> Response<Full<Bytes>> {
    debug!("Metrics request: {} {}", method, path);

    if method != Method::GET {
        let mut resp = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed\n");
        resp.headers_mut().insert(ALLOW, HeaderValue::from_static("GET"));
        return resp;
    }

    match resolve(path) {
        Route::Health => text_response(StatusCode::OK, "OK"),
        Route::Help => text_response(StatusCode::OK, help_text()),
        Route::NotFound => {
            warn!("Unknown metrics endpoint requested: {}", path);
            text_response(StatusCode::NOT_FOUND, "Not Found\n")
        }
        Route::Category(category) => {
            let outcome =
                tokio::task::spawn_blocking(move || exporter.scrape(category)).await;
            match outcome {
                Ok(Ok(body)) => metrics_response(body),
                Ok(Err(e)) => {
                    engine::log_failure(category, &e);
                    scrape_error_response(&e)
                }
                Err(e) => join_error_response(e),
            }
        }
        Route::All => {
            let outcome = tokio::task::spawn_blocking(move || exporter.scrape_all()).await;
            match outcome {
                Ok(Ok(all)) => {
                    if all.is_partial() {
                        info!(
                            succeeded = all.succeeded.len(),
                            failed = all.failed.len(),
                            "partial scrape"
                        );
                    }
                    metrics_response(all.body)
                }
                Ok(Err(e)) => {
                    warn!(kind = e.kind(), "scrape of all categories failed");
                    scrape_error_response(&e)
                }
                Err(e) => join_error_response(e),
            }
        }
    }
}

/// HTTP status for a failed scrape
///
/// - connection loss or rejected handshake → 503
/// - remote error, malformed reply, schema mismatch → 502
/// - render conflict → 500
pub fn status_for(e: &ScrapeError) -> StatusCode {
    match e {
        ScrapeError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        e if e.is_connection_scoped() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn help_text() -> String {
    let categories: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    format!(
        "Factorio Prometheus Exporter\n\nEndpoints:\n  /metrics/all - All categories\n  /metrics/<category> - One of: {}\n  /health - Health check\n",
        categories.join(", ")
    )
}

fn text_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    with_content_type(status, PLAIN_TEXT, body)
}

fn metrics_response(body: String) -> Response<Full<Bytes>> {
    with_content_type(StatusCode::OK, EXPOSITION_CONTENT_TYPE, body)
}

fn scrape_error_response(e: &ScrapeError) -> Response<Full<Bytes>> {
    text_response(status_for(e), format!("scrape failed: {}\n", e.kind()))
}

fn join_error_response(e: tokio::task::JoinError) -> Response<Full<Bytes>> {
    error!("Scrape task failed: {}", e);
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n")
}

fn with_content_type(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body.into()));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        AuthError, ConnectionError, FetchError, ProtocolError, RenderConflictError,
        SchemaMismatchError,
    };
    use crate::testing::{fixtures, ScriptedTransport};
    use crate::translate::Translator;
    use http_body_util::BodyExt;
    use std::time::Duration;

    fn exporter(transport: ScriptedTransport) -> Arc<Exporter<ScriptedTransport>> {
        Arc::new(Exporter::new(transport, Translator::new()))
    }

    async fn get(
        path: &str,
        exporter: Arc<Exporter<ScriptedTransport>>,
    ) -> (StatusCode, Option<String>, String) {
        let resp = route(&Method::GET, path, exporter).await;
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_resolve_paths() {
        assert_eq!(resolve("/health"), Route::Health);
        assert_eq!(resolve("/healthz"), Route::Health);
        assert_eq!(resolve("/"), Route::Help);
        assert_eq!(resolve("/metrics"), Route::Help);
        assert_eq!(resolve("/metrics/"), Route::Help);
        assert_eq!(resolve("/metrics/all"), Route::All);
        assert_eq!(resolve("/metrics/time"), Route::Category(Category::Time));
        assert_eq!(resolve("/metrics/bogus"), Route::NotFound);
        assert_eq!(resolve("/metrics/time/extra"), Route::NotFound);
        assert_eq!(resolve("/favicon.ico"), Route::NotFound);
    }

    #[test]
    fn test_status_mapping() {
        let timeout: ScrapeError = ConnectionError::Protocol(ProtocolError::Timeout {
            request_id: 3,
            timeout_ms: 5000,
        })
        .into();
        assert_eq!(status_for(&timeout), StatusCode::SERVICE_UNAVAILABLE);

        let rejected: ScrapeError = ConnectionError::from(AuthError::Rejected).into();
        assert_eq!(status_for(&rejected), StatusCode::SERVICE_UNAVAILABLE);

        let remote: ScrapeError = FetchError::Remote {
            category: Category::Research,
            code: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(status_for(&remote), StatusCode::BAD_GATEWAY);

        let schema: ScrapeError = SchemaMismatchError {
            category: Category::Time,
            path: "time".to_string(),
            expected: "mapping",
        }
        .into();
        assert_eq!(status_for(&schema), StatusCode::BAD_GATEWAY);

        let conflict: ScrapeError = RenderConflictError::DuplicateSeries {
            name: "factorio_entity_count".to_string(),
            labels: String::new(),
        }
        .into();
        assert_eq!(status_for(&conflict), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_health_and_help() {
        let exporter = exporter(ScriptedTransport::new());

        let (status, _, body) = get("/health", exporter.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");

        let (status, _, body) = get("/", exporter.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("/metrics/all"));
        assert!(body.contains("production"));

        // Neither touches the transport
        assert_eq!(exporter.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let exporter = exporter(ScriptedTransport::new());

        let (status, _, _) = get("/metrics/bogus", exporter.clone()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let resp = route(&Method::POST, "/metrics/time", exporter.clone()).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(ALLOW).unwrap(), "GET");
        assert_eq!(exporter.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn test_category_success() {
        let exporter = exporter(ScriptedTransport::new().reply(
            Category::Player,
            "{\"status\":200,\"metrics\":{\"players\":{\"alice\":{\"connected\":true}}}}",
        ));

        let (status, content_type, body) = get("/metrics/player", exporter).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(EXPOSITION_CONTENT_TYPE));
        assert!(body.contains("factorio_player_connected{username=\"alice\"} 1"));
    }

    #[tokio::test]
    async fn test_remote_error_is_bad_gateway_without_detail() {
        let exporter = exporter(
            ScriptedTransport::new()
                .reply(Category::Research, fixtures::remote_error(500, "attempt to index nil")),
        );

        let (status, _, body) = get("/metrics/research", exporter).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, "scrape failed: remote_error\n");
    }

    #[tokio::test]
    async fn test_timeout_is_service_unavailable() {
        let exporter = exporter(ScriptedTransport::new().fail_with(Category::Time, || {
            ConnectionError::Protocol(ProtocolError::Timeout {
                request_id: 9,
                timeout_ms: 5000,
            })
        }));

        let (status, _, body) = get("/metrics/time", exporter).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "scrape failed: timeout\n");
    }

    #[tokio::test]
    async fn test_all_partial_and_auth_failure() {
        let partial = exporter(ScriptedTransport::new().with_fixtures().reply(
            Category::Production,
            "{\"status\":200,\"metrics\":{\"forces\":{\"player\":{\"nauvis\":{}}}}}",
        ));
        let (status, content_type, body) = get("/metrics/all", partial).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(EXPOSITION_CONTENT_TYPE));
        assert!(body.contains(
            "# fex_scrape_error category=\"production\" kind=\"schema_mismatch\"\n"
        ));

        let rejected = exporter(
            ScriptedTransport::new()
                .with_fixtures()
                .fail_with(Category::Time, || AuthError::Rejected.into()),
        );
        let (status, _, body) = get("/metrics/all", rejected).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "scrape failed: auth_rejected\n");
    }

    #[tokio::test]
    async fn test_abandoned_request_completes_remote_call() {
        let exporter = exporter(
            ScriptedTransport::new()
                .with_fixtures()
                .with_delay(Duration::from_millis(100)),
        );

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            route(&Method::GET, "/metrics/time", exporter.clone()),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(exporter.transport().call_count(), 1);

        let (status, _, _) = get("/metrics/time", exporter.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(exporter.transport().call_count(), 2);
    }
}
