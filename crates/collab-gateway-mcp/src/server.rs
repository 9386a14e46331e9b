// crates/collab-gateway-mcp/src/server.rs
// ============================================================================
// Module: Gateway Server
// Description: Server assembly plus stdio and HTTP transports.
// Purpose: Wire configuration into a running protocol gateway.
// Dependencies: axum, tokio, tokio-util, tracing
// ============================================================================

//! ## Overview
//! [`McpServer::from_config`] builds the session manager, collaborator, tool
//! catalog, audit sink, and protocol gateway from one validated
//! configuration. [`McpServer::serve`] then runs the configured transport.
//!
//! The stdio transport reads newline-delimited envelopes and answers each on
//! its own task, so a slow tool call does not block `ping`. Responses are
//! written whole by a single writer task. When stdin closes every in-flight
//! call is cancelled and its response is still flushed.
//!
//! The HTTP transport serves `POST /rpc`. Bodies over the configured limit
//! are answered with 413; everything else gets 200 with a JSON-RPC envelope,
//! or 202 for notifications. A call is cancelled when its connection drops.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::post;
use collab_gateway_auth::AuthSettings;
use collab_gateway_auth::DeviceCodePrompt;
use collab_gateway_auth::SessionComponents;
use collab_gateway_auth::SessionManager;
use collab_gateway_config::CollabGatewayConfig;
use collab_gateway_config::ServerTransport;
use collab_gateway_core::CollaborationApi;
use collab_gateway_core::ContextHints;
use collab_gateway_core::SharedClock;
use collab_gateway_core::SystemClock;
use collab_gateway_directory::InMemoryDirectory;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::audit::audit_sink_from_config;
use crate::catalog::builtin_registry;
use crate::context::ContextResolver;
use crate::correlation::CLIENT_CORRELATION_HEADER;
use crate::correlation::sanitize_client_correlation_id;
use crate::gateway::ProtocolGateway;
use crate::gateway::oversized_response;
use crate::request::CHANNEL_HINT_HEADER;
use crate::request::RequestContext;
use crate::request::TEAM_HINT_HEADER;
use crate::tools::ToolRouter;
use crate::tools::ToolServices;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server errors.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Gateway server instance.
pub struct McpServer {
    /// Validated configuration.
    config: CollabGatewayConfig,
    /// Shared session manager.
    sessions: Arc<SessionManager>,
    /// Protocol gateway.
    gateway: Arc<ProtocolGateway>,
}

impl McpServer {
    /// Builds a server from configuration.
    ///
    /// Without an explicit collaborator the in-memory directory configured by
    /// `[directory]` is used.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when configuration is invalid or a
    /// component cannot be built.
    pub fn from_config(
        mut config: CollabGatewayConfig,
        collaborator: Option<Arc<dyn CollaborationApi>>,
        prompt: Arc<dyn DeviceCodePrompt>,
    ) -> Result<Self, McpServerError> {
        config.validate().map_err(|err| McpServerError::Config(err.to_string()))?;
        let clock: SharedClock = Arc::new(SystemClock);
        let settings = AuthSettings::from_config(&config);
        let components = SessionComponents::from_settings(&settings, prompt)
            .map_err(|err| McpServerError::Init(err.to_string()))?;
        let collaborator: Arc<dyn CollaborationApi> = match collaborator {
            Some(collaborator) => collaborator,
            None => Arc::new(
                InMemoryDirectory::from_config(&config.directory)
                    .with_tenant(settings.tenant_id.clone()),
            ),
        };
        let sessions = Arc::new(SessionManager::new(settings, components, Arc::clone(&clock)));
        let registry = builtin_registry().map_err(|err| McpServerError::Init(err.to_string()))?;
        let audit = audit_sink_from_config(&config.server.audit)
            .map_err(|err| McpServerError::Init(format!("audit sink: {err}")))?;

        let resolver = ContextResolver::new(Arc::clone(&sessions), Arc::clone(&collaborator));
        let services = ToolServices {
            collaborator,
            sessions: Arc::clone(&sessions),
        };
        let router = ToolRouter::new(registry, resolver, services, Arc::clone(&audit));
        let gateway = Arc::new(ProtocolGateway::new(router, clock, audit));
        info!(
            transport = ?config.server.transport,
            simulation = config.simulation.enabled,
            auth_required = sessions.settings().required,
            "gateway initialized"
        );
        Ok(Self {
            config,
            sessions,
            gateway,
        })
    }

    /// Returns the protocol gateway.
    #[must_use]
    pub fn gateway(&self) -> Arc<ProtocolGateway> {
        Arc::clone(&self.gateway)
    }

    /// Returns the session manager.
    #[must_use]
    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    /// Serves requests using the configured transport.
    ///
    /// # Errors
    ///
    /// Returns [`McpServerError`] when the transport fails.
    pub async fn serve(self) -> Result<(), McpServerError> {
        let max_body_bytes = self.config.server.max_body_bytes;
        match self.config.server.transport {
            ServerTransport::Stdio => {
                let reader = BufReader::new(tokio::io::stdin());
                serve_lines(self.gateway, reader, tokio::io::stdout(), max_body_bytes).await?;
                Ok(())
            }
            ServerTransport::Http => {
                let addr = self
                    .config
                    .server
                    .bind_addr()
                    .map_err(|err| McpServerError::Config(err.to_string()))?
                    .ok_or_else(|| {
                        McpServerError::Config("bind address required for http".to_string())
                    })?;
                if !addr.ip().is_loopback() {
                    warn!(%addr, "http transport bound to a non-loopback address");
                }
                let listener = TcpListener::bind(addr)
                    .await
                    .map_err(|err| McpServerError::Transport(format!("http bind failed: {err}")))?;
                info!(%addr, "http transport listening");
                serve_http(listener, self.gateway, max_body_bytes).await
            }
        }
    }
}

// ============================================================================
// SECTION: Stdio Transport
// ============================================================================

/// Serves newline-delimited envelopes from `reader`, writing responses to
/// `writer`. Returns the writer once `reader` reaches end of input and every
/// response has been flushed.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] when reading or writing fails.
pub async fn serve_lines<R, W>(
    gateway: Arc<ProtocolGateway>,
    mut reader: R,
    writer: W,
    max_line_bytes: usize,
) -> Result<W, McpServerError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let connection = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(mut line) = rx.recv().await {
            line.push(b'\n');
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok::<W, std::io::Error>(writer)
    });

    let limit = u64::try_from(max_line_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut tasks = JoinSet::new();
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        let read = (&mut reader)
            .take(limit)
            .read_until(b'\n', &mut buffer)
            .await
            .map_err(|err| McpServerError::Transport(format!("stdio read failed: {err}")))?;
        if read == 0 {
            break;
        }
        let complete = buffer.last() == Some(&b'\n');
        let line = trim_line(&buffer);
        if line.len() > max_line_bytes {
            if !complete {
                discard_line(&mut reader).await.map_err(|err| {
                    McpServerError::Transport(format!("stdio read failed: {err}"))
                })?;
            }
            warn!(limit = max_line_bytes, "oversized stdio request rejected");
            let _ = tx.send(oversized_response(max_line_bytes)).await;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        let line = line.to_vec();
        let gateway = Arc::clone(&gateway);
        let tx = tx.clone();
        let cancel = connection.child_token();
        tasks.spawn(async move {
            let request = RequestContext::stdio();
            if let Some(response) = gateway.handle(&request, &line, &cancel).await {
                let _ = tx.send(response).await;
            }
        });
        while tasks.try_join_next().is_some() {}
    }

    debug!(in_flight = tasks.len(), "stdin closed; cancelling in-flight calls");
    connection.cancel();
    while tasks.join_next().await.is_some() {}
    drop(tx);
    writer_task
        .await
        .map_err(|err| McpServerError::Transport(format!("stdio writer aborted: {err}")))?
        .map_err(|err| McpServerError::Transport(format!("stdio write failed: {err}")))
}

/// Strips the line terminator.
fn trim_line(buffer: &[u8]) -> &[u8] {
    let line = buffer.strip_suffix(b"\n").unwrap_or(buffer);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Skips input up to and including the next newline.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let (done, used) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            available
                .iter()
                .position(|byte| *byte == b'\n')
                .map_or((false, available.len()), |index| (true, index + 1))
        };
        reader.consume(used);
        if done {
            return Ok(());
        }
    }
}

// ============================================================================
// SECTION: HTTP Transport
// ============================================================================

/// Shared state for HTTP handlers.
struct HttpState {
    /// Protocol gateway.
    gateway: Arc<ProtocolGateway>,
    /// Maximum request body size.
    max_body_bytes: usize,
}

/// Builds the HTTP router.
#[must_use]
pub fn http_router(gateway: Arc<ProtocolGateway>, max_body_bytes: usize) -> Router {
    let state = Arc::new(HttpState {
        gateway,
        max_body_bytes,
    });
    Router::new()
        .route("/rpc", post(handle_http))
        .layer(DefaultBodyLimit::max(max_body_bytes.saturating_add(1)))
        .with_state(state)
}

/// Serves the HTTP transport on an already bound listener.
///
/// # Errors
///
/// Returns [`McpServerError::Transport`] when the server fails.
pub async fn serve_http(
    listener: TcpListener,
    gateway: Arc<ProtocolGateway>,
    max_body_bytes: usize,
) -> Result<(), McpServerError> {
    let app = http_router(gateway, max_body_bytes);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|err| McpServerError::Transport(format!("http server failed: {err}")))
}

/// Handles one HTTP envelope.
async fn handle_http(
    State(state): State<Arc<HttpState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let bytes = match body {
        Ok(bytes) if bytes.len() <= state.max_body_bytes => bytes,
        Ok(_) => return payload_too_large(state.max_body_bytes),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return payload_too_large(state.max_body_bytes);
        }
        Err(rejection) => return rejection.into_response(),
    };
    let request = http_request_context(peer, &headers);
    let cancel = CancellationToken::new();
    let _disconnect = cancel.clone().drop_guard();
    match state.gateway.handle(&request, &bytes, &cancel).await {
        Some(body) => (StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Answers an oversized body with 413 and a JSON-RPC error.
fn payload_too_large(limit: usize) -> Response {
    warn!(limit, "oversized http request rejected");
    (StatusCode::PAYLOAD_TOO_LARGE, [(CONTENT_TYPE, "application/json")], oversized_response(limit))
        .into_response()
}

/// Builds the request context from the peer and headers.
fn http_request_context(peer: SocketAddr, headers: &HeaderMap) -> RequestContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let hints = ContextHints {
        team_id: header(TEAM_HINT_HEADER),
        channel_id: header(CHANNEL_HINT_HEADER),
        meeting_id: None,
    };
    let request = RequestContext::http(Some(peer.ip()), hints);
    let raw = headers.get(CLIENT_CORRELATION_HEADER).and_then(|value| value.to_str().ok());
    match sanitize_client_correlation_id(raw) {
        Ok(Some(id)) => request.with_client_correlation_id(id),
        Ok(None) => request,
        Err(reason) => {
            debug!(reason = reason.label(), "client correlation id ignored");
            request
        }
    }
}
