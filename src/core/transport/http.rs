//! HTTP transport implementation.
//!
//! Server-sent events with JSON-RPC over POST:
//! - `GET /sse` opens a stream whose first `endpoint` event names the
//!   session's POST URL (`/messages?session_id=<uuid>`)
//! - `POST /messages?session_id=...` accepts one JSON-RPC message and
//!   answers `202 Accepted`; the JSON-RPC response arrives on the stream
//!   as a `message` event
//! - `GET /health` is open; the other two routes require the API key

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::auth::require_api_key;
use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;

/// Interval between keep-alive comments on idle streams.
pub const KEEP_ALIVE_SECS: u64 = 15;

/// Protocol version announced when the client does not ask for one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn method_not_found(id: Option<Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }
}

/// Outbound channel of each open SSE stream, by session id.
type Sessions = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<Event>>>>;

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    server: McpServer,
    sessions: Sessions,
    api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(server: McpServer, api_key: Option<String>) -> Self {
        Self {
            server,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            api_key: api_key.map(Arc::from),
        }
    }

    /// Number of open SSE sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Removes its session from the table when the SSE stream is dropped.
struct SessionGuard {
    id: String,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = std::mem::take(&mut self.id);
        let sessions = self.sessions.clone();
        info!("SSE session closed: {}", id);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                sessions.write().await.remove(&id);
            });
        }
    }
}

/// Build the router: `/health` open, `/sse` and `/messages` behind the key gate.
pub fn router(state: AppState, enable_cors: bool) -> Router {
    let gated = Router::new()
        .route("/sse", get(handle_sse))
        .route("/messages", post(handle_message))
        .route_layer(middleware::from_fn_with_state(
            state.api_key.clone(),
            require_api_key,
        ));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(gated)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport until the server stops.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let state = AppState::new(server, self.config.api_key.clone());
        let app = router(state, self.config.enable_cors);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (SSE, CORS {})", addr, cors_status);
        info!("  → Stream:   GET /sse");
        info!("  → Messages: POST /messages?session_id=...");
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Open an event stream for a new session.
async fn handle_sse(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::unbounded_channel();

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages?session_id={session_id}"));
    // The receiver is alive, so the first event cannot fail to queue.
    let _ = tx.send(endpoint);

    state.sessions.write().await.insert(session_id.clone(), tx);
    info!("SSE session opened: {}", session_id);

    let guard = SessionGuard {
        id: session_id,
        sessions: state.sessions.clone(),
    };
    let stream = UnboundedReceiverStream::new(rx).map(move |event| {
        let _session = &guard;
        Ok::<_, Infallible>(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(KEEP_ALIVE_SECS)))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

/// Accept one JSON-RPC message for a session; the reply goes out on its stream.
#[instrument(skip_all)]
async fn handle_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "Missing session_id").into_response();
    };

    let Some(sender) = state.sessions.read().await.get(&session_id).cloned() else {
        warn!("Message for unknown session: {}", session_id);
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Unparseable message: {}", e);
            return (StatusCode::BAD_REQUEST, format!("Invalid JSON-RPC message: {e}"))
                .into_response();
        }
    };

    info!("Received JSON-RPC request: {}", request.method);

    let server = state.server.clone();
    tokio::spawn(async move {
        let Some(response) = process_request(&server, request).await else {
            return;
        };
        let payload = serde_json::to_string(&response).unwrap_or_else(|e| {
            json!({
                "jsonrpc": "2.0",
                "id": response.id,
                "error": { "code": -32603, "message": format!("serialization failed: {e}") }
            })
            .to_string()
        });
        if sender.send(Event::default().event("message").data(payload)).is_err() {
            debug!("SSE stream closed before the response was delivered");
        }
    });

    StatusCode::ACCEPTED.into_response()
}

/// Process a JSON-RPC message; notifications produce no response.
pub async fn process_request(server: &McpServer, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::invalid_request(request.id));
    }

    let response = match request.method.as_str() {
        "initialize" => handle_initialize(server, request),

        "ping" => JsonRpcResponse::success(request.id, json!({})),

        "tools/list" => JsonRpcResponse::success(
            request.id,
            json!({ "tools": server.list_tools_json() }),
        ),

        "tools/call" => handle_tools_call(server, request).await,

        method if method.starts_with("notifications/") => {
            info!("Received notification: {}", method);
            return None;
        }

        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id)
        }
    };

    Some(response)
}

fn handle_initialize(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    let protocol_version = request
        .params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_PROTOCOL_VERSION)
        .to_string();

    let instructions = rmcp::ServerHandler::get_info(server).instructions;

    JsonRpcResponse::success(
        request.id,
        json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": server.name(),
                "version": server.version()
            },
            "instructions": instructions
        }),
    )
}

async fn handle_tools_call(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let Some(params) = request.params else {
        return JsonRpcResponse::invalid_params(request.id, "Missing params");
    };

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::invalid_params(request.id, "Missing tool name");
    };

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            return JsonRpcResponse::invalid_params(request.id, "Tool arguments must be an object");
        }
    };

    JsonRpcResponse::success(request.id, server.call_tool_json(name, arguments).await)
}
