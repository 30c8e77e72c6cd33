//! Shared-secret gate for the SSE endpoints.
//!
//! A request passes when the `X-API-Key` header or the `api_key` query
//! parameter equals the configured secret. Without a configured secret the
//! gated endpoints refuse everything with 500 rather than running open.

use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Header carrying the key (matched case-insensitively by `http`).
pub const API_KEY_HEADER: &str = "x-api-key";

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// `MCP_SSE_API_KEY` is not set.
    NotConfigured,
    /// No key, or the wrong key, was presented.
    Unauthorized,
}

impl GateRejection {
    pub fn status(self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::NotConfigured => "Server API key not configured",
            Self::Unauthorized => "Invalid or missing API key",
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Compare the presented keys against the expected one.
pub fn check_api_key(
    expected: Option<&str>,
    header: Option<&str>,
    query: Option<&str>,
) -> Result<(), GateRejection> {
    let Some(expected) = expected.filter(|key| !key.is_empty()) else {
        return Err(GateRejection::NotConfigured);
    };

    if [header, query].into_iter().flatten().any(|key| key == expected) {
        Ok(())
    } else {
        Err(GateRejection::Unauthorized)
    }
}

#[derive(Deserialize)]
struct KeyQuery {
    api_key: Option<String>,
}

fn query_key(request: &Request) -> Option<String> {
    request
        .uri()
        .query()
        .and_then(|q| serde_urlencoded::from_str::<KeyQuery>(q).ok())
        .and_then(|q| q.api_key)
}

/// Middleware for `axum::middleware::from_fn_with_state`; the state is the expected key.
pub async fn require_api_key(
    State(expected): State<Option<Arc<str>>>,
    request: Request,
    next: Next,
) -> Response {
    let verdict = {
        let header = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        let query = query_key(&request);
        check_api_key(expected.as_deref(), header, query.as_deref())
    };

    match verdict {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            warn!(
                "Rejected {} {}: {:?}",
                request.method(),
                request.uri().path(),
                rejection
            );
            rejection.into_response()
        }
    }
}
