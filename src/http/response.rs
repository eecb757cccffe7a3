//! Outcome → HTTP response.
//!
//! # Design Decisions
//! - Preflight answers `ok` as plain text, everything else is JSON
//! - Error bodies are always `{"error": <message>}`
//! - CORS and request ID headers are added by layers, not here

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::relay::RelayOutcome;

impl IntoResponse for RelayOutcome {
    fn into_response(self) -> Response {
        match self {
            RelayOutcome::Preflight => (StatusCode::OK, "ok").into_response(),
            RelayOutcome::Success(payload) => (StatusCode::OK, Json(payload)).into_response(),
            RelayOutcome::ClientError { status, message }
            | RelayOutcome::ServerError { status, message } => {
                (status, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}
