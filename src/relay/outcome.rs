//! Typed result of one relay invocation.

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::relay::error::RelayError;

/// What the transport layer should send back.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    /// CORS preflight; nothing was processed.
    Preflight,
    /// Upstream JSON, relayed verbatim with 200.
    Success(Value),
    /// Caller-side problem (bad credentials, upstream 4xx).
    ClientError { status: StatusCode, message: String },
    /// Server-side problem (configuration, upstream 5xx, unexpected failures).
    ServerError { status: StatusCode, message: String },
}

impl RelayOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayOutcome::Preflight | RelayOutcome::Success(_) => StatusCode::OK,
            RelayOutcome::ClientError { status, .. } | RelayOutcome::ServerError { status, .. } => {
                *status
            }
        }
    }

    /// JSON body, `None` for preflight.
    pub fn body(&self) -> Option<Value> {
        match self {
            RelayOutcome::Preflight => None,
            RelayOutcome::Success(value) => Some(value.clone()),
            RelayOutcome::ClientError { message, .. } | RelayOutcome::ServerError { message, .. } => {
                Some(json!({ "error": message }))
            }
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            RelayOutcome::Preflight => "preflight",
            RelayOutcome::Success(_) => "success",
            RelayOutcome::ClientError { .. } => "client_error",
            RelayOutcome::ServerError { .. } => "server_error",
        }
    }
}

impl From<RelayError> for RelayOutcome {
    fn from(err: RelayError) -> Self {
        let status = err.status();
        let message = err.to_string();
        if status.is_client_error() {
            RelayOutcome::ClientError { status, message }
        } else {
            RelayOutcome::ServerError { status, message }
        }
    }
}
