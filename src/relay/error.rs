//! Relay failure taxonomy.

use axum::http::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;
use crate::upstream::UpstreamError;

/// Every way a relay attempt can end without an upstream success.
///
/// The `Display` text is what the caller sees in `{"error": ...}`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing Authorization header.")]
    MissingAuthorization,

    #[error("Invalid Authorization header.")]
    InvalidAuthorization,

    #[error("Authentication failed.")]
    AuthenticationFailed(#[source] AuthError),

    #[error("Auth service is not configured.")]
    AuthNotConfigured(#[source] AuthError),

    #[error("GEMINI_API_KEY is not configured.")]
    MissingCredential,

    #[error("{0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("Gemini API error: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("Gemini API request failed: {0}")]
    UpstreamTransport(#[source] UpstreamError),

    #[error("Invalid Gemini API response: {0}")]
    InvalidUpstreamBody(#[source] serde_json::Error),
}

/// Coarse grouping used for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad or unverifiable caller credentials.
    Client,
    /// Deployment misconfiguration.
    Configuration,
    /// Non-success answer from the generative API.
    Upstream,
    /// Anything else.
    Unexpected,
}

impl RelayError {
    pub fn from_auth(err: AuthError) -> Self {
        if err.is_configuration() {
            RelayError::AuthNotConfigured(err)
        } else {
            RelayError::AuthenticationFailed(err)
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            RelayError::MissingAuthorization
            | RelayError::InvalidAuthorization
            | RelayError::AuthenticationFailed(_) => ErrorClass::Client,
            RelayError::AuthNotConfigured(_) | RelayError::MissingCredential => {
                ErrorClass::Configuration
            }
            RelayError::Upstream { .. } => ErrorClass::Upstream,
            RelayError::InvalidPayload(_)
            | RelayError::UpstreamTransport(_)
            | RelayError::InvalidUpstreamBody(_) => ErrorClass::Unexpected,
        }
    }

    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Upstream { status, .. } => *status,
            _ => match self.class() {
                ErrorClass::Client => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}
