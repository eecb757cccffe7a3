//! Identity verification against the external auth service.
//!
//! # Responsibilities
//! - Define the `IdentityVerifier` seam used by the relay handler
//! - Call the auth service's user endpoint with the caller's token
//! - Classify failures (rejected, unreachable, malformed, not configured)
//!
//! # Design Decisions
//! - Single attempt, no caching of identities between requests
//! - Only `NotConfigured` is a server fault; every other failure is a 401

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::token::BearerToken;
use crate::config::AuthConfig;

/// Path of the user lookup endpoint, relative to the auth base URL.
pub const USER_ENDPOINT_PATH: &str = "/auth/v1/user";

/// Verified caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    /// Opaque user identifier.
    #[serde(rename = "id")]
    pub user_id: String,

    #[serde(default)]
    pub email: Option<String>,
}

/// Errors that can occur while verifying a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Base URL or public key missing from configuration.
    #[error("auth service is not configured: missing {0}")]
    NotConfigured(&'static str),

    /// The auth service refused the token.
    #[error("token rejected by auth service (status {status})")]
    Rejected { status: u16 },

    /// The auth service could not be reached.
    #[error("auth service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The auth service answered with something that is not a user.
    #[error("malformed auth service response: {0}")]
    Malformed(String),
}

impl AuthError {
    /// Whether the failure is a deployment problem rather than a bad token.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AuthError::NotConfigured(_))
    }
}

/// Verifies a bearer token and returns the caller's identity.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &BearerToken) -> Result<Identity, AuthError>;
}

/// Verifier backed by a Supabase-compatible `GET /auth/v1/user` endpoint.
#[derive(Debug, Clone)]
pub struct SupabaseVerifier {
    client: Client,
    base_url: Option<String>,
    public_key: Option<String>,
}

impl SupabaseVerifier {
    pub fn new(client: Client, config: &AuthConfig) -> Self {
        Self {
            client,
            base_url: config
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string()),
            public_key: config.public_key.clone(),
        }
    }

    fn user_url(&self) -> Result<String, AuthError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(AuthError::NotConfigured("base URL"))?;
        Ok(format!("{}{}", base, USER_ENDPOINT_PATH))
    }
}

#[async_trait]
impl IdentityVerifier for SupabaseVerifier {
    async fn verify(&self, token: &BearerToken) -> Result<Identity, AuthError> {
        let url = self.user_url()?;
        let public_key = self
            .public_key
            .as_deref()
            .ok_or(AuthError::NotConfigured("public key"))?;

        let response = self
            .client
            .get(&url)
            .header("apikey", public_key)
            .header(reqwest::header::AUTHORIZATION, token.to_header_value())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<Identity>(&body).map_err(|e| AuthError::Malformed(e.to_string()))
    }
}
