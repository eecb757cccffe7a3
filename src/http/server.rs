//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router routing every path to the relay
//! - Wire up middleware (tracing, request ID, body limit, CORS headers)
//! - Build the auth verifier and upstream client from configuration
//! - Bind server to listener and shut down on signal

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header::InvalidHeaderValue, HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::auth::SupabaseVerifier;
use crate::config::RelayConfig;
use crate::http::cors::CorsHeaders;
use crate::http::request::{
    propagate_request_id_layer, relay_request, request_id, set_request_id_layer,
};
use crate::observability::metrics;
use crate::relay::RelayHandler;
use crate::upstream::{EndpointTemplate, GeminiClient};

/// Errors raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid CORS header value: {0}")]
    Cors(#[from] InvalidHeaderValue),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayHandler>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a server that talks to the configured auth service and upstream.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let mut builder = reqwest::Client::builder();
        if !config.outbound.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        let verifier = Arc::new(SupabaseVerifier::new(client.clone(), &config.auth));
        let upstream = Arc::new(GeminiClient::new(
            client,
            EndpointTemplate::from_config(&config.upstream),
        ));
        let relay = RelayHandler::new(verifier, upstream, config.upstream.api_key.clone());

        Self::with_handler(config, relay)
    }

    /// Create a server around an already-built relay handler.
    pub fn with_handler(config: RelayConfig, relay: RelayHandler) -> Result<Self, ServerError> {
        let state = AppState {
            relay: Arc::new(relay),
        };
        let router = Self::build_router(&config, state)?;
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Result<Router, ServerError> {
        let cors = CorsHeaders::from_config(&config.cors)?;

        let router = Router::new()
            .route("/", any(relay_endpoint))
            .route("/{*path}", any(relay_endpoint))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size));

        Ok(cors
            .apply(router)
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer()))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            model = %self.config.upstream.model,
            api_version = %self.config.upstream.api_version,
            "HTTP server starting"
        );

        if self.config.upstream.api_key.is_none() {
            tracing::warn!("No upstream API key configured; relay requests will fail with 500");
        }
        if self.config.auth.base_url.is_none() || self.config.auth.public_key.is_none() {
            tracing::warn!("Auth service not fully configured; relay requests will fail with 500");
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Transport adapter: request → relay → response.
async fn relay_endpoint(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&headers);

    tracing::debug!(request_id = %request_id, method = %method, "Relaying request");

    let outcome = state
        .relay
        .handle(relay_request(method, &headers, body))
        .await;

    let status = outcome.status();
    metrics::record_relay(outcome.label(), status.as_u16(), start_time);
    tracing::debug!(
        request_id = %request_id,
        status = %status,
        outcome = outcome.label(),
        "Relay finished"
    );

    outcome.into_response()
}
