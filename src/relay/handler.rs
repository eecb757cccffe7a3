//! The relay handler.
//!
//! # Responsibilities
//! - Short-circuit CORS preflight
//! - Require and verify the caller's bearer token
//! - Require the server-held credential
//! - Forward the decoded JSON payload upstream, once
//! - Turn the upstream answer (or any failure) into a `RelayOutcome`
//!
//! # Design Decisions
//! - Steps run strictly in sequence; nothing is retried or cached
//! - The credential is checked before the auth call, so a missing key is a
//!   500 whatever the token
//! - The payload shape is never inspected

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;
use serde_json::Value;

use crate::auth::{BearerToken, IdentityVerifier};
use crate::config::ApiKey;
use crate::relay::error::{ErrorClass, RelayError};
use crate::relay::outcome::RelayOutcome;
use crate::upstream::GenerativeApi;

/// Transport-independent view of an inbound request.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub method: Method,
    /// Raw `Authorization` header value, if any.
    pub authorization: Option<String>,
    pub body: Bytes,
}

impl RelayRequest {
    pub fn new(method: Method, authorization: Option<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            authorization,
            body: body.into(),
        }
    }
}

/// Authenticates callers and forwards their payload to the generative API.
#[derive(Clone)]
pub struct RelayHandler {
    verifier: Arc<dyn IdentityVerifier>,
    upstream: Arc<dyn GenerativeApi>,
    api_key: Option<ApiKey>,
}

impl RelayHandler {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        upstream: Arc<dyn GenerativeApi>,
        api_key: Option<ApiKey>,
    ) -> Self {
        Self {
            verifier,
            upstream,
            api_key,
        }
    }

    /// Handle one request. Always produces an outcome.
    pub async fn handle(&self, request: RelayRequest) -> RelayOutcome {
        if request.method == Method::OPTIONS {
            tracing::debug!("Handling CORS preflight");
            return RelayOutcome::Preflight;
        }

        match self.relay(request).await {
            Ok(payload) => RelayOutcome::Success(payload),
            Err(err) => {
                match err.class() {
                    ErrorClass::Client => {
                        tracing::warn!(
                            error = %err,
                            cause = ?std::error::Error::source(&err),
                            "Rejected caller"
                        );
                    }
                    ErrorClass::Configuration => {
                        tracing::error!(error = %err, "Relay is misconfigured");
                    }
                    ErrorClass::Upstream => {
                        tracing::error!(
                            status = %err.status(),
                            error = %err,
                            "Upstream returned an error"
                        );
                    }
                    ErrorClass::Unexpected => {
                        tracing::error!(error = %err, "Unexpected relay failure");
                    }
                }
                err.into()
            }
        }
    }

    async fn relay(&self, request: RelayRequest) -> Result<Value, RelayError> {
        let header = request
            .authorization
            .as_deref()
            .ok_or(RelayError::MissingAuthorization)?;
        let token = BearerToken::from_header(header).ok_or(RelayError::InvalidAuthorization)?;

        let api_key = self.api_key.as_ref().ok_or(RelayError::MissingCredential)?;

        let identity = self
            .verifier
            .verify(&token)
            .await
            .map_err(RelayError::from_auth)?;
        tracing::info!(user_id = %identity.user_id, "Caller authenticated");

        let payload: Value =
            serde_json::from_slice(&request.body).map_err(RelayError::InvalidPayload)?;

        let reply = self
            .upstream
            .generate_content(&payload, api_key)
            .await
            .map_err(RelayError::UpstreamTransport)?;

        if !reply.status.is_success() {
            return Err(RelayError::Upstream {
                status: reply.status,
                body: reply.body,
            });
        }

        let result = serde_json::from_str(&reply.body).map_err(RelayError::InvalidUpstreamBody)?;
        tracing::info!(user_id = %identity.user_id, "Upstream response relayed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, Identity};
    use crate::upstream::{UpstreamError, UpstreamReply};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    enum Verdict {
        Accept(&'static str),
        Reject,
        Unconfigured,
    }

    struct FakeVerifier {
        verdict: Verdict,
        calls: AtomicUsize,
    }

    impl FakeVerifier {
        fn new(verdict: Verdict) -> Arc<Self> {
            Arc::new(Self {
                verdict,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityVerifier for FakeVerifier {
        async fn verify(&self, token: &BearerToken) -> Result<Identity, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.verdict {
                Verdict::Accept(user) if token.as_str() == "validtoken" => Ok(Identity {
                    user_id: user.to_string(),
                    email: None,
                }),
                Verdict::Accept(_) | Verdict::Reject => Err(AuthError::Rejected { status: 401 }),
                Verdict::Unconfigured => Err(AuthError::NotConfigured("base URL")),
            }
        }
    }

    struct FakeUpstream {
        reply: Option<(StatusCode, &'static str)>,
        seen: Mutex<Vec<(Value, String)>>,
    }

    impl FakeUpstream {
        fn replying(status: StatusCode, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some((status, body)),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerativeApi for FakeUpstream {
        async fn generate_content(
            &self,
            payload: &Value,
            api_key: &ApiKey,
        ) -> Result<UpstreamReply, UpstreamError> {
            self.seen
                .lock()
                .unwrap()
                .push((payload.clone(), api_key.expose().to_string()));
            match self.reply {
                Some((status, body)) => Ok(UpstreamReply {
                    status,
                    body: body.to_string(),
                }),
                None => Err(UpstreamError::Endpoint(url::ParseError::EmptyHost)),
            }
        }
    }

    const PROMPT: &str = r#"{"contents":[{"parts":[{"text":"hi"}]}]}"#;
    const CANDIDATES: &str = r#"{"candidates":[{"content":"hello"}]}"#;

    fn handler(
        verifier: &Arc<FakeVerifier>,
        upstream: &Arc<FakeUpstream>,
        api_key: Option<&str>,
    ) -> RelayHandler {
        RelayHandler::new(
            verifier.clone(),
            upstream.clone(),
            api_key.map(ApiKey::new),
        )
    }

    fn post(auth: Option<&str>, body: &'static str) -> RelayRequest {
        RelayRequest::new(Method::POST, auth.map(str::to_string), body)
    }

    #[tokio::test]
    async fn test_preflight_skips_everything() {
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));
        let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
        let relay = handler(&verifier, &upstream, None);

        let outcome = relay
            .handle(RelayRequest::new(Method::OPTIONS, None, "not json"))
            .await;

        assert_eq!(outcome, RelayOutcome::Preflight);
        assert_eq!(outcome.status(), StatusCode::OK);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_relay() {
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));
        let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay.handle(post(Some("Bearer validtoken"), PROMPT)).await;

        assert_eq!(
            outcome,
            RelayOutcome::Success(json!({"candidates":[{"content":"hello"}]}))
        );
        let seen = upstream.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, serde_json::from_str::<Value>(PROMPT).unwrap());
        assert_eq!(seen[0].1, "server-key");
    }

    #[tokio::test]
    async fn test_rejected_token() {
        let verifier = FakeVerifier::new(Verdict::Reject);
        let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay.handle(post(Some("Bearer validtoken"), PROMPT)).await;

        assert_eq!(outcome.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            outcome.body(),
            Some(json!({"error": "Authentication failed."}))
        );
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_authorization() {
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));
        let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay.handle(post(None, PROMPT)).await;

        assert_eq!(outcome.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            outcome.body(),
            Some(json!({"error": "Missing Authorization header."}))
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_authorization() {
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));
        let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay.handle(post(Some("Basic abc"), PROMPT)).await;

        assert_eq!(outcome.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_regardless_of_auth() {
        for verdict in [Verdict::Accept("user-1"), Verdict::Reject] {
            let verifier = FakeVerifier::new(verdict);
            let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
            let relay = handler(&verifier, &upstream, None);

            let outcome = relay.handle(post(Some("Bearer validtoken"), PROMPT)).await;

            assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(upstream.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_unconfigured_auth_is_server_error() {
        let verifier = FakeVerifier::new(Verdict::Unconfigured);
        let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay.handle(post(Some("Bearer validtoken"), PROMPT)).await;

        assert!(matches!(
            outcome,
            RelayOutcome::ServerError { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_relayed() {
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));
        let upstream = FakeUpstream::replying(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"quota exceeded"}}"#,
        );
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay.handle(post(Some("Bearer validtoken"), PROMPT)).await;

        assert_eq!(outcome.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = outcome.body().unwrap();
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Gemini API error: "));
        assert!(message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));
        let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay.handle(post(Some("Bearer validtoken"), "{not json")).await;

        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_and_bad_body() {
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));

        let upstream = FakeUpstream::failing();
        let relay = handler(&verifier, &upstream, Some("server-key"));
        let outcome = relay.handle(post(Some("Bearer validtoken"), PROMPT)).await;
        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.calls(), 1);

        let upstream = FakeUpstream::replying(StatusCode::OK, "<html>");
        let relay = handler(&verifier, &upstream, Some("server-key"));
        let outcome = relay.handle(post(Some("Bearer validtoken"), PROMPT)).await;
        assert_eq!(outcome.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_key_order_is_preserved() {
        let prompt = r#"{"generationConfig":{"temperature":0.2},"contents":[{"parts":[{"text":"hi"}]}]}"#;
        let answer = r#"{"candidates":[{"content":"hello"}],"usageMetadata":{"totalTokenCount":3},"modelVersion":"gemini-2.5-flash"}"#;
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));
        let upstream = FakeUpstream::replying(StatusCode::OK, answer);
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay.handle(post(Some("Bearer validtoken"), prompt)).await;

        let payload = match outcome {
            RelayOutcome::Success(payload) => payload,
            other => panic!("expected success, got {:?}", other),
        };
        assert_eq!(payload.to_string(), answer);
        assert_eq!(upstream.seen.lock().unwrap()[0].0.to_string(), prompt);
    }

    #[tokio::test]
    async fn test_undecodable_authorization_is_invalid() {
        let verifier = FakeVerifier::new(Verdict::Accept("user-1"));
        let upstream = FakeUpstream::replying(StatusCode::OK, CANDIDATES);
        let relay = handler(&verifier, &upstream, Some("server-key"));

        let outcome = relay
            .handle(post(Some("Bearer ab\u{FFFD}cd"), PROMPT))
            .await;

        assert_eq!(outcome.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            outcome.body(),
            Some(json!({"error": "Invalid Authorization header."}))
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }
}
