//! Authenticated relay to a generative-language API.
//!
//! Each inbound request is checked for a bearer token, the token is verified
//! against the auth service, and the JSON payload is forwarded to the
//! upstream `generateContent` endpoint with the server-held API key. The
//! upstream answer, or a `{"error": ...}` envelope, goes back to the caller.

pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod upstream;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{RelayHandler, RelayOutcome, RelayRequest};
