//! Generative API collaborator.
//!
//! # Data Flow
//! ```text
//! decoded payload + ApiKey
//!     → endpoint.rs (version/model template, `key` query parameter)
//!     → client.rs (single POST, JSON in, raw status + body out)
//!     → UpstreamReply
//! ```

pub mod client;
pub mod endpoint;

pub use client::{GeminiClient, GenerativeApi, UpstreamError, UpstreamReply};
pub use endpoint::EndpointTemplate;
