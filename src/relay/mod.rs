//! Authenticated relay to the generative API.
//!
//! # Data Flow
//! ```text
//! RelayRequest
//!     → handler.rs (preflight? header? credential? verify → decode → forward)
//!     → error.rs (every failure is a RelayError)
//!     → outcome.rs (Success | ClientError | ServerError | Preflight)
//!     → http::response (outcome → HTTP response)
//! ```

pub mod error;
pub mod handler;
pub mod outcome;

pub use error::{ErrorClass, RelayError};
pub use handler::{RelayHandler, RelayRequest};
pub use outcome::RelayOutcome;
