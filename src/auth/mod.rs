//! Caller authentication.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → token.rs (parse `Bearer <token>`)
//!     → verifier.rs (ask the auth service who the token belongs to)
//!     → Identity
//! ```

pub mod token;
pub mod verifier;

pub use token::BearerToken;
pub use verifier::{AuthError, Identity, IdentityVerifier, SupabaseVerifier};
