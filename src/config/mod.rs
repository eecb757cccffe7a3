//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → config file (TOML, optional)
//!     → environment overlay (SUPABASE_URL, SUPABASE_ANON_KEY, GEMINI_API_KEY, ...)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared with the relay handler at construction
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at startup and never mutated afterwards
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiKey, AuthConfig, CorsConfig, ListenerConfig, ObservabilityConfig, OutboundConfig,
    RelayConfig, SecurityConfig, UpstreamConfig,
};
pub use validation::ValidationError;
