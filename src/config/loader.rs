//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ApiKey, RelayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Auth service base URL.
pub const ENV_AUTH_URL: &str = "SUPABASE_URL";
/// Auth service public key.
pub const ENV_AUTH_PUBLIC_KEY: &str = "SUPABASE_ANON_KEY";
/// Upstream API key.
pub const ENV_UPSTREAM_API_KEY: &str = "GEMINI_API_KEY";
/// Listener bind address.
pub const ENV_BIND_ADDRESS: &str = "RELAY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, overlay the process
/// environment, then validate.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    load_config_with_env(path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with_env<F>(path: Option<&Path>, env: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
    };

    apply_env(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values on top of file values. Empty values count as unset.
pub fn apply_env<F>(config: &mut RelayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup(ENV_AUTH_URL) {
        config.auth.base_url = Some(url);
    }
    if let Some(key) = lookup(ENV_AUTH_PUBLIC_KEY) {
        config.auth.public_key = Some(key);
    }
    if let Some(key) = lookup(ENV_UPSTREAM_API_KEY) {
        config.upstream.api_key = Some(ApiKey::new(key));
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }

    // Blank values in the file are treated as missing too.
    if config.auth.base_url.as_deref().is_some_and(|v| v.trim().is_empty()) {
        config.auth.base_url = None;
    }
    if config.auth.public_key.as_deref().is_some_and(|v| v.trim().is_empty()) {
        config.auth.public_key = None;
    }
    if config
        .upstream
        .api_key
        .as_ref()
        .is_some_and(|k| k.expose().trim().is_empty())
    {
        config.upstream.api_key = None;
    }
}
