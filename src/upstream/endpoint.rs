//! Upstream endpoint template.

use url::Url;

use crate::config::{ApiKey, UpstreamConfig};

/// `{base_url}/{api_version}/models/{model}:generateContent`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate {
    base_url: String,
    api_version: String,
    model: String,
}

impl EndpointTemplate {
    pub fn new(
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into().trim_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(&config.base_url, &config.api_version, &config.model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Endpoint without the credential, safe to log.
    pub fn base(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}/models/{}:generateContent",
            self.base_url, self.api_version, self.model
        ))
    }

    /// Full endpoint with the credential appended as the `key` query parameter.
    pub fn resolve(&self, api_key: &ApiKey) -> Result<Url, url::ParseError> {
        let mut url = self.base()?;
        url.query_pairs_mut().append_pair("key", api_key.expose());
        Ok(url)
    }
}

impl Default for EndpointTemplate {
    fn default() -> Self {
        Self::from_config(&UpstreamConfig::default())
    }
}
