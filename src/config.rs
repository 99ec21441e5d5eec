use crate::error::{AgentError, Result};

/// Environment variable holding the provider credential
pub const API_KEY_ENV: &str = "INCEPTION_API_KEY";
/// Optional override for the provider base URL
pub const BASE_URL_ENV: &str = "INCEPTION_BASE_URL";
/// Optional override for the model id
pub const MODEL_ENV: &str = "INCEPTION_MODEL";

pub const DEFAULT_BASE_URL: &str = "https://api.inceptionlabs.ai/v1";
pub const DEFAULT_MODEL: &str = "mercury";

/// Connection settings for the OpenAI-compatible model provider.
///
/// Built once at startup and handed to [`crate::Agent::new`]; nothing here is
/// written back into the process environment.
#[derive(Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ModelConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                AgentError::Config(format!(
                    "{} not found in environment variables",
                    API_KEY_ENV
                ))
            })?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
            config.base_url = base_url;
        }

        if let Some(model) = lookup(MODEL_ENV).filter(|value| !value.trim().is_empty()) {
            config.model = model;
        }

        Ok(config)
    }
}

// Keep the credential out of logs.
impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}
