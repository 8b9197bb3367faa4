// Service configuration resolved from the environment. Provider identity is
// deliberately a configuration detail: the core only needs an endpoint that
// accepts a prompt and returns text parseable as the insight schema.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the text-generation service.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl InsightConfig {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Resolve from `VIZBOT_API_KEY`, `VIZBOT_API_BASE`, `VIZBOT_MODEL` and
    /// `VIZBOT_TIMEOUT_SECS`. Only the key is required.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("VIZBOT_API_KEY")
            .map_err(|_| Error::service("VIZBOT_API_KEY is not set"))?;

        let api_base =
            env::var("VIZBOT_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let model = env::var("VIZBOT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout = env::var("VIZBOT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            api_base,
            api_key,
            model,
            timeout,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
