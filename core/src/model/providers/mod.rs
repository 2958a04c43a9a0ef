//! Model provider implementations

use std::sync::Arc;

use reqwest::Client;
use tracing::warn;

use turnstile_config::ModelsConfig;

use super::error::{ModelError, Result};
use super::provider::ModelProvider;

pub mod openai;

pub use openai::OpenAiCompatibleProvider;

/// Build the provider named in the models configuration.
pub fn build_provider(config: &ModelsConfig) -> Result<Arc<dyn ModelProvider>> {
  match config.provider.as_str() {
    "openai" | "openai-compatible" | "ollama" | "lmstudio" => {
      let api_key = std::env::var(&config.api_key_env).ok();
      if api_key.is_none() && config.base_url.is_none() {
        warn!(
          env = %config.api_key_env,
          "no API key found for the default endpoint"
        );
      }
      Ok(Arc::new(OpenAiCompatibleProvider::new(
        api_key,
        config.base_url.clone(),
      )))
    }
    other => Err(ModelError::ProviderNotFound(other.to_string())),
  }
}

/// Create a default HTTP client for providers
pub fn create_client(timeout: Option<u64>) -> Client {
  let timeout = std::time::Duration::from_secs(timeout.unwrap_or(300));

  Client::builder()
    .timeout(timeout)
    .build()
    .unwrap_or_else(|_| Client::new())
}
