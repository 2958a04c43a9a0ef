//! Model client
//!
//! Wraps the configured provider and fills request defaults.

use std::sync::Arc;

use turnstile_config::ModelsConfig;

use super::error::Result;
use super::provider::ModelProvider;
use super::providers::build_provider;
use super::types::{ModelRequest, ResponseStream};

/// Model client
pub struct ModelClient {
  provider: Arc<dyn ModelProvider>,
  config: ClientConfig,
}

impl ModelClient {
  /// Create a client over an existing provider
  pub fn new(provider: Arc<dyn ModelProvider>, config: ClientConfig) -> Self {
    Self { provider, config }
  }

  /// Create the client described by the models configuration
  pub fn from_config(config: &ModelsConfig) -> Result<Self> {
    let provider = build_provider(config)?;
    Ok(Self::new(provider, ClientConfig::from(config)))
  }

  /// Send a streaming request
  pub async fn stream(&self, request: ModelRequest) -> Result<ResponseStream> {
    let request = self.enrich_request(request);
    self.provider.stream(request).await
  }

  pub fn model(&self) -> &str {
    &self.config.model
  }

  pub fn provider_id(&self) -> &'static str {
    self.provider.provider_id()
  }

  /// Enrich request with default values
  fn enrich_request(&self, mut request: ModelRequest) -> ModelRequest {
    if request.model.is_empty() {
      request.model = self.config.model.clone();
    }
    if request.temperature.is_none() {
      request.temperature = self.config.default_temperature;
    }
    if request.max_tokens.is_none() {
      request.max_tokens = self.config.default_max_tokens;
    }
    request
  }
}

/// Client configuration
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
  /// Model used when a request leaves it empty
  pub model: String,

  /// Default temperature for requests
  pub default_temperature: Option<f32>,

  /// Default max tokens for requests
  pub default_max_tokens: Option<u32>,
}

impl From<&ModelsConfig> for ClientConfig {
  fn from(config: &ModelsConfig) -> Self {
    Self {
      model: config.model.clone(),
      default_temperature: config.temperature,
      default_max_tokens: config.max_tokens,
    }
  }
}
