//! Model Provider trait
//!
//! This module defines the [ModelProvider] trait that all LLM providers must implement.

use async_trait::async_trait;

use super::error::{ModelError, Result};
use super::types::{ModelRequest, ResponseStream};

/// Model Provider trait
///
/// A provider turns a [ModelRequest] into a stream of
/// [`ResponseEvent`](turnstile_protocol::ResponseEvent)s. Provider framing
/// never leaks past this boundary.
#[async_trait]
pub trait ModelProvider: Send + Sync {
  /// Returns the unique identifier for this provider
  fn provider_id(&self) -> &'static str;

  /// Starts a streamed completion
  async fn stream(&self, request: ModelRequest) -> Result<ResponseStream>;
}

/// Standard error handling for HTTP responses
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
  if response.status().is_success() {
    return Ok(response);
  }
  let status = response.status();
  let body = response.text().await.unwrap_or_default();
  match status.as_u16() {
    401 | 403 => Err(ModelError::AuthError(format!("HTTP {status}: {body}"))),
    _ => Err(ModelError::ApiError(format!("HTTP {status}: {body}"))),
  }
}
