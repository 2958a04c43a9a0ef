//! Model layer errors

/// Failures opening or reading a model stream
#[derive(thiserror::Error, Debug)]
pub enum ModelError {
  /// The provider rejected the credentials (HTTP 401/403)
  #[error("authentication failed: {0}")]
  AuthError(String),

  /// Any other non-success HTTP status
  #[error("provider API error: {0}")]
  ApiError(String),

  #[error("network error: {0}")]
  NetworkError(#[from] reqwest::Error),

  /// `models.provider` names no known provider
  #[error("unknown provider: {0}")]
  ProviderNotFound(String),

  /// The stream broke off or carried an error event
  #[error("stream error: {0}")]
  StreamError(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
