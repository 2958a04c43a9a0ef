// Turnstile Configuration System
// Layered configuration management

pub mod layered;
pub mod loader;
pub mod types;

use std::path::PathBuf;

pub use layered::LayeredConfig;
pub use loader::{ConfigLoader, parse_cli_overrides};
pub use types::*;

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to parse {path}: {message}")]
  Parse { path: PathBuf, message: String },
  #[error("invalid override: {0}")]
  InvalidOverride(String),
  #[error("invalid configuration: {0}")]
  Invalid(String),
}
