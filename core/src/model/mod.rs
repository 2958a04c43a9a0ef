//! Turnstile Model Layer
//!
//! - [ModelProvider] trait: one streamed completion per call
//! - [ModelClient]: wraps the configured provider and applies defaults
//! - Provider implementations in [providers]

pub mod client;
pub mod error;
pub mod provider;
pub mod providers;
pub mod streaming;
pub mod types;

pub use client::{ClientConfig, ModelClient};
pub use error::{ModelError, Result};
pub use provider::ModelProvider;
pub use types::{ModelRequest, ResponseStream, ToolDefinition};
