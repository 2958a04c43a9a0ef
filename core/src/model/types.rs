//! Model request types

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use turnstile_protocol::{Message, ResponseEvent};

use super::error::Result;

/// Stream of normalized response events.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<ResponseEvent>> + Send>>;

/// One streamed model call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelRequest {
  /// Model name
  pub model: String,
  /// System prompt sent ahead of the history
  pub system_prompt: String,
  /// Full conversation history
  pub messages: Vec<Message>,
  /// Tool catalogue offered to the model
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tools: Vec<ToolDefinition>,
  /// Temperature (0.0 - 2.0)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f32>,
  /// Maximum tokens to generate
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_tokens: Option<u32>,
}

/// Tool schema as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
  pub name: String,
  pub description: String,
  /// JSON schema of the tool input
  pub parameters: Value,
}
