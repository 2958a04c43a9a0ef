// Conversation Messages
// Turns recorded in a session's history

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
}

/// One block inside a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
  /// Plain text
  Text { text: String },
  /// Tool invocation requested by the assistant
  ToolUse {
    id: String,
    name: String,
    input: Value,
  },
  /// Result of a tool invocation, correlated by `tool_use_id`
  ToolResult {
    tool_use_id: String,
    content: String,
    #[serde(default)]
    is_error: bool,
  },
}

impl ContentBlock {
  pub fn text(text: impl Into<String>) -> Self {
    ContentBlock::Text { text: text.into() }
  }

  pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
    ContentBlock::ToolResult {
      tool_use_id: tool_use_id.into(),
      content: content.into(),
      is_error: false,
    }
  }

  pub fn tool_error(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
    ContentBlock::ToolResult {
      tool_use_id: tool_use_id.into(),
      content: content.into(),
      is_error: true,
    }
  }
}

/// A single turn in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub role: Role,
  pub content: Vec<ContentBlock>,
}

impl Message {
  /// User turn carrying plain text.
  pub fn user(text: impl Into<String>) -> Self {
    Self {
      role: Role::User,
      content: vec![ContentBlock::text(text)],
    }
  }

  /// User turn carrying tool results.
  pub fn tool_results(results: Vec<ContentBlock>) -> Self {
    Self {
      role: Role::User,
      content: results,
    }
  }

  /// Assistant turn with optional text followed by tool calls in order.
  pub fn assistant(text: Option<String>, tool_calls: Vec<ContentBlock>) -> Self {
    let mut content = Vec::with_capacity(tool_calls.len() + 1);
    if let Some(text) = text.filter(|t| !t.is_empty()) {
      content.push(ContentBlock::Text { text });
    }
    content.extend(tool_calls);
    Self {
      role: Role::Assistant,
      content,
    }
  }

  /// Concatenated text blocks.
  pub fn text(&self) -> String {
    self
      .content
      .iter()
      .filter_map(|block| match block {
        ContentBlock::Text { text } => Some(text.as_str()),
        _ => None,
      })
      .collect()
  }

  pub fn has_tool_use(&self) -> bool {
    self
      .content
      .iter()
      .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
  }

  /// Ids of tool results in block order.
  pub fn tool_result_ids(&self) -> Vec<&str> {
    self
      .content
      .iter()
      .filter_map(|block| match block {
        ContentBlock::ToolResult { tool_use_id, .. } => Some(tool_use_id.as_str()),
        _ => None,
      })
      .collect()
  }
}
