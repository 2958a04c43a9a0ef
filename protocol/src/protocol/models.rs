use serde::{Deserialize, Serialize};

use super::items::TokenUsage;

/// Streamed model response items.
///
/// Providers translate their own framing into this taxonomy; the core never
/// looks past it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResponseEvent {
  /// Incremental assistant text chunk.
  ContentDelta(ContentDeltaEvent),
  /// The model opened a tool call block.
  ToolCallStart(ToolCallStartEvent),
  /// A fragment of the open tool call's JSON input.
  ToolCallInputDelta(ToolCallInputDeltaEvent),
  /// The current content block is closed.
  BlockEnd,
  /// Token accounting reported mid-stream.
  Usage(TokenUsage),
  /// Current model response is complete.
  StreamEnd,
  /// Provider emitted an error event.
  Error(ResponseErrorEvent),
}

/// Text delta emitted by model streaming.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentDeltaEvent {
  pub text: String,
}

/// Start of a tool call block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallStartEvent {
  pub id: String,
  pub name: String,
}

/// Partial JSON input for the open tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallInputDeltaEvent {
  pub partial_json: String,
}

/// Provider-side error event in responses stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseErrorEvent {
  pub message: String,
}

impl ResponseEvent {
  pub fn text(text: impl Into<String>) -> Self {
    ResponseEvent::ContentDelta(ContentDeltaEvent { text: text.into() })
  }

  pub fn tool_call_start(id: impl Into<String>, name: impl Into<String>) -> Self {
    ResponseEvent::ToolCallStart(ToolCallStartEvent {
      id: id.into(),
      name: name.into(),
    })
  }

  pub fn tool_input(partial_json: impl Into<String>) -> Self {
    ResponseEvent::ToolCallInputDelta(ToolCallInputDeltaEvent {
      partial_json: partial_json.into(),
    })
  }
}
