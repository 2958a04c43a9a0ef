//! Folds a streamed model response into text and tool calls.

use serde_json::Value;
use tracing::warn;

use turnstile_protocol::{ContentBlock, ResponseEvent, TokenUsage};

/// A tool call requested by the model, with its input resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
  pub id: String,
  pub name: String,
  /// Parsed input, or the raw text when it was not valid JSON
  pub input: Value,
  /// Set when the input could not be parsed
  pub input_error: Option<String>,
}

impl ToolCallRequest {
  pub fn to_block(&self) -> ContentBlock {
    ContentBlock::ToolUse {
      id: self.id.clone(),
      name: self.name.clone(),
      input: self.input.clone(),
    }
  }
}

/// Everything one model call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
  pub text: String,
  pub tool_calls: Vec<ToolCallRequest>,
  pub usage: Option<TokenUsage>,
}

/// What the caller should do with an applied event.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
  /// New text to relay
  Text(String),
  /// Token accounting to forward
  Usage(TokenUsage),
  /// Nothing to relay
  Continue,
  /// The response is complete
  End,
}

#[derive(Debug)]
struct OpenCall {
  id: String,
  name: String,
  buffer: String,
}

#[derive(Debug, Default)]
pub struct ResponseAccumulator {
  text: String,
  open: Option<OpenCall>,
  calls: Vec<ToolCallRequest>,
  usage: Option<TokenUsage>,
}

impl ResponseAccumulator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Apply one event. Provider error events come back as `Err`.
  pub fn apply(&mut self, event: ResponseEvent) -> Result<Applied, String> {
    match event {
      ResponseEvent::ContentDelta(delta) => {
        if delta.text.is_empty() {
          return Ok(Applied::Continue);
        }
        self.text.push_str(&delta.text);
        Ok(Applied::Text(delta.text))
      }
      ResponseEvent::ToolCallStart(start) => {
        self.close_open_call();
        let id = if start.id.is_empty() {
          format!("call_{}", self.calls.len())
        } else {
          start.id
        };
        self.open = Some(OpenCall {
          id,
          name: start.name,
          buffer: String::new(),
        });
        Ok(Applied::Continue)
      }
      ResponseEvent::ToolCallInputDelta(delta) => {
        match &mut self.open {
          Some(call) => call.buffer.push_str(&delta.partial_json),
          None => warn!("tool input delta without an open tool call"),
        }
        Ok(Applied::Continue)
      }
      ResponseEvent::BlockEnd => {
        self.close_open_call();
        Ok(Applied::Continue)
      }
      ResponseEvent::Usage(usage) => {
        self.usage = Some(usage);
        Ok(Applied::Usage(usage))
      }
      ResponseEvent::StreamEnd => Ok(Applied::End),
      ResponseEvent::Error(err) => Err(err.message),
    }
  }

  pub fn finish(mut self) -> ModelResponse {
    self.close_open_call();
    ModelResponse {
      text: self.text,
      tool_calls: self.calls,
      usage: self.usage,
    }
  }

  fn close_open_call(&mut self) {
    let Some(call) = self.open.take() else {
      return;
    };
    let raw = call.buffer.trim();
    let (input, input_error) = if raw.is_empty() {
      (Value::Object(Default::default()), None)
    } else {
      match serde_json::from_str::<Value>(raw) {
        Ok(value) => (value, None),
        Err(e) => (
          Value::String(raw.to_string()),
          Some(format!("invalid JSON input: {e}")),
        ),
      }
    };
    self.calls.push(ToolCallRequest {
      id: call.id,
      name: call.name,
      input,
      input_error,
    });
  }
}
