//! SSE parsing for chat-completions style streams.
//!
//! [`StreamingProcessor`] splits raw bytes into `data:` payloads and
//! [`ChatChunkParser`] maps each payload onto the [`ResponseEvent`] taxonomy.

use serde_json::Value;

use turnstile_protocol::{ResponseErrorEvent, ResponseEvent, TokenUsage};

/// Payload of one SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SsePayload {
  /// JSON (or otherwise opaque) `data:` body
  Data(String),
  /// `data: [DONE]`
  Done,
}

/// Stateful SSE frame splitter.
///
/// Bytes are buffered until a frame is complete, so a multi-byte character
/// split across network chunks decodes intact.
#[derive(Debug, Default)]
pub struct StreamingProcessor {
  buffer: Vec<u8>,
}

impl StreamingProcessor {
  pub fn new() -> Self {
    Self::default()
  }

  /// Feeds one network chunk and returns the payloads of completed events.
  pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<SsePayload> {
    self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
    let mut payloads = Vec::new();
    while let Some(idx) = find_frame_end(&self.buffer) {
      let frame: Vec<u8> = self.buffer.drain(..idx + 2).collect();
      payloads.extend(parse_event(&String::from_utf8_lossy(&frame)));
    }
    payloads
  }

  /// Flushes the remaining buffer.
  pub fn finish(&mut self) -> Vec<SsePayload> {
    let remaining = std::mem::take(&mut self.buffer);
    let remaining = String::from_utf8_lossy(&remaining);
    if remaining.trim().is_empty() {
      return Vec::new();
    }
    parse_event(&remaining)
  }
}

fn find_frame_end(buffer: &[u8]) -> Option<usize> {
  buffer.windows(2).position(|pair| pair == b"\n\n")
}

fn parse_event(raw: &str) -> Vec<SsePayload> {
  raw
    .lines()
    .filter_map(|line| line.strip_prefix("data:"))
    .map(str::trim)
    .filter(|payload| !payload.is_empty())
    .map(|payload| {
      if payload == "[DONE]" {
        SsePayload::Done
      } else {
        SsePayload::Data(payload.to_string())
      }
    })
    .collect()
}

/// Translates chat-completion chunks into response events.
///
/// Tool calls arrive keyed by `index`; a call's block is closed when the next
/// index opens, when the choice finishes, or when the stream ends.
#[derive(Debug, Default)]
pub struct ChatChunkParser {
  open_tool_index: Option<u64>,
  finished: bool,
}

impl ChatChunkParser {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, payload: SsePayload) -> Vec<ResponseEvent> {
    match payload {
      SsePayload::Done => self.finish(),
      SsePayload::Data(data) => match serde_json::from_str::<Value>(&data) {
        Ok(value) => self.push_value(&value),
        Err(err) => vec![ResponseEvent::Error(ResponseErrorEvent {
          message: format!("invalid stream chunk: {err}"),
        })],
      },
    }
  }

  /// Closes any open block and ends the stream. Idempotent.
  pub fn finish(&mut self) -> Vec<ResponseEvent> {
    if self.finished {
      return Vec::new();
    }
    self.finished = true;
    let mut events = self.close_tool_block();
    events.push(ResponseEvent::StreamEnd);
    events
  }

  fn push_value(&mut self, value: &Value) -> Vec<ResponseEvent> {
    let mut events = Vec::new();

    if let Some(error) = value.get("error") {
      let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(|| error.to_string());
      events.push(ResponseEvent::Error(ResponseErrorEvent { message }));
      return events;
    }

    let choices = value
      .get("choices")
      .and_then(Value::as_array)
      .map(Vec::as_slice)
      .unwrap_or_default();

    for choice in choices {
      let Some(delta) = choice.get("delta") else {
        continue;
      };

      if let Some(text) = delta.get("content").and_then(Value::as_str) {
        if !text.is_empty() {
          events.push(ResponseEvent::text(text));
        }
      }

      let tool_calls = delta
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
      for call in tool_calls {
        let index = call.get("index").and_then(Value::as_u64).unwrap_or(0);
        if self.open_tool_index != Some(index) {
          events.extend(self.close_tool_block());
          let id = call
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
          let name = call
            .pointer("/function/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
          events.push(ResponseEvent::tool_call_start(id, name));
          self.open_tool_index = Some(index);
        }
        if let Some(arguments) = call.pointer("/function/arguments").and_then(Value::as_str) {
          if !arguments.is_empty() {
            events.push(ResponseEvent::tool_input(arguments));
          }
        }
      }

      if choice
        .get("finish_reason")
        .is_some_and(|reason| !reason.is_null())
      {
        events.extend(self.close_tool_block());
      }
    }

    if let Some(usage) = value.get("usage").and_then(parse_usage) {
      events.push(ResponseEvent::Usage(usage));
    }

    events
  }

  fn close_tool_block(&mut self) -> Vec<ResponseEvent> {
    match self.open_tool_index.take() {
      Some(_) => vec![ResponseEvent::BlockEnd],
      None => Vec::new(),
    }
  }
}

fn parse_usage(value: &Value) -> Option<TokenUsage> {
  if value.is_null() {
    return None;
  }
  let input = value
    .get("prompt_tokens")
    .or_else(|| value.get("input_tokens"))
    .and_then(Value::as_u64)?;
  let output = value
    .get("completion_tokens")
    .or_else(|| value.get("output_tokens"))
    .and_then(Value::as_u64)
    .unwrap_or(0);
  Some(TokenUsage::new(input, output))
}
