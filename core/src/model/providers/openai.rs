//! OpenAI-compatible Provider
//!
//! Speaks the `chat/completions` streaming API, which OpenAI and most local
//! inference servers (Ollama, LM Studio, vLLM) expose.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use turnstile_protocol::{ContentBlock, Message, Role};

use super::super::error::{ModelError, Result};
use super::super::provider::{ModelProvider, check_status};
use super::super::streaming::{ChatChunkParser, StreamingProcessor};
use super::super::types::{ModelRequest, ResponseStream};
use super::create_client;

/// Default public endpoint
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible provider
pub struct OpenAiCompatibleProvider {
  client: Client,
  api_key: Option<String>,
  base_url: String,
}

impl OpenAiCompatibleProvider {
  /// Create a new provider. A missing key is allowed for local servers.
  pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
    Self {
      client: create_client(None),
      api_key,
      base_url: base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
    }
  }

  /// Get the API endpoint URL
  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.base_url.trim_end_matches('/'), path)
  }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
  fn provider_id(&self) -> &'static str {
    "openai"
  }

  async fn stream(&self, request: ModelRequest) -> Result<ResponseStream> {
    let url = self.endpoint("chat/completions");
    let body = build_chat_request(&request);
    debug!(url = %url, model = %request.model, messages = request.messages.len(), "sending chat request");

    let mut builder = self
      .client
      .post(&url)
      .header("Content-Type", "application/json")
      .json(&body);
    if let Some(key) = &self.api_key {
      builder = builder.bearer_auth(key);
    }

    let response = check_status(builder.send().await?).await?;
    Ok(create_response_stream(response))
  }
}

/// Build the `chat/completions` request body.
pub fn build_chat_request(request: &ModelRequest) -> Value {
  let mut messages = Vec::with_capacity(request.messages.len() + 1);
  if !request.system_prompt.is_empty() {
    messages.push(json!({ "role": "system", "content": request.system_prompt }));
  }
  for message in &request.messages {
    messages.extend(to_chat_messages(message));
  }

  let mut body = json!({
    "model": request.model,
    "messages": messages,
    "stream": true,
    "stream_options": { "include_usage": true },
  });

  if !request.tools.is_empty() {
    body["tools"] = request
      .tools
      .iter()
      .map(|tool| {
        json!({
          "type": "function",
          "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
          }
        })
      })
      .collect();
  }
  if let Some(temperature) = request.temperature {
    body["temperature"] = json!(temperature);
  }
  if let Some(max_tokens) = request.max_tokens {
    body["max_tokens"] = json!(max_tokens);
  }
  body
}

/// One turn may expand into several chat messages: tool results travel as
/// separate `tool` role messages.
fn to_chat_messages(message: &Message) -> Vec<Value> {
  match message.role {
    Role::Assistant => {
      let text = message.text();
      let tool_calls: Vec<Value> = message
        .content
        .iter()
        .filter_map(|block| match block {
          ContentBlock::ToolUse { id, name, input } => Some(json!({
            "id": id,
            "type": "function",
            "function": { "name": name, "arguments": tool_arguments(input) },
          })),
          _ => None,
        })
        .collect();

      let mut value = json!({
        "role": "assistant",
        "content": if text.is_empty() { Value::Null } else { Value::String(text) },
      });
      if !tool_calls.is_empty() {
        value["tool_calls"] = Value::Array(tool_calls);
      }
      vec![value]
    }
    Role::User => {
      let mut out = Vec::new();
      for block in &message.content {
        if let ContentBlock::ToolResult {
          tool_use_id,
          content,
          ..
        } = block
        {
          out.push(json!({ "role": "tool", "tool_call_id": tool_use_id, "content": content }));
        }
      }
      let text = message.text();
      if !text.is_empty() {
        out.push(json!({ "role": "user", "content": text }));
      }
      out
    }
  }
}

fn tool_arguments(input: &Value) -> String {
  match input {
    Value::String(raw) => raw.clone(),
    other => other.to_string(),
  }
}

/// Wrap an HTTP response body as a stream of response events.
pub fn create_response_stream(response: reqwest::Response) -> ResponseStream {
  Box::pin(async_stream::stream! {
    let mut stream = response.bytes_stream();
    let mut processor = StreamingProcessor::new();
    let mut parser = ChatChunkParser::new();

    while let Some(item) = stream.next().await {
      match item {
        Ok(bytes) => {
          for payload in processor.push_bytes(&bytes) {
            for event in parser.push(payload) {
              yield Ok(event);
            }
          }
        }
        Err(e) => {
          yield Err(ModelError::StreamError(e.to_string()));
          return;
        }
      }
    }

    for payload in processor.finish() {
      for event in parser.push(payload) {
        yield Ok(event);
      }
    }
    for event in parser.finish() {
      yield Ok(event);
    }
  })
}
