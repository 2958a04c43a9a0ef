// Checkpoint naming
use async_trait::async_trait;

use turnstile_protocol::{ContentBlock, Message};

/// Descriptive metadata for a checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointName {
  pub name: String,
  pub action_summary: Option<String>,
}

/// Produces a name for the checkpoint taken before a turn, once the turn is over.
#[async_trait]
pub trait CheckpointNamer: Send + Sync {
  /// `turn` holds the messages the turn appended after the user message.
  async fn name_checkpoint(
    &self,
    user_text: &str,
    turn: &[Message],
  ) -> anyhow::Result<CheckpointName>;
}

const MAX_NAME_CHARS: usize = 60;

/// Names checkpoints from the user's words and the tools the turn used.
#[derive(Debug, Clone)]
pub struct HeuristicNamer {
  max_words: usize,
}

impl HeuristicNamer {
  pub fn new(max_words: usize) -> Self {
    Self { max_words }
  }
}

impl Default for HeuristicNamer {
  fn default() -> Self {
    Self::new(6)
  }
}

#[async_trait]
impl CheckpointNamer for HeuristicNamer {
  async fn name_checkpoint(
    &self,
    user_text: &str,
    turn: &[Message],
  ) -> anyhow::Result<CheckpointName> {
    Ok(CheckpointName {
      name: short_name(user_text, self.max_words),
      action_summary: Some(summarize_actions(turn)),
    })
  }
}

fn short_name(text: &str, max_words: usize) -> String {
  let words: Vec<&str> = text.split_whitespace().collect();
  if words.is_empty() {
    return "Untitled turn".to_string();
  }
  let mut name = words[..words.len().min(max_words)].join(" ");
  let truncated = words.len() > max_words || name.chars().count() > MAX_NAME_CHARS;
  if name.chars().count() > MAX_NAME_CHARS {
    name = name.chars().take(MAX_NAME_CHARS).collect();
  }
  if truncated {
    name.push_str("...");
  }
  name
}

fn summarize_actions(turn: &[Message]) -> String {
  let mut tools: Vec<&str> = Vec::new();
  for block in turn.iter().flat_map(|message| &message.content) {
    if let ContentBlock::ToolUse { name, .. } = block {
      if !tools.contains(&name.as_str()) {
        tools.push(name);
      }
    }
  }
  if tools.is_empty() {
    "Replied without tools".to_string()
  } else {
    format!("Used {}", tools.join(", "))
  }
}
