// Token accounting items

use serde::{Deserialize, Serialize};

/// Token usage reported by a model provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
  pub input_tokens: u64,
  pub output_tokens: u64,
}

impl TokenUsage {
  pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
    Self {
      input_tokens,
      output_tokens,
    }
  }

  pub fn total(&self) -> u64 {
    self.input_tokens + self.output_tokens
  }
}

/// Context window accounting for a session, replaced wholesale on every update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextUsage {
  pub input_tokens: u64,
  pub output_tokens: u64,
  pub total_tokens: u64,
  pub percentage: f64,
  pub warning: bool,
  pub at_soft_limit: bool,
}
