// Context window accounting
use turnstile_config::ContextConfig;
use turnstile_protocol::{ContextUsage, TokenUsage};

/// Turns provider usage reports into [`ContextUsage`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContextTracker {
  window_tokens: u64,
  warning_threshold: f64,
  soft_limit_threshold: f64,
}

impl ContextTracker {
  pub fn new(config: &ContextConfig) -> Self {
    Self {
      window_tokens: config.window_tokens.max(1),
      warning_threshold: config.warning_threshold,
      soft_limit_threshold: config.soft_limit_threshold,
    }
  }

  pub fn window_tokens(&self) -> u64 {
    self.window_tokens
  }

  pub fn usage(&self, usage: TokenUsage) -> ContextUsage {
    let total_tokens = usage.total();
    let fraction = total_tokens as f64 / self.window_tokens as f64;
    ContextUsage {
      input_tokens: usage.input_tokens,
      output_tokens: usage.output_tokens,
      total_tokens,
      percentage: fraction * 100.0,
      warning: fraction >= self.warning_threshold,
      at_soft_limit: fraction >= self.soft_limit_threshold,
    }
  }
}

impl Default for ContextTracker {
  fn default() -> Self {
    Self::new(&ContextConfig::default())
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn tracker(window_tokens: u64) -> ContextTracker {
    ContextTracker::new(&ContextConfig {
      window_tokens,
      ..ContextConfig::default()
    })
  }

  #[test]
  fn computes_totals_and_percentage() {
    let usage = tracker(1_000).usage(TokenUsage::new(300, 200));
    assert_eq!(usage.total_tokens, 500);
    assert_eq!(usage.percentage, 50.0);
    assert!(!usage.warning);
    assert!(!usage.at_soft_limit);
  }

  #[test]
  fn thresholds_are_inclusive() {
    let tracker = tracker(1_000);
    let warn = tracker.usage(TokenUsage::new(800, 0));
    assert!(warn.warning);
    assert!(!warn.at_soft_limit);

    let soft = tracker.usage(TokenUsage::new(850, 50));
    assert!(soft.warning);
    assert!(soft.at_soft_limit);
  }
}
