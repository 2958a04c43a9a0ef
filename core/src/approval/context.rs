//! Per-session trust state.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::patterns::glob_matches;

/// Tools and patterns a session has approved.
#[derive(Debug, Clone, Default)]
pub struct SessionApprovalState {
  /// Tools approved for every invocation
  pub trusted_tools: HashSet<String>,

  /// Tool name to trusted glob patterns
  pub trusted_patterns: HashMap<String, BTreeSet<String>>,
}

impl SessionApprovalState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Whether a (non-dangerous) invocation is already trusted.
  pub fn is_trusted(&self, tool_name: &str, subject: &str) -> bool {
    if self.trusted_tools.contains(tool_name) {
      return true;
    }
    self
      .trusted_patterns
      .get(tool_name)
      .is_some_and(|patterns| patterns.iter().any(|p| glob_matches(p, subject)))
  }

  pub fn trust_tool(&mut self, tool_name: &str) {
    self.trusted_tools.insert(tool_name.to_string());
  }

  pub fn trust_pattern(&mut self, tool_name: &str, pattern: &str) {
    self
      .trusted_patterns
      .entry(tool_name.to_string())
      .or_default()
      .insert(pattern.to_string());
  }
}
