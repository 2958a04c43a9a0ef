// Approval Types
// Requests raised by the approval gate and the user's answers to them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation waiting on a user decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
  pub request_id: String,
  pub session_id: String,
  pub tool_name: String,
  pub tool_input: Value,
  /// Human-readable rendering of the invocation
  pub summary: String,
  /// Matched one of the dangerous-command patterns
  pub is_dangerous: bool,
  pub timestamp: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub suggested_pattern: Option<String>,
}

/// User decision for a pending approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
  /// Run this invocation only
  AllowOnce,
  /// Run it and trust the supplied glob pattern for this tool
  AllowPattern,
  /// Run it and trust the tool for the rest of the session
  AllowTool,
  Deny,
}

/// Answer to an [`ApprovalRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResponse {
  pub request_id: String,
  pub decision: ApprovalDecision,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pattern: Option<String>,
}

impl ApprovalResponse {
  pub fn new(request_id: impl Into<String>, decision: ApprovalDecision) -> Self {
    Self {
      request_id: request_id.into(),
      decision,
      pattern: None,
    }
  }

  pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
    self.pattern = Some(pattern.into());
    self
  }
}
