// Turnstile Protocol Layer
// Core protocol definitions

mod approval;
mod items;
mod messages;
mod models;

pub use approval::{ApprovalDecision, ApprovalRequest, ApprovalResponse};
pub use items::{ContextUsage, TokenUsage};
pub use messages::{ContentBlock, Message, Role};
pub use models::{
  ContentDeltaEvent, ResponseErrorEvent, ResponseEvent, ToolCallInputDeltaEvent,
  ToolCallStartEvent,
};

use serde::{Deserialize, Serialize};

/// Notifications emitted by the core while a session is being driven.
///
/// Consumers receive these in order, at most once each, per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventMsg {
  /// Incremental assistant text.
  Text(TextEvent),
  /// A checkpoint was captured before the turn ran.
  CheckpointCreated(CheckpointCreatedEvent),
  /// Descriptive metadata was attached to a checkpoint.
  CheckpointUpdated(CheckpointUpdatedEvent),
  /// Token accounting changed.
  ContextUpdate(ContextUsage),
  /// A tool call is waiting on a user decision.
  ApprovalRequired(ApprovalRequiredEvent),
  /// A pending approval was resolved (by the user or by timeout).
  ApprovalResult(ApprovalResultEvent),
  /// A tool call is about to run.
  ToolCallStarted(ToolCallStartedEvent),
  /// A tool call produced its result.
  ToolCallCompleted(ToolCallCompletedEvent),
  /// Free-form progress reported by a running tool.
  ToolProgress(ToolProgressEvent),
  /// The turn loop hit its iteration bound.
  IterationLimitReached(IterationLimitReachedEvent),
  /// The turn finished.
  TurnCompleted(TurnCompletedEvent),
  /// The turn failed.
  Error(ErrorEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEvent {
  pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointCreatedEvent {
  pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointUpdatedEvent {
  pub id: String,
  pub name: String,
  pub action_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequiredEvent {
  pub request: ApprovalRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalResultEvent {
  pub request_id: String,
  pub approved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallStartedEvent {
  pub call_id: String,
  pub tool_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallCompletedEvent {
  pub call_id: String,
  pub tool_name: String,
  pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolProgressEvent {
  pub call_id: String,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationLimitReachedEvent {
  pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnCompletedEvent {
  pub session_id: String,
  pub checkpoint_id: String,
  pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
  pub message: String,
}

impl EventMsg {
  pub fn text(content: impl Into<String>) -> Self {
    EventMsg::Text(TextEvent {
      content: content.into(),
    })
  }

  pub fn error(message: impl Into<String>) -> Self {
    EventMsg::Error(ErrorEvent {
      message: message.into(),
    })
  }
}
