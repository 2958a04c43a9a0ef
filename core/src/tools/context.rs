use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

use turnstile_protocol::{EventMsg, ToolProgressEvent};

use crate::event::EventSink;
use crate::session::{FileNote, Todo};

/// Invocation payload passed to a tool handler.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
  pub id: String,
  pub name: String,
  pub input: Value,
}

impl ToolInvocation {
  pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      input,
    }
  }

  pub fn parse_arguments<T: DeserializeOwned>(&self) -> Result<T, FunctionCallError> {
    serde_json::from_value(self.input.clone()).map_err(|e| {
      FunctionCallError::InvalidArguments(format!("invalid arguments for {}: {e}", self.name))
    })
  }
}

/// Change to session middleware state requested by a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
  /// Replace the todo list
  Todos(Vec<Todo>),
  /// Record what happened to a file
  FileNote { path: PathBuf, note: FileNote },
}

/// Standard output from a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
  pub content: String,
  pub is_error: bool,
  pub state_updates: Vec<StateUpdate>,
}

impl ToolOutput {
  pub fn success(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      is_error: false,
      state_updates: Vec::new(),
    }
  }

  pub fn error(content: impl Into<String>) -> Self {
    Self {
      content: content.into(),
      is_error: true,
      state_updates: Vec::new(),
    }
  }

  pub fn with_update(mut self, update: StateUpdate) -> Self {
    self.state_updates.push(update);
    self
  }
}

/// Shared tool runtime context.
#[derive(Debug, Clone)]
pub struct ToolContext {
  pub session_id: String,
  pub call_id: String,
  /// Base for relative paths
  pub cwd: PathBuf,
  pub events: EventSink,
}

impl ToolContext {
  pub fn new(session_id: impl Into<String>, call_id: impl Into<String>, cwd: PathBuf) -> Self {
    Self {
      session_id: session_id.into(),
      call_id: call_id.into(),
      cwd,
      events: EventSink::disabled(),
    }
  }

  pub fn with_events(mut self, events: EventSink) -> Self {
    self.events = events;
    self
  }

  /// Resolve a tool-supplied path against the working directory.
  pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.cwd.join(path)
    }
  }

  /// Report progress of the running call to the caller.
  pub async fn progress(&self, message: impl Into<String>) {
    self
      .events
      .send(EventMsg::ToolProgress(ToolProgressEvent {
        call_id: self.call_id.clone(),
        message: message.into(),
      }))
      .await;
  }
}

/// Tool invocation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FunctionCallError {
  #[error("{0}")]
  InvalidArguments(String),
  #[error("Unknown tool: {0}")]
  ToolNotFound(String),
  #[error("{0}")]
  Execution(String),
  #[error("Tool call timed out after {0} ms")]
  Timeout(u64),
}
