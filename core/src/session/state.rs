// Session State
use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use turnstile_protocol::{ContextUsage, Message};

use crate::tools::context::StateUpdate;

/// Todo item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
  Pending,
  InProgress,
  Completed,
}

/// Todo item tracked for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
  pub content: String,
  pub status: TodoStatus,
}

/// Last thing done to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
  Read,
  Written,
  Edited,
}

/// Per-path note recorded by the file tools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNote {
  pub action: FileAction,
  /// Lines in the file after the action
  pub lines: usize,
  pub updated_at: DateTime<Utc>,
}

/// Mutable session state, owned by the orchestrator while live
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
  pub session_id: String,
  /// Ordered history; append-only during a turn
  pub messages: Vec<Message>,
  pub todos: Vec<Todo>,
  pub files: BTreeMap<PathBuf, FileNote>,
  /// Last-known token accounting, replaced wholesale
  pub context_usage: ContextUsage,
  /// Ids of this session's checkpoints, newest first; the snapshots
  /// themselves stay in the checkpoint store
  pub checkpoints: Vec<String>,
}

impl SessionState {
  /// Create an empty session
  pub fn new(session_id: impl Into<String>) -> Self {
    Self {
      session_id: session_id.into(),
      messages: Vec::new(),
      todos: Vec::new(),
      files: BTreeMap::new(),
      context_usage: ContextUsage::default(),
      checkpoints: Vec::new(),
    }
  }

  /// Independent copy of everything except the checkpoint collection,
  /// which is always empty so snapshots never nest.
  pub fn snapshot(&self) -> SessionState {
    SessionState {
      session_id: self.session_id.clone(),
      messages: self.messages.clone(),
      todos: self.todos.clone(),
      files: self.files.clone(),
      context_usage: self.context_usage.clone(),
      checkpoints: Vec::new(),
    }
  }

  /// Apply a change requested by a tool.
  pub fn apply_update(&mut self, update: StateUpdate) {
    match update {
      StateUpdate::Todos(todos) => self.todos = todos,
      StateUpdate::FileNote { path, note } => {
        self.files.insert(path, note);
      }
    }
  }

  /// Text of the most recent user turn that carries text.
  pub fn last_user_text(&self) -> Option<String> {
    self
      .messages
      .iter()
      .rev()
      .filter(|message| message.role == turnstile_protocol::Role::User)
      .map(Message::text)
      .find(|text| !text.is_empty())
  }
}
