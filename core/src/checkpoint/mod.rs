//! Checkpoint store
//!
//! Point-in-time snapshots of session state with revert and fork. Every
//! stored state is an independent copy with an empty checkpoint collection,
//! and every state handed out is a fresh copy again, so no mutation on
//! either side is ever visible on the other.

pub mod naming;

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::session::SessionState;

pub use naming::{CheckpointName, CheckpointNamer, HeuristicNamer};

/// Immutable snapshot of a session
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
  pub id: String,
  pub timestamp: DateTime<Utc>,
  pub state: SessionState,
  pub name: Option<String>,
  pub action_summary: Option<String>,
}

/// In-memory checkpoint store, keyed by session id
#[derive(Default)]
pub struct CheckpointStore {
  /// Per-session checkpoints in insertion order
  sessions: RwLock<HashMap<String, Vec<Checkpoint>>>,
}

impl CheckpointStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Snapshot `state` and return the new checkpoint id.
  pub async fn create(&self, state: &SessionState) -> String {
    let checkpoint = Checkpoint {
      id: Uuid::new_v4().to_string(),
      timestamp: Utc::now(),
      state: state.snapshot(),
      name: None,
      action_summary: None,
    };
    let id = checkpoint.id.clone();
    debug!(session_id = %state.session_id, checkpoint_id = %id, "creating checkpoint");
    self
      .sessions
      .write()
      .await
      .entry(state.session_id.clone())
      .or_default()
      .push(checkpoint);
    id
  }

  pub async fn get(&self, session_id: &str, checkpoint_id: &str) -> Option<Checkpoint> {
    self
      .sessions
      .read()
      .await
      .get(session_id)?
      .iter()
      .find(|checkpoint| checkpoint.id == checkpoint_id)
      .cloned()
  }

  /// Attach descriptive metadata. Returns false if the checkpoint is absent.
  pub async fn update_metadata(
    &self,
    session_id: &str,
    checkpoint_id: &str,
    name: impl Into<String>,
    action_summary: Option<String>,
  ) -> bool {
    let mut sessions = self.sessions.write().await;
    let Some(checkpoint) = sessions
      .get_mut(session_id)
      .and_then(|list| list.iter_mut().find(|c| c.id == checkpoint_id))
    else {
      return false;
    };
    checkpoint.name = Some(name.into());
    checkpoint.action_summary = action_summary;
    true
  }

  /// All checkpoints of a session, newest first. Equal timestamps keep the
  /// most recently created first.
  pub async fn list(&self, session_id: &str) -> Vec<Checkpoint> {
    let sessions = self.sessions.read().await;
    sessions
      .get(session_id)
      .map(|list| newest_first(list).into_iter().cloned().collect())
      .unwrap_or_default()
  }

  /// Checkpoint ids of a session, in [`list`](Self::list) order.
  pub async fn ids(&self, session_id: &str) -> Vec<String> {
    let sessions = self.sessions.read().await;
    sessions
      .get(session_id)
      .map(|list| newest_first(list).into_iter().map(|c| c.id.clone()).collect())
      .unwrap_or_default()
  }

  /// Fresh copy of a stored state, with the session's current checkpoints.
  pub async fn revert(&self, session_id: &str, checkpoint_id: &str) -> Option<SessionState> {
    let checkpoint = self.get(session_id, checkpoint_id).await?;
    let mut state = checkpoint.state;
    state.checkpoints = self.ids(session_id).await;
    debug!(session_id, checkpoint_id, "reverted to checkpoint");
    Some(state)
  }

  /// Like [`revert`](Self::revert) but under `new_session_id`. The source
  /// session's history is copied to the new session so the fork keeps its
  /// lineage; the source itself is untouched.
  ///
  /// Returns `None` when `new_session_id` is the source or already has
  /// checkpoints of its own.
  pub async fn fork(
    &self,
    session_id: &str,
    checkpoint_id: &str,
    new_session_id: &str,
  ) -> Option<SessionState> {
    let checkpoint = self.get(session_id, checkpoint_id).await?;

    let mut sessions = self.sessions.write().await;
    if new_session_id == session_id || sessions.contains_key(new_session_id) {
      debug!(session_id, new_session_id, "fork target already exists");
      return None;
    }
    let inherited: Vec<Checkpoint> = sessions
      .get(session_id)
      .map(|list| {
        list
          .iter()
          .map(|c| {
            let mut copy = c.clone();
            copy.state.session_id = new_session_id.to_string();
            copy
          })
          .collect()
      })
      .unwrap_or_default();
    sessions.insert(new_session_id.to_string(), inherited);
    drop(sessions);

    let mut state = checkpoint.state;
    state.session_id = new_session_id.to_string();
    state.checkpoints = self.ids(new_session_id).await;
    debug!(session_id, checkpoint_id, new_session_id, "forked from checkpoint");
    Some(state)
  }

  /// Drop every checkpoint of a session
  pub async fn remove_session(&self, session_id: &str) {
    self.sessions.write().await.remove(session_id);
  }
}

fn newest_first(list: &[Checkpoint]) -> Vec<&Checkpoint> {
  let mut ordered: Vec<&Checkpoint> = list.iter().rev().collect();
  ordered.sort_by_key(|checkpoint| Reverse(checkpoint.timestamp));
  ordered
}
