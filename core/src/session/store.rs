// Session Store
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::state::SessionState;

/// Shared handle to one session's live state.
///
/// Holding the lock is what serializes work on a session: a turn keeps it
/// for its whole duration.
pub type SessionHandle = Arc<Mutex<SessionState>>;

/// Keyed storage of live session state
#[async_trait]
pub trait SessionStore: Send + Sync {
  /// Existing handle, if any
  async fn get(&self, session_id: &str) -> Option<SessionHandle>;

  /// Existing handle, or a new empty session. Repeated calls return the same handle.
  async fn get_or_create(&self, session_id: &str) -> SessionHandle;

  /// Install `state` under its own session id, replacing any previous
  /// contents while keeping existing handles valid.
  async fn install(&self, state: SessionState) -> SessionHandle;

  /// Drop a session
  async fn remove(&self, session_id: &str) -> Option<SessionHandle>;

  /// All known session ids, sorted
  async fn session_ids(&self) -> Vec<String>;
}

/// In-process session store
#[derive(Default)]
pub struct InMemorySessionStore {
  sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
  async fn get(&self, session_id: &str) -> Option<SessionHandle> {
    self.sessions.read().await.get(session_id).cloned()
  }

  async fn get_or_create(&self, session_id: &str) -> SessionHandle {
    if let Some(handle) = self.get(session_id).await {
      return handle;
    }
    let mut sessions = self.sessions.write().await;
    sessions
      .entry(session_id.to_string())
      .or_insert_with(|| {
        debug!(session_id, "creating session");
        Arc::new(Mutex::new(SessionState::new(session_id)))
      })
      .clone()
  }

  async fn install(&self, state: SessionState) -> SessionHandle {
    let existing = self.get(&state.session_id).await;
    match existing {
      Some(handle) => {
        *handle.lock().await = state;
        handle
      }
      None => {
        let mut sessions = self.sessions.write().await;
        let session_id = state.session_id.clone();
        let handle = sessions
          .entry(session_id)
          .or_insert_with(|| Arc::new(Mutex::new(SessionState::new(""))))
          .clone();
        drop(sessions);
        *handle.lock().await = state;
        handle
      }
    }
  }

  async fn remove(&self, session_id: &str) -> Option<SessionHandle> {
    self.sessions.write().await.remove(session_id)
  }

  async fn session_ids(&self) -> Vec<String> {
    let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
    ids.sort();
    ids
  }
}
