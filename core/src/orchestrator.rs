//! Orchestrator
//!
//! Entry point for driving sessions: appends the user turn, checkpoints it,
//! runs hooks and the turn loop, and exposes revert, fork and approval
//! handling on top of the stores.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use turnstile_config::Config;
use turnstile_protocol::{
  ApprovalResponse, CheckpointCreatedEvent, CheckpointUpdatedEvent, EventMsg, Message,
  TurnCompletedEvent, prompts::SYSTEM_PROMPT,
};

use crate::approval::ApprovalGate;
use crate::checkpoint::{Checkpoint, CheckpointNamer, CheckpointStore, HeuristicNamer};
use crate::context::ContextTracker;
use crate::event::EventSink;
use crate::model::ModelClient;
use crate::session::{InMemorySessionStore, SessionHandle, SessionState, SessionStore};
use crate::tools::registry::ToolRegistry;
use crate::turn::{TurnConfig, TurnError, TurnExecutor, TurnHook, TurnOutcome};

/// Coordinates sessions, checkpoints, approvals and the turn loop.
pub struct Orchestrator {
  client: Arc<ModelClient>,
  tools: Arc<ToolRegistry>,
  sessions: Arc<dyn SessionStore>,
  checkpoints: Arc<CheckpointStore>,
  approval: Arc<ApprovalGate>,
  namer: Arc<dyn CheckpointNamer>,
  hooks: Vec<Arc<dyn TurnHook>>,
  context: ContextTracker,
  turn_config: TurnConfig,
}

impl Orchestrator {
  pub fn new(client: Arc<ModelClient>, tools: Arc<ToolRegistry>, config: &Config) -> Self {
    let system_prompt = config
      .agent
      .system_prompt
      .clone()
      .unwrap_or_else(|| SYSTEM_PROMPT.trim().to_string());
    Self {
      client,
      tools,
      sessions: Arc::new(InMemorySessionStore::new()),
      checkpoints: Arc::new(CheckpointStore::new()),
      approval: Arc::new(ApprovalGate::new(&config.approval)),
      namer: Arc::new(HeuristicNamer::default()),
      hooks: Vec::new(),
      context: ContextTracker::new(&config.context),
      turn_config: TurnConfig {
        max_iterations: config.agent.max_iterations,
        system_prompt,
        cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
      },
    }
  }

  /// Append a hook; hooks run in the order they were added.
  pub fn with_hook(mut self, hook: Arc<dyn TurnHook>) -> Self {
    self.hooks.push(hook);
    self
  }

  pub fn with_namer(mut self, namer: Arc<dyn CheckpointNamer>) -> Self {
    self.namer = namer;
    self
  }

  pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
    self.sessions = sessions;
    self
  }

  /// Working directory tools resolve relative paths against.
  pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
    self.turn_config.cwd = cwd.into();
    self
  }

  pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
    self.turn_config.max_iterations = max_iterations;
    self
  }

  pub fn with_approval_gate(mut self, gate: Arc<ApprovalGate>) -> Self {
    self.approval = gate;
    self
  }

  pub fn turn_config(&self) -> &TurnConfig {
    &self.turn_config
  }

  pub fn approval_gate(&self) -> &Arc<ApprovalGate> {
    &self.approval
  }

  /// Live state for `session_id`, created empty on first use.
  pub async fn get_or_create_state(&self, session_id: &str) -> SessionHandle {
    self.sessions.get_or_create(session_id).await
  }

  pub async fn session_ids(&self) -> Vec<String> {
    self.sessions.session_ids().await
  }

  /// Run one user turn to completion.
  pub async fn process_message(
    &self,
    session_id: &str,
    user_text: &str,
    events: EventSink,
  ) -> Result<TurnOutcome, TurnError> {
    self
      .process_message_cancellable(session_id, user_text, events, CancellationToken::new())
      .await
  }

  /// Like [`process_message`](Self::process_message), stopping with
  /// [`TurnError::Cancelled`] once `cancel` fires.
  ///
  /// The session stays locked for the whole turn, so concurrent calls for
  /// the same session run one after another.
  pub async fn process_message_cancellable(
    &self,
    session_id: &str,
    user_text: &str,
    events: EventSink,
    cancel: CancellationToken,
  ) -> Result<TurnOutcome, TurnError> {
    let handle = self.sessions.get_or_create(session_id).await;
    let mut state = handle.lock().await;

    state.messages.push(Message::user(user_text));
    let turn_start = state.messages.len();
    let checkpoint_id = self.checkpoints.create(&state).await;
    state.checkpoints.insert(0, checkpoint_id.clone());
    events
      .send(EventMsg::CheckpointCreated(CheckpointCreatedEvent {
        id: checkpoint_id.clone(),
      }))
      .await;
    info!(session_id, checkpoint_id = %checkpoint_id, "processing message");

    let outcome = match self.run_turn(&mut state, &events, &cancel).await {
      Ok(outcome) => outcome,
      Err(err) => {
        warn!(session_id, error = %err, "turn failed");
        events.send(EventMsg::error(err.to_string())).await;
        return Err(err);
      }
    };

    events
      .send(EventMsg::TurnCompleted(TurnCompletedEvent {
        session_id: session_id.to_string(),
        checkpoint_id: checkpoint_id.clone(),
        iterations: outcome.iterations,
      }))
      .await;

    self.spawn_naming(
      session_id,
      checkpoint_id,
      user_text,
      state.messages.get(turn_start..).unwrap_or_default().to_vec(),
      events,
    );
    Ok(outcome)
  }

  async fn run_turn(
    &self,
    state: &mut SessionState,
    events: &EventSink,
    cancel: &CancellationToken,
  ) -> Result<TurnOutcome, TurnError> {
    for hook in &self.hooks {
      hook.before_turn(state).await.map_err(|e| TurnError::Hook {
        name: hook.name().to_string(),
        message: format!("{e:#}"),
      })?;
    }

    let executor = TurnExecutor::new(
      Arc::clone(&self.client),
      Arc::clone(&self.tools),
      events.clone(),
      self.turn_config.clone(),
    )
    .with_approval(Arc::clone(&self.approval))
    .with_context_tracker(self.context.clone());
    let outcome = executor.run(state, cancel).await?;

    for hook in &self.hooks {
      hook.after_turn(state).await.map_err(|e| TurnError::Hook {
        name: hook.name().to_string(),
        message: format!("{e:#}"),
      })?;
    }
    Ok(outcome)
  }

  /// Name the checkpoint in the background; the turn result never waits on it.
  fn spawn_naming(
    &self,
    session_id: &str,
    checkpoint_id: String,
    user_text: &str,
    turn: Vec<Message>,
    events: EventSink,
  ) {
    let namer = Arc::clone(&self.namer);
    let checkpoints = Arc::clone(&self.checkpoints);
    let session_id = session_id.to_string();
    let user_text = user_text.to_string();
    tokio::spawn(async move {
      let named = match namer.name_checkpoint(&user_text, &turn).await {
        Ok(named) => named,
        Err(err) => {
          warn!(session_id = %session_id, error = %err, "checkpoint naming failed");
          return;
        }
      };
      let updated = checkpoints
        .update_metadata(
          &session_id,
          &checkpoint_id,
          named.name.clone(),
          named.action_summary.clone(),
        )
        .await;
      if updated {
        events
          .send(EventMsg::CheckpointUpdated(CheckpointUpdatedEvent {
            id: checkpoint_id,
            name: named.name,
            action_summary: named.action_summary,
          }))
          .await;
      }
    });
  }

  /// Replace the live state with the checkpoint's. False when the
  /// checkpoint does not exist.
  pub async fn revert_to_checkpoint(&self, session_id: &str, checkpoint_id: &str) -> bool {
    let Some(state) = self.checkpoints.revert(session_id, checkpoint_id).await else {
      return false;
    };
    self.sessions.install(state).await;
    info!(session_id, checkpoint_id, "session reverted");
    true
  }

  /// Start `new_session_id` from the checkpoint's state. The source session
  /// is left as it is. False when the checkpoint does not exist or
  /// `new_session_id` is already in use.
  pub async fn fork_from_checkpoint(
    &self,
    session_id: &str,
    checkpoint_id: &str,
    new_session_id: &str,
  ) -> bool {
    if self.sessions.get(new_session_id).await.is_some() {
      return false;
    }
    let Some(state) = self
      .checkpoints
      .fork(session_id, checkpoint_id, new_session_id)
      .await
    else {
      return false;
    };
    self.sessions.install(state).await;
    info!(session_id, checkpoint_id, new_session_id, "session forked");
    true
  }

  /// Checkpoints of a session, newest first.
  pub async fn list_checkpoints(&self, session_id: &str) -> Vec<Checkpoint> {
    self.checkpoints.list(session_id).await
  }

  pub async fn handle_approval_response(&self, response: ApprovalResponse) -> bool {
    self.approval.handle_response(response).await
  }

  /// Forget everything about a session.
  pub async fn discard_session(&self, session_id: &str) {
    self.sessions.remove(session_id).await;
    self.checkpoints.remove_session(session_id).await;
    self.approval.clear_session(session_id).await;
    info!(session_id, "session discarded");
  }
}
