// Sub-agent runner
use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use turnstile_protocol::{Message, prompts::SUB_AGENT_PROMPT};

use crate::event::EventSink;
use crate::model::ModelClient;
use crate::session::SessionState;
use crate::tools::registry::ToolRegistry;

use super::executor::{TurnConfig, TurnError, TurnExecutor};

/// Runs a delegated task in a fresh, throwaway session.
pub struct SubAgentRunner {
  client: Arc<ModelClient>,
  tools: Arc<ToolRegistry>,
  max_iterations: usize,
}

impl SubAgentRunner {
  /// `tools` should only hold read-only tools; nothing here asks for approval.
  pub fn new(client: Arc<ModelClient>, tools: Arc<ToolRegistry>, max_iterations: usize) -> Self {
    Self {
      client,
      tools,
      max_iterations,
    }
  }

  pub fn tools(&self) -> &ToolRegistry {
    &self.tools
  }

  /// Run `task` to completion and return the final assistant text.
  pub async fn run(
    &self,
    parent_session: &str,
    call_id: &str,
    task: &str,
    cwd: PathBuf,
  ) -> Result<String, TurnError> {
    let mut state = SessionState::new(format!("{parent_session}/{call_id}"));
    state.messages.push(Message::user(task));

    let executor = TurnExecutor::new(
      Arc::clone(&self.client),
      Arc::clone(&self.tools),
      EventSink::disabled(),
      TurnConfig {
        max_iterations: self.max_iterations,
        system_prompt: SUB_AGENT_PROMPT.trim().to_string(),
        cwd,
      },
    );
    let outcome = executor.run(&mut state, &CancellationToken::new()).await?;
    info!(
      parent_session,
      iterations = outcome.iterations,
      stop_reason = ?outcome.stop_reason,
      "sub-agent finished"
    );

    Ok(
      state
        .messages
        .last()
        .map(Message::text)
        .unwrap_or_default(),
    )
  }
}
