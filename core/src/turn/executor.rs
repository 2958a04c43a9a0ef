// Turn Executor
use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use turnstile_protocol::{
  ApprovalRequiredEvent, ApprovalResultEvent, ContentBlock, EventMsg, IterationLimitReachedEvent,
  Message, ToolCallCompletedEvent, ToolCallStartedEvent,
};

use crate::approval::{ApprovalCheck, ApprovalGate};
use crate::context::ContextTracker;
use crate::event::EventSink;
use crate::model::{ModelClient, ModelError, ModelRequest};
use crate::session::SessionState;
use crate::tools::context::{ToolContext, ToolInvocation, ToolOutput};
use crate::tools::registry::ToolRegistry;

use super::accumulator::{Applied, ModelResponse, ResponseAccumulator, ToolCallRequest};

/// Assistant text recorded when a loop stops at its iteration bound.
pub const MAX_ITERATIONS_MESSAGE: &str = "max iterations reached";

/// Result text for a call the user refused.
pub const DENIED_MESSAGE: &str = "Tool call denied by user";

/// Turn configuration
#[derive(Debug, Clone)]
pub struct TurnConfig {
  /// Model calls allowed in one turn
  pub max_iterations: usize,
  pub system_prompt: String,
  /// Base for relative tool paths
  pub cwd: PathBuf,
}

/// Turn errors
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
  #[error("model error: {0}")]
  Model(#[from] ModelError),

  #[error("hook `{name}` failed: {message}")]
  Hook { name: String, message: String },

  #[error("turn cancelled")]
  Cancelled,
}

/// Why a turn stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
  /// The model answered without requesting tools
  Completed,
  /// The iteration bound was reached
  IterationLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
  /// Model calls made
  pub iterations: usize,
  pub stop_reason: StopReason,
}

enum LoopState {
  ModelCall,
  ExecuteTools(ModelResponse),
  Done(StopReason),
}

/// Drives one user turn: model call, tool execution, repeat.
pub struct TurnExecutor {
  client: Arc<ModelClient>,
  tools: Arc<ToolRegistry>,
  approval: Option<Arc<ApprovalGate>>,
  context: ContextTracker,
  events: EventSink,
  config: TurnConfig,
}

impl TurnExecutor {
  pub fn new(
    client: Arc<ModelClient>,
    tools: Arc<ToolRegistry>,
    events: EventSink,
    config: TurnConfig,
  ) -> Self {
    Self {
      client,
      tools,
      approval: None,
      context: ContextTracker::default(),
      events,
      config,
    }
  }

  /// Route tool calls through an approval gate.
  pub fn with_approval(mut self, gate: Arc<ApprovalGate>) -> Self {
    self.approval = Some(gate);
    self
  }

  pub fn with_context_tracker(mut self, tracker: ContextTracker) -> Self {
    self.context = tracker;
    self
  }

  /// Run the loop over `state` until the model stops asking for tools,
  /// the iteration bound is hit, or `cancel` fires.
  pub async fn run(
    &self,
    state: &mut SessionState,
    cancel: &CancellationToken,
  ) -> Result<TurnOutcome, TurnError> {
    let mut iterations = 0;
    let mut loop_state = LoopState::ModelCall;

    loop {
      loop_state = match loop_state {
        LoopState::ModelCall => {
          if iterations >= self.config.max_iterations {
            warn!(
              session_id = %state.session_id,
              iterations, "turn stopped at iteration limit"
            );
            state
              .messages
              .push(Message::assistant(Some(MAX_ITERATIONS_MESSAGE.to_string()), Vec::new()));
            self
              .events
              .send(EventMsg::IterationLimitReached(IterationLimitReachedEvent {
                iterations,
              }))
              .await;
            LoopState::Done(StopReason::IterationLimit)
          } else {
            if cancel.is_cancelled() {
              return Err(TurnError::Cancelled);
            }
            iterations += 1;
            let response = self.call_model(state, cancel).await?;
            if response.tool_calls.is_empty() {
              state
                .messages
                .push(Message::assistant(Some(response.text), Vec::new()));
              LoopState::Done(StopReason::Completed)
            } else {
              LoopState::ExecuteTools(response)
            }
          }
        }
        LoopState::ExecuteTools(response) => {
          let blocks = response.tool_calls.iter().map(ToolCallRequest::to_block).collect();
          state
            .messages
            .push(Message::assistant(Some(response.text), blocks));

          let mut results = Vec::with_capacity(response.tool_calls.len());
          for call in &response.tool_calls {
            results.push(self.execute_call(state, call).await);
          }
          state.messages.push(Message::tool_results(results));
          LoopState::ModelCall
        }
        LoopState::Done(stop_reason) => {
          info!(session_id = %state.session_id, iterations, ?stop_reason, "turn finished");
          return Ok(TurnOutcome {
            iterations,
            stop_reason,
          });
        }
      };
    }
  }

  async fn call_model(
    &self,
    state: &mut SessionState,
    cancel: &CancellationToken,
  ) -> Result<ModelResponse, TurnError> {
    let request = ModelRequest {
      model: self.client.model().to_string(),
      system_prompt: self.config.system_prompt.clone(),
      messages: state.messages.clone(),
      tools: self.tools.model_tools(),
      ..Default::default()
    };

    let mut stream = tokio::select! {
      _ = cancel.cancelled() => return Err(TurnError::Cancelled),
      stream = self.client.stream(request) => stream?,
    };

    let mut acc = ResponseAccumulator::new();
    loop {
      let event = tokio::select! {
        _ = cancel.cancelled() => return Err(TurnError::Cancelled),
        event = stream.next() => event,
      };
      let Some(event) = event else {
        break;
      };
      match acc.apply(event?) {
        Ok(Applied::Text(text)) => self.events.send(EventMsg::text(text)).await,
        Ok(Applied::Usage(usage)) => {
          state.context_usage = self.context.usage(usage);
          self
            .events
            .send(EventMsg::ContextUpdate(state.context_usage.clone()))
            .await;
        }
        Ok(Applied::Continue) => {}
        Ok(Applied::End) => break,
        Err(message) => return Err(ModelError::StreamError(message).into()),
      }
    }

    let response = acc.finish();
    debug!(
      session_id = %state.session_id,
      text_len = response.text.len(),
      tool_calls = response.tool_calls.len(),
      "model response complete"
    );
    Ok(response)
  }

  /// Run one tool call to a result block. Failures become error results.
  async fn execute_call(&self, state: &mut SessionState, call: &ToolCallRequest) -> ContentBlock {
    self
      .events
      .send(EventMsg::ToolCallStarted(ToolCallStartedEvent {
        call_id: call.id.clone(),
        tool_name: call.name.clone(),
      }))
      .await;

    let mut output = self.run_call(&state.session_id, call).await;
    for update in output.state_updates.drain(..) {
      state.apply_update(update);
    }

    self
      .events
      .send(EventMsg::ToolCallCompleted(ToolCallCompletedEvent {
        call_id: call.id.clone(),
        tool_name: call.name.clone(),
        is_error: output.is_error,
      }))
      .await;

    if output.is_error {
      ContentBlock::tool_error(&call.id, output.content)
    } else {
      ContentBlock::tool_result(&call.id, output.content)
    }
  }

  async fn run_call(&self, session_id: &str, call: &ToolCallRequest) -> ToolOutput {
    if let Some(err) = &call.input_error {
      return ToolOutput::error(format!("Invalid input for {}: {err}", call.name));
    }

    if let Some(gate) = &self.approval
      && let ApprovalCheck::Required(request) =
        gate
          .check_approval(session_id, &call.name, &call.input, &self.config.cwd)
          .await
    {
      let pending = gate.begin(request.clone()).await;
      let request_id = pending.request_id().to_string();
      self
        .events
        .send(EventMsg::ApprovalRequired(ApprovalRequiredEvent { request }))
        .await;
      let approved = gate.await_decision(pending).await;
      self
        .events
        .send(EventMsg::ApprovalResult(ApprovalResultEvent {
          request_id,
          approved,
        }))
        .await;
      if !approved {
        debug!(session_id, tool_name = %call.name, "tool call denied");
        return ToolOutput::error(DENIED_MESSAGE);
      }
    }

    let ctx = ToolContext::new(session_id, &call.id, self.config.cwd.clone())
      .with_events(self.events.clone());
    let invocation = ToolInvocation::new(&call.id, &call.name, call.input.clone());
    match self.tools.dispatch(invocation, &ctx).await {
      Ok(output) => output,
      Err(err) => {
        debug!(session_id, tool_name = %call.name, error = %err, "tool call failed");
        ToolOutput::error(err.to_string())
      }
    }
  }
}
