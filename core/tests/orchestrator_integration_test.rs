use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pretty_assertions::assert_eq;
use turnstile_config::Config;
use turnstile_core::checkpoint::{CheckpointName, CheckpointNamer};
use turnstile_core::model::{
  ClientConfig, ModelClient, ModelError, ModelProvider, ModelRequest, ResponseStream,
};
use turnstile_core::session::SessionState;
use turnstile_core::tools::context::{FunctionCallError, ToolContext, ToolInvocation, ToolOutput};
use turnstile_core::tools::registry::{ToolHandler, ToolRegistry};
use turnstile_core::tools::spec::{JsonSchema, ToolSpec};
use turnstile_core::turn::{MAX_ITERATIONS_MESSAGE, TurnHook};
use turnstile_core::{EventSink, Orchestrator, StopReason, TurnError, event_channel};
use turnstile_protocol::{
  ApprovalDecision, ApprovalResponse, ContentBlock, EventMsg, Message, ResponseErrorEvent,
  ResponseEvent, Role, TokenUsage,
};

// Scripted provider: each model call pops the next script.
struct ScriptedProvider {
  scripts: StdMutex<VecDeque<Vec<ResponseEvent>>>,
  requests: StdMutex<Vec<ModelRequest>>,
  latency: Duration,
}

impl ScriptedProvider {
  fn new(scripts: Vec<Vec<ResponseEvent>>) -> Arc<Self> {
    Self::with_latency(scripts, Duration::ZERO)
  }

  fn with_latency(scripts: Vec<Vec<ResponseEvent>>, latency: Duration) -> Arc<Self> {
    Arc::new(Self {
      scripts: StdMutex::new(scripts.into()),
      requests: StdMutex::new(Vec::new()),
      latency,
    })
  }

  fn request_count(&self) -> usize {
    self.requests.lock().expect("requests lock").len()
  }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
  fn provider_id(&self) -> &'static str {
    "scripted"
  }

  async fn stream(&self, request: ModelRequest) -> turnstile_core::model::Result<ResponseStream> {
    self.requests.lock().expect("requests lock").push(request);
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
    let script = self
      .scripts
      .lock()
      .expect("scripts lock")
      .pop_front()
      .ok_or_else(|| ModelError::StreamError("script exhausted".to_string()))?;
    Ok(Box::pin(futures::stream::iter(script.into_iter().map(Ok))))
  }
}

fn text_reply(text: &str) -> Vec<ResponseEvent> {
  vec![
    ResponseEvent::text(text),
    ResponseEvent::Usage(TokenUsage::new(100, 20)),
    ResponseEvent::StreamEnd,
  ]
}

fn tool_call(id: &str, name: &str, input: Value) -> Vec<ResponseEvent> {
  vec![
    ResponseEvent::tool_call_start(id, name),
    ResponseEvent::tool_input(input.to_string()),
    ResponseEvent::BlockEnd,
  ]
}

fn tool_reply(calls: Vec<Vec<ResponseEvent>>) -> Vec<ResponseEvent> {
  let mut events: Vec<ResponseEvent> = calls.into_iter().flatten().collect();
  events.push(ResponseEvent::StreamEnd);
  events
}

// Records the order in which calls ran.
struct RecordingTool {
  label: &'static str,
  delay: Duration,
  log: Arc<StdMutex<Vec<String>>>,
}

#[async_trait]
impl ToolHandler for RecordingTool {
  async fn handle(
    &self,
    invocation: ToolInvocation,
    _ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    tokio::time::sleep(self.delay).await;
    self
      .log
      .lock()
      .expect("log lock")
      .push(format!("{}:{}", self.label, invocation.id));
    Ok(ToolOutput::success(format!("{} done", self.label)))
  }
}

fn empty_schema() -> JsonSchema {
  JsonSchema::Object {
    properties: BTreeMap::new(),
    required: None,
  }
}

struct Harness {
  orchestrator: Arc<Orchestrator>,
  provider: Arc<ScriptedProvider>,
  log: Arc<StdMutex<Vec<String>>>,
}

fn harness(provider: Arc<ScriptedProvider>) -> Harness {
  harness_with(provider, |orchestrator| orchestrator)
}

fn harness_with(
  provider: Arc<ScriptedProvider>,
  configure: impl FnOnce(Orchestrator) -> Orchestrator,
) -> Harness {
  let log = Arc::new(StdMutex::new(Vec::new()));
  let mut tools = ToolRegistry::new();
  tools.register_tool(
    ToolSpec::new("slow_tool", "Sleeps before answering", empty_schema()),
    Arc::new(RecordingTool {
      label: "slow",
      delay: Duration::from_millis(50),
      log: Arc::clone(&log),
    }),
  );
  tools.register_tool(
    ToolSpec::new("fast_tool", "Answers immediately", empty_schema()),
    Arc::new(RecordingTool {
      label: "fast",
      delay: Duration::ZERO,
      log: Arc::clone(&log),
    }),
  );
  tools.register_tool(
    ToolSpec::new("execute_shell", "Pretend shell", empty_schema()),
    Arc::new(RecordingTool {
      label: "shell",
      delay: Duration::ZERO,
      log: Arc::clone(&log),
    }),
  );

  let client = Arc::new(ModelClient::new(
    provider.clone() as Arc<dyn ModelProvider>,
    ClientConfig {
      model: "scripted-model".to_string(),
      ..Default::default()
    },
  ));
  let orchestrator = Orchestrator::new(client, Arc::new(tools), &Config::default());
  Harness {
    orchestrator: Arc::new(configure(orchestrator)),
    provider,
    log,
  }
}

fn drain(rx: &mut mpsc::Receiver<EventMsg>) -> Vec<EventMsg> {
  let mut events = Vec::new();
  while let Ok(event) = rx.try_recv() {
    events.push(event);
  }
  events
}

fn kind(event: &EventMsg) -> &'static str {
  match event {
    EventMsg::Text(_) => "text",
    EventMsg::CheckpointCreated(_) => "checkpoint_created",
    EventMsg::CheckpointUpdated(_) => "checkpoint_updated",
    EventMsg::ContextUpdate(_) => "context_update",
    EventMsg::ApprovalRequired(_) => "approval_required",
    EventMsg::ApprovalResult(_) => "approval_result",
    EventMsg::ToolCallStarted(_) => "tool_call_started",
    EventMsg::ToolCallCompleted(_) => "tool_call_completed",
    EventMsg::ToolProgress(_) => "tool_progress",
    EventMsg::IterationLimitReached(_) => "iteration_limit_reached",
    EventMsg::TurnCompleted(_) => "turn_completed",
    EventMsg::Error(_) => "error",
  }
}

fn tool_results(message: &Message) -> Vec<(String, String, bool)> {
  message
    .content
    .iter()
    .filter_map(|block| match block {
      ContentBlock::ToolResult {
        tool_use_id,
        content,
        is_error,
      } => Some((tool_use_id.clone(), content.clone(), *is_error)),
      _ => None,
    })
    .collect()
}

async fn snapshot(orchestrator: &Orchestrator, session_id: &str) -> SessionState {
  orchestrator
    .get_or_create_state(session_id)
    .await
    .lock()
    .await
    .clone()
}

// Answers every approval request with `decision` and collects all events.
fn spawn_responder(
  orchestrator: Arc<Orchestrator>,
  mut rx: mpsc::Receiver<EventMsg>,
  decision: ApprovalDecision,
) -> tokio::task::JoinHandle<Vec<EventMsg>> {
  tokio::spawn(async move {
    let mut seen = Vec::new();
    while let Some(event) = rx.recv().await {
      if let EventMsg::ApprovalRequired(required) = &event {
        let answered = orchestrator
          .handle_approval_response(ApprovalResponse::new(
            required.request.request_id.clone(),
            decision,
          ))
          .await;
        assert!(answered);
      }
      let done = matches!(event, EventMsg::TurnCompleted(_) | EventMsg::Error(_));
      seen.push(event);
      if done {
        break;
      }
    }
    seen
  })
}

#[tokio::test]
async fn pure_text_turn_appends_exactly_one_exchange() {
  let h = harness(ScriptedProvider::new(vec![text_reply("Hello there")]));
  let (sink, mut rx) = event_channel();

  let outcome = h
    .orchestrator
    .process_message("s1", "hi", sink)
    .await
    .expect("turn");

  assert_eq!(outcome.stop_reason, StopReason::Completed);
  assert_eq!(outcome.iterations, 1);
  assert_eq!(h.provider.request_count(), 1);

  let state = snapshot(&h.orchestrator, "s1").await;
  assert_eq!(state.messages.len(), 2);
  assert_eq!(state.messages[0], Message::user("hi"));
  assert_eq!(state.messages[1].role, Role::Assistant);
  assert_eq!(state.messages[1].text(), "Hello there");
  assert_eq!(state.context_usage.total_tokens, 120);

  let kinds: Vec<&str> = drain(&mut rx)
    .iter()
    .map(kind)
    .filter(|k| *k != "checkpoint_updated")
    .collect();
  assert_eq!(
    kinds,
    vec!["checkpoint_created", "text", "context_update", "turn_completed"]
  );
}

#[tokio::test]
async fn request_carries_system_prompt_history_and_tools() {
  let h = harness(ScriptedProvider::new(vec![text_reply("ok")]));
  h.orchestrator
    .process_message("s1", "hi", EventSink::disabled())
    .await
    .expect("turn");

  let requests = h.provider.requests.lock().expect("requests lock");
  let request = &requests[0];
  assert_eq!(request.model, "scripted-model");
  assert!(!request.system_prompt.is_empty());
  assert_eq!(request.messages, vec![Message::user("hi")]);
  let tools: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
  assert_eq!(tools, vec!["execute_shell", "fast_tool", "slow_tool"]);
}

#[tokio::test]
async fn sequential_tool_calls_keep_model_order() {
  let h = harness(ScriptedProvider::new(vec![
    tool_reply(vec![
      tool_call("call_a", "slow_tool", json!({})),
      tool_call("call_b", "fast_tool", json!({})),
    ]),
    text_reply("both done"),
  ]));

  h.orchestrator
    .process_message("s1", "run both", EventSink::disabled())
    .await
    .expect("turn");

  assert_eq!(
    *h.log.lock().expect("log lock"),
    vec!["slow:call_a".to_string(), "fast:call_b".to_string()]
  );

  let state = snapshot(&h.orchestrator, "s1").await;
  assert_eq!(state.messages.len(), 4);
  let ids: Vec<&str> = state.messages[1]
    .content
    .iter()
    .filter_map(|block| match block {
      ContentBlock::ToolUse { id, .. } => Some(id.as_str()),
      _ => None,
    })
    .collect();
  assert_eq!(ids, vec!["call_a", "call_b"]);
  assert_eq!(state.messages[2].tool_result_ids(), vec!["call_a", "call_b"]);
  assert_eq!(state.messages[3].text(), "both done");
}

#[tokio::test]
async fn unknown_tool_and_bad_input_become_error_results() {
  let h = harness(ScriptedProvider::new(vec![
    tool_reply(vec![
      tool_call("call_1", "nope", json!({})),
      vec![
        ResponseEvent::tool_call_start("call_2", "fast_tool"),
        ResponseEvent::tool_input("{not json"),
        ResponseEvent::BlockEnd,
      ],
    ]),
    text_reply("sorry"),
  ]));

  let outcome = h
    .orchestrator
    .process_message("s1", "try", EventSink::disabled())
    .await
    .expect("turn");
  assert_eq!(outcome.stop_reason, StopReason::Completed);

  let state = snapshot(&h.orchestrator, "s1").await;
  let results = tool_results(&state.messages[2]);
  assert_eq!(results[0], ("call_1".to_string(), "Unknown tool: nope".to_string(), true));
  assert_eq!(results[1].0, "call_2");
  assert!(results[1].1.starts_with("Invalid input for fast_tool"));
  assert!(results[1].2);
  assert!(h.log.lock().expect("log lock").is_empty());
}

#[tokio::test]
async fn approved_call_runs_and_reports_both_approval_events() {
  let h = harness(ScriptedProvider::new(vec![
    tool_reply(vec![tool_call("call_1", "execute_shell", json!({ "command": "npm test" }))]),
    text_reply("tests pass"),
  ]));
  let (sink, rx) = event_channel();
  let responder = spawn_responder(Arc::clone(&h.orchestrator), rx, ApprovalDecision::AllowOnce);

  h.orchestrator
    .process_message("s1", "run tests", sink)
    .await
    .expect("turn");
  let events = responder.await.expect("responder");

  assert_eq!(*h.log.lock().expect("log lock"), vec!["shell:call_1".to_string()]);
  let kinds: Vec<&str> = events.iter().map(kind).collect();
  let required = kinds.iter().position(|k| *k == "approval_required").expect("required");
  let result = kinds.iter().position(|k| *k == "approval_result").expect("result");
  let started = kinds.iter().position(|k| *k == "tool_call_started").expect("started");
  assert!(started < required && required < result);

  let Some(EventMsg::ApprovalRequired(required)) = events.get(required) else {
    panic!("expected approval_required");
  };
  assert_eq!(required.request.summary, "Run command: npm test");
  assert_eq!(required.request.suggested_pattern.as_deref(), Some("npm *"));
  assert!(matches!(
    events.get(result),
    Some(EventMsg::ApprovalResult(r)) if r.approved
  ));
}

#[tokio::test]
async fn denied_call_is_not_invoked() {
  let h = harness(ScriptedProvider::new(vec![
    tool_reply(vec![tool_call("call_1", "execute_shell", json!({ "command": "ls" }))]),
    text_reply("ok, not running it"),
  ]));
  let (sink, rx) = event_channel();
  let responder = spawn_responder(Arc::clone(&h.orchestrator), rx, ApprovalDecision::Deny);

  h.orchestrator
    .process_message("s1", "list", sink)
    .await
    .expect("turn");
  responder.await.expect("responder");

  assert!(h.log.lock().expect("log lock").is_empty());
  let state = snapshot(&h.orchestrator, "s1").await;
  assert_eq!(
    tool_results(&state.messages[2]),
    vec![(
      "call_1".to_string(),
      "Tool call denied by user".to_string(),
      true
    )]
  );
}

#[tokio::test]
async fn allow_pattern_skips_later_matching_prompts() {
  let h = harness(ScriptedProvider::new(vec![
    tool_reply(vec![tool_call("call_1", "execute_shell", json!({ "command": "npm test" }))]),
    text_reply("first"),
    tool_reply(vec![tool_call("call_2", "execute_shell", json!({ "command": "npm run lint" }))]),
    text_reply("second"),
  ]));
  let (sink, rx) = event_channel();
  let responder = spawn_responder(Arc::clone(&h.orchestrator), rx, ApprovalDecision::AllowPattern);
  h.orchestrator
    .process_message("s1", "test", sink)
    .await
    .expect("turn");
  responder.await.expect("responder");

  let (sink, mut rx) = event_channel();
  h.orchestrator
    .process_message("s1", "lint", sink)
    .await
    .expect("turn");
  let kinds: Vec<&str> = drain(&mut rx).iter().map(kind).collect();
  assert!(!kinds.contains(&"approval_required"));
  assert_eq!(
    *h.log.lock().expect("log lock"),
    vec!["shell:call_1".to_string(), "shell:call_2".to_string()]
  );
}

#[tokio::test]
async fn dangerous_command_needs_approval_even_when_tool_is_trusted() {
  let h = harness(ScriptedProvider::new(vec![
    tool_reply(vec![tool_call("call_1", "execute_shell", json!({ "command": "ls" }))]),
    text_reply("listed"),
    tool_reply(vec![tool_call("call_2", "execute_shell", json!({ "command": "rm -rf /" }))]),
    text_reply("refused"),
  ]));

  let (sink, rx) = event_channel();
  let responder = spawn_responder(Arc::clone(&h.orchestrator), rx, ApprovalDecision::AllowTool);
  h.orchestrator
    .process_message("s1", "list", sink)
    .await
    .expect("turn");
  responder.await.expect("responder");

  let (sink, rx) = event_channel();
  let responder = spawn_responder(Arc::clone(&h.orchestrator), rx, ApprovalDecision::Deny);
  h.orchestrator
    .process_message("s1", "wipe", sink)
    .await
    .expect("turn");
  let events = responder.await.expect("responder");

  let dangerous = events.iter().find_map(|event| match event {
    EventMsg::ApprovalRequired(required) => Some(required.request.is_dangerous),
    _ => None,
  });
  assert_eq!(dangerous, Some(true));
  assert_eq!(*h.log.lock().expect("log lock"), vec!["shell:call_1".to_string()]);
}

#[tokio::test]
async fn iteration_limit_stops_the_loop() {
  let h = harness_with(
    ScriptedProvider::new(vec![
      tool_reply(vec![tool_call("call_1", "fast_tool", json!({}))]),
      tool_reply(vec![tool_call("call_2", "fast_tool", json!({}))]),
      tool_reply(vec![tool_call("call_3", "fast_tool", json!({}))]),
    ]),
    |orchestrator| orchestrator.with_max_iterations(2),
  );
  let (sink, mut rx) = event_channel();

  let outcome = h
    .orchestrator
    .process_message("s1", "loop forever", sink)
    .await
    .expect("turn");

  assert_eq!(outcome.stop_reason, StopReason::IterationLimit);
  assert_eq!(outcome.iterations, 2);
  assert_eq!(h.provider.request_count(), 2);

  let state = snapshot(&h.orchestrator, "s1").await;
  let last = state.messages.last().expect("last message");
  assert_eq!(last.role, Role::Assistant);
  assert_eq!(last.text(), MAX_ITERATIONS_MESSAGE);
  assert!(
    drain(&mut rx)
      .iter()
      .any(|event| matches!(event, EventMsg::IterationLimitReached(e) if e.iterations == 2))
  );
}

#[tokio::test]
async fn stream_failure_aborts_with_one_error_event() {
  let h = harness(ScriptedProvider::new(vec![vec![
    ResponseEvent::text("partial"),
    ResponseEvent::Error(ResponseErrorEvent {
      message: "overloaded".to_string(),
    }),
  ]]));
  let (sink, mut rx) = event_channel();

  let err = h
    .orchestrator
    .process_message("s1", "hi", sink)
    .await
    .expect_err("stream failure");
  assert!(matches!(err, TurnError::Model(ModelError::StreamError(ref m)) if m == "overloaded"));

  let errors: Vec<EventMsg> = drain(&mut rx)
    .into_iter()
    .filter(|event| matches!(event, EventMsg::Error(_)))
    .collect();
  assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn revert_and_fork_are_isolated() {
  let h = harness(ScriptedProvider::new(vec![
    text_reply("one"),
    text_reply("two"),
    text_reply("forked reply"),
  ]));

  h.orchestrator
    .process_message("s1", "first", EventSink::disabled())
    .await
    .expect("turn 1");
  h.orchestrator
    .process_message("s1", "second", EventSink::disabled())
    .await
    .expect("turn 2");

  let checkpoints = h.orchestrator.list_checkpoints("s1").await;
  assert_eq!(checkpoints.len(), 2);
  let (newest, oldest) = (checkpoints[0].clone(), checkpoints[1].clone());
  assert_eq!(newest.state.messages.len(), 3);
  assert_eq!(oldest.state.messages.len(), 1);
  assert!(newest.state.checkpoints.is_empty());
  assert_eq!(
    snapshot(&h.orchestrator, "s1").await.checkpoints,
    vec![newest.id.clone(), oldest.id.clone()]
  );

  assert!(
    h.orchestrator
      .fork_from_checkpoint("s1", &newest.id, "s2")
      .await
  );
  h.orchestrator
    .process_message("s2", "on the fork", EventSink::disabled())
    .await
    .expect("fork turn");

  // Forking never lands on a session that already exists.
  assert!(!h.orchestrator.fork_from_checkpoint("s1", &oldest.id, "s2").await);
  assert!(!h.orchestrator.fork_from_checkpoint("s1", &oldest.id, "s1").await);

  let original = snapshot(&h.orchestrator, "s1").await;
  assert_eq!(original.messages.len(), 4);
  let fork = snapshot(&h.orchestrator, "s2").await;
  assert_eq!(fork.session_id, "s2");
  assert_eq!(fork.messages.len(), 5);
  assert_eq!(fork.messages[2], Message::user("second"));

  assert!(h.orchestrator.revert_to_checkpoint("s1", &oldest.id).await);
  let reverted = snapshot(&h.orchestrator, "s1").await;
  assert_eq!(reverted.messages, vec![Message::user("first")]);
  assert_eq!(reverted.checkpoints.len(), 2);

  // The checkpoint itself is unchanged by the turns that followed it.
  let again = h.orchestrator.list_checkpoints("s1").await;
  assert_eq!(again[1].state.messages.len(), 1);

  assert!(!h.orchestrator.revert_to_checkpoint("s1", "missing").await);
  assert!(
    !h.orchestrator
      .fork_from_checkpoint("s1", "missing", "s3")
      .await
  );
  assert!(!h.orchestrator.session_ids().await.contains(&"s3".to_string()));
}

#[tokio::test]
async fn same_session_turns_are_serialized() {
  let h = harness(ScriptedProvider::with_latency(
    vec![text_reply("a"), text_reply("b")],
    Duration::from_millis(30),
  ));

  let first = {
    let orchestrator = Arc::clone(&h.orchestrator);
    tokio::spawn(async move {
      orchestrator
        .process_message("s1", "one", EventSink::disabled())
        .await
    })
  };
  let second = {
    let orchestrator = Arc::clone(&h.orchestrator);
    tokio::spawn(async move {
      orchestrator
        .process_message("s1", "two", EventSink::disabled())
        .await
    })
  };
  first.await.expect("join").expect("turn one");
  second.await.expect("join").expect("turn two");

  let roles: Vec<Role> = snapshot(&h.orchestrator, "s1")
    .await
    .messages
    .iter()
    .map(|m| m.role)
    .collect();
  assert_eq!(
    roles,
    vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
  );
}

#[tokio::test]
async fn cancelled_turn_reports_cancellation() {
  let h = harness(ScriptedProvider::new(vec![text_reply("never")]));
  let cancel = CancellationToken::new();
  cancel.cancel();

  let err = h
    .orchestrator
    .process_message_cancellable("s1", "hi", EventSink::disabled(), cancel)
    .await
    .expect_err("cancelled");
  assert!(matches!(err, TurnError::Cancelled));
  assert_eq!(h.provider.request_count(), 0);
  // The checkpoint was still taken before the loop started.
  assert_eq!(h.orchestrator.list_checkpoints("s1").await.len(), 1);
}

struct FailingHook;

#[async_trait]
impl TurnHook for FailingHook {
  fn name(&self) -> &str {
    "failing"
  }

  async fn before_turn(&self, _state: &mut SessionState) -> anyhow::Result<()> {
    anyhow::bail!("not today")
  }
}

struct TaggingHook;

#[async_trait]
impl TurnHook for TaggingHook {
  fn name(&self) -> &str {
    "tagging"
  }

  async fn after_turn(&self, state: &mut SessionState) -> anyhow::Result<()> {
    state.messages.push(Message::assistant(Some("tagged".to_string()), Vec::new()));
    Ok(())
  }
}

#[tokio::test]
async fn hooks_run_around_the_turn_and_failures_propagate() {
  let h = harness_with(ScriptedProvider::new(vec![text_reply("hi")]), |o| {
    o.with_hook(Arc::new(TaggingHook))
  });
  h.orchestrator
    .process_message("s1", "hello", EventSink::disabled())
    .await
    .expect("turn");
  let state = snapshot(&h.orchestrator, "s1").await;
  assert_eq!(state.messages.last().map(Message::text).as_deref(), Some("tagged"));

  let h = harness_with(ScriptedProvider::new(vec![text_reply("hi")]), |o| {
    o.with_hook(Arc::new(FailingHook))
  });
  let err = h
    .orchestrator
    .process_message("s1", "hello", EventSink::disabled())
    .await
    .expect_err("hook failure");
  assert_eq!(err.to_string(), "hook `failing` failed: not today");
  assert_eq!(h.provider.request_count(), 0);
}

struct FixedNamer;

#[async_trait]
impl CheckpointNamer for FixedNamer {
  async fn name_checkpoint(
    &self,
    user_text: &str,
    turn: &[Message],
  ) -> anyhow::Result<CheckpointName> {
    Ok(CheckpointName {
      name: format!("named: {user_text}"),
      action_summary: Some(format!("{} messages", turn.len())),
    })
  }
}

#[tokio::test]
async fn checkpoint_is_named_after_the_turn() {
  let h = harness_with(ScriptedProvider::new(vec![text_reply("done")]), |o| {
    o.with_namer(Arc::new(FixedNamer))
  });
  let (sink, mut rx) = event_channel();
  h.orchestrator
    .process_message("s1", "do it", sink)
    .await
    .expect("turn");

  let updated = tokio::time::timeout(Duration::from_secs(5), async {
    while let Some(event) = rx.recv().await {
      if let EventMsg::CheckpointUpdated(updated) = event {
        return Some(updated);
      }
    }
    None
  })
  .await
  .expect("naming finished")
  .expect("checkpoint_updated event");

  assert_eq!(updated.name, "named: do it");
  assert_eq!(updated.action_summary.as_deref(), Some("1 messages"));
  let checkpoints = h.orchestrator.list_checkpoints("s1").await;
  assert_eq!(checkpoints[0].name.as_deref(), Some("named: do it"));
}

#[tokio::test]
async fn discard_session_forgets_state_and_checkpoints() {
  let h = harness(ScriptedProvider::new(vec![text_reply("hi")]));
  h.orchestrator
    .process_message("s1", "hello", EventSink::disabled())
    .await
    .expect("turn");

  h.orchestrator.discard_session("s1").await;
  assert!(h.orchestrator.list_checkpoints("s1").await.is_empty());
  assert!(h.orchestrator.session_ids().await.is_empty());
}
