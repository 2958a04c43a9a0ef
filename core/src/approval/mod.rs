//! Approval gate
//!
//! Decides per tool invocation whether it may run straight away or needs a
//! user decision, and keeps per-session trust.

pub mod context;
pub mod patterns;

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use turnstile_config::ApprovalConfig;
use turnstile_protocol::{ApprovalDecision, ApprovalRequest, ApprovalResponse};

pub use context::SessionApprovalState;
pub use patterns::{glob_matches, is_dangerous, is_trustable, suggest_pattern, summarize};

/// Outcome of [`ApprovalGate::check_approval`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApprovalCheck {
  NotRequired,
  Required(ApprovalRequest),
}

impl ApprovalCheck {
  pub fn needs_approval(&self) -> bool {
    matches!(self, ApprovalCheck::Required(_))
  }

  pub fn request(&self) -> Option<&ApprovalRequest> {
    match self {
      ApprovalCheck::Required(request) => Some(request),
      ApprovalCheck::NotRequired => None,
    }
  }
}

struct PendingApproval {
  request: ApprovalRequest,
  tx: oneshot::Sender<bool>,
}

/// A registered request whose decision has not been awaited yet.
pub struct PendingDecision {
  request_id: String,
  rx: oneshot::Receiver<bool>,
}

impl PendingDecision {
  pub fn request_id(&self) -> &str {
    &self.request_id
  }
}

pub struct ApprovalGate {
  required_tools: HashSet<String>,
  timeout: Duration,
  sessions: Mutex<HashMap<String, SessionApprovalState>>,
  pending: Mutex<HashMap<String, PendingApproval>>,
}

impl ApprovalGate {
  pub fn new(config: &ApprovalConfig) -> Self {
    Self {
      required_tools: config.required_tools.iter().cloned().collect(),
      timeout: Duration::from_secs(config.timeout_secs),
      sessions: Mutex::new(HashMap::new()),
      pending: Mutex::new(HashMap::new()),
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn timeout(&self) -> Duration {
    self.timeout
  }

  pub fn requires_approval(&self, tool_name: &str) -> bool {
    self.required_tools.contains(tool_name)
  }

  /// Decide whether an invocation needs a user decision.
  ///
  /// Dangerous invocations always do, whatever the session trusts, and so
  /// do paths that climb out of their base. Relative paths are resolved
  /// against `cwd`.
  pub async fn check_approval(
    &self,
    session_id: &str,
    tool_name: &str,
    tool_input: &Value,
    cwd: &Path,
  ) -> ApprovalCheck {
    if !self.requires_approval(tool_name) {
      return ApprovalCheck::NotRequired;
    }

    let dangerous = is_dangerous(tool_name, tool_input, cwd);
    if !dangerous && is_trustable(tool_name, tool_input) {
      let subject = patterns::match_subject(tool_name, tool_input);
      let sessions = self.sessions.lock().await;
      if sessions
        .get(session_id)
        .is_some_and(|state| state.is_trusted(tool_name, &subject))
      {
        debug!(session_id, tool_name, "invocation covered by session trust");
        return ApprovalCheck::NotRequired;
      }
    }

    ApprovalCheck::Required(ApprovalRequest {
      request_id: Uuid::new_v4().to_string(),
      session_id: session_id.to_string(),
      tool_name: tool_name.to_string(),
      tool_input: tool_input.clone(),
      summary: summarize(tool_name, tool_input),
      is_dangerous: dangerous,
      timestamp: Utc::now(),
      suggested_pattern: if dangerous {
        None
      } else {
        suggest_pattern(tool_name, tool_input)
      },
    })
  }

  /// Register a request so responses can find it. Call this before the
  /// request is shown to anyone.
  pub async fn begin(&self, request: ApprovalRequest) -> PendingDecision {
    let (tx, rx) = oneshot::channel();
    let request_id = request.request_id.clone();
    self
      .pending
      .lock()
      .await
      .insert(request_id.clone(), PendingApproval { request, tx });
    PendingDecision { request_id, rx }
  }

  /// Wait for the decision on a registered request. Resolves to `false`
  /// when the timeout elapses first; the request is discarded then.
  pub async fn await_decision(&self, pending: PendingDecision) -> bool {
    let PendingDecision { request_id, mut rx } = pending;
    match tokio::time::timeout(self.timeout, &mut rx).await {
      Ok(Ok(approved)) => approved,
      Ok(Err(_)) => {
        debug!(request_id = %request_id, "approval request dropped");
        false
      }
      Err(_) => {
        let expired = self.pending.lock().await.remove(&request_id).is_some();
        if expired {
          warn!(request_id = %request_id, timeout = ?self.timeout, "approval timed out");
          false
        } else {
          // A response claimed the request as the timer fired; it owns the
          // sender and either sends or drops it.
          rx.await.unwrap_or(false)
        }
      }
    }
  }

  /// [`begin`](Self::begin) followed by [`await_decision`](Self::await_decision).
  pub async fn wait_for_approval(&self, request: ApprovalRequest) -> bool {
    let pending = self.begin(request).await;
    self.await_decision(pending).await
  }

  /// Apply a user decision. Returns false if the request is unknown,
  /// already resolved or expired.
  pub async fn handle_response(&self, response: ApprovalResponse) -> bool {
    let Some(pending) = self.pending.lock().await.remove(&response.request_id) else {
      debug!(request_id = %response.request_id, "no pending approval for response");
      return false;
    };
    let request = &pending.request;

    let approved = match response.decision {
      ApprovalDecision::Deny => false,
      ApprovalDecision::AllowOnce => true,
      ApprovalDecision::AllowPattern => {
        match response.pattern.or_else(|| request.suggested_pattern.clone()) {
          Some(pattern) => {
            info!(tool = %request.tool_name, pattern = %pattern, "trusting pattern");
            self
              .sessions
              .lock()
              .await
              .entry(request.session_id.clone())
              .or_default()
              .trust_pattern(&request.tool_name, &pattern);
          }
          None => warn!(request_id = %request.request_id, "allow_pattern without a pattern"),
        }
        true
      }
      ApprovalDecision::AllowTool => {
        if request.is_dangerous {
          info!(tool = %request.tool_name, "dangerous request approved once, tool not trusted");
        } else {
          info!(tool = %request.tool_name, "trusting tool for session");
          self
            .sessions
            .lock()
            .await
            .entry(request.session_id.clone())
            .or_default()
            .trust_tool(&request.tool_name);
        }
        true
      }
    };

    if pending.tx.send(approved).is_err() {
      debug!(request_id = %response.request_id, "approval waiter already gone");
    }
    true
  }

  /// Trust state of a session.
  pub async fn session_state(&self, session_id: &str) -> SessionApprovalState {
    self
      .sessions
      .lock()
      .await
      .get(session_id)
      .cloned()
      .unwrap_or_default()
  }

  /// Requests waiting on a decision, oldest first.
  pub async fn pending_requests(&self) -> Vec<ApprovalRequest> {
    let mut requests: Vec<ApprovalRequest> = self
      .pending
      .lock()
      .await
      .values()
      .map(|pending| pending.request.clone())
      .collect();
    requests.sort_by_key(|request| request.timestamp);
    requests
  }

  /// Forget a session's trust and deny its outstanding requests.
  pub async fn clear_session(&self, session_id: &str) {
    self.sessions.lock().await.remove(session_id);
    self
      .pending
      .lock()
      .await
      .retain(|_, pending| pending.request.session_id != session_id);
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use pretty_assertions::assert_eq;
  use serde_json::json;

  use super::*;

  fn gate() -> ApprovalGate {
    ApprovalGate::new(&ApprovalConfig::default())
  }

  fn shell(command: &str) -> Value {
    json!({ "command": command })
  }

  fn cwd() -> &'static Path {
    Path::new("/work/project")
  }

  async fn required(gate: &ApprovalGate, session: &str, tool: &str, input: Value) -> ApprovalRequest {
    match gate.check_approval(session, tool, &input, cwd()).await {
      ApprovalCheck::Required(request) => request,
      ApprovalCheck::NotRequired => panic!("expected approval to be required"),
    }
  }

  /// Register `request`, answer it, and return what the waiter saw.
  async fn decide(gate: &Arc<ApprovalGate>, request: ApprovalRequest, response: ApprovalResponse) -> bool {
    let pending = gate.begin(request).await;
    assert!(gate.handle_response(response).await);
    gate.await_decision(pending).await
  }

  #[tokio::test]
  async fn read_only_tools_never_need_approval() {
    let gate = gate();
    let check = gate
      .check_approval("s1", "read_file", &json!({ "file_path": "/etc/passwd" }), cwd())
      .await;
    assert_eq!(check, ApprovalCheck::NotRequired);
  }

  #[tokio::test]
  async fn dangerous_allow_tool_does_not_grant_trust() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "execute_shell", shell("rm -rf /")).await;
    assert!(request.is_dangerous);
    assert_eq!(request.suggested_pattern, None);

    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::AllowTool);
    assert!(decide(&gate, request, response).await);
    assert!(gate.session_state("s1").await.trusted_tools.is_empty());
  }

  #[tokio::test]
  async fn allow_tool_trusts_later_invocations() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "write_file", json!({ "file_path": "a.txt" })).await;
    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::AllowTool);
    assert!(decide(&gate, request, response).await);

    let check = gate
      .check_approval("s1", "write_file", &json!({ "file_path": "b/c.txt" }), cwd())
      .await;
    assert_eq!(check, ApprovalCheck::NotRequired);

    let other_session = gate
      .check_approval("s2", "write_file", &json!({ "file_path": "a.txt" }), cwd())
      .await;
    assert!(other_session.needs_approval());
  }

  #[tokio::test]
  async fn trusted_pattern_bypasses_but_dangerous_still_asks() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "execute_shell", shell("npm install")).await;
    assert_eq!(request.suggested_pattern.as_deref(), Some("npm *"));
    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::AllowPattern)
      .with_pattern("npm *");
    assert!(decide(&gate, request, response).await);

    assert_eq!(
      gate.check_approval("s1", "execute_shell", &shell("npm test"), cwd()).await,
      ApprovalCheck::NotRequired
    );

    let check = gate
      .check_approval("s1", "execute_shell", &shell("npm run build && rm -rf /"), cwd())
      .await;
    let request = check.request().expect("dangerous request");
    assert!(request.is_dangerous);

    assert!(
      gate
        .check_approval("s1", "execute_shell", &shell("cargo test"), cwd())
        .await
        .needs_approval()
    );
  }

  #[tokio::test]
  async fn dangerous_overrides_trusted_tool() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "execute_shell", shell("ls")).await;
    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::AllowTool);
    assert!(decide(&gate, request, response).await);
    assert!(gate.session_state("s1").await.trusted_tools.contains("execute_shell"));

    let check = gate
      .check_approval("s1", "execute_shell", &shell("sudo reboot"), cwd())
      .await;
    assert!(check.needs_approval());
  }

  #[tokio::test]
  async fn allow_pattern_falls_back_to_suggestion() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "write_file", json!({ "file_path": "src/a.rs" })).await;
    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::AllowPattern);
    assert!(decide(&gate, request, response).await);

    let state = gate.session_state("s1").await;
    assert!(state.trusted_patterns["write_file"].contains("src/*"));
  }

  #[tokio::test]
  async fn deny_and_allow_once_leave_trust_untouched() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "execute_shell", shell("make")).await;
    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::Deny);
    assert!(!decide(&gate, request, response).await);

    let request = required(&gate, "s1", "execute_shell", shell("make")).await;
    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::AllowOnce);
    assert!(decide(&gate, request, response).await);

    let state = gate.session_state("s1").await;
    assert!(state.trusted_tools.is_empty());
    assert!(state.trusted_patterns.is_empty());
  }

  #[tokio::test]
  async fn each_request_resolves_once() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "execute_shell", shell("make")).await;
    let request_id = request.request_id.clone();

    let waiter = {
      let gate = Arc::clone(&gate);
      tokio::spawn(async move { gate.wait_for_approval(request).await })
    };
    while gate.pending_requests().await.is_empty() {
      tokio::task::yield_now().await;
    }

    let response = ApprovalResponse::new(&request_id, ApprovalDecision::AllowOnce);
    assert!(gate.handle_response(response.clone()).await);
    assert!(!gate.handle_response(response.clone()).await);
    assert!(!gate.handle_response(response).await);
    assert!(waiter.await.expect("waiter task"));
  }

  #[tokio::test(start_paused = true)]
  async fn unanswered_request_times_out_as_denied() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "execute_shell", shell("make")).await;
    let request_id = request.request_id.clone();

    let started = tokio::time::Instant::now();
    let approved = gate.wait_for_approval(request).await;
    assert!(!approved);
    assert!(started.elapsed() >= Duration::from_secs(300));

    let late = ApprovalResponse::new(&request_id, ApprovalDecision::AllowTool);
    assert!(!gate.handle_response(late).await);
    assert!(gate.session_state("s1").await.trusted_tools.is_empty());
    assert!(gate.pending_requests().await.is_empty());
  }

  #[tokio::test]
  async fn trust_never_covers_protected_or_escaping_paths() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "write_file", json!({ "file_path": "src/a.rs" })).await;
    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::AllowPattern);
    assert!(decide(&gate, request, response).await);
    let request = required(&gate, "s1", "edit_file", json!({ "file_path": "notes.md" })).await;
    let response = ApprovalResponse::new(&request.request_id, ApprovalDecision::AllowTool);
    assert!(decide(&gate, request, response).await);

    for path in ["/tmp/../etc/passwd", "/./etc/shadow", "//etc/hosts", "../../../../../../etc/passwd"] {
      let check = gate
        .check_approval("s1", "edit_file", &json!({ "file_path": path }), cwd())
        .await;
      assert!(check.request().is_some_and(|r| r.is_dangerous), "{path}");
    }

    let check = gate
      .check_approval("s1", "write_file", &json!({ "file_path": "src/../../../etc/x" }), cwd())
      .await;
    assert!(check.request().is_some_and(|r| r.is_dangerous));
    let check = gate
      .check_approval("s1", "write_file", &json!({ "file_path": "src/../../sibling/x" }), cwd())
      .await;
    assert!(check.needs_approval());
    let check = gate
      .check_approval("s1", "edit_file", &json!({ "file_path": "../sibling/x" }), cwd())
      .await;
    assert!(check.needs_approval());

    assert_eq!(
      gate
        .check_approval("s1", "write_file", &json!({ "file_path": "./src//b.rs" }), cwd())
        .await,
      ApprovalCheck::NotRequired
    );
  }

  #[tokio::test(start_paused = true)]
  async fn response_claiming_request_at_timeout_is_what_the_waiter_sees() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "write_file", json!({ "file_path": "a.txt" })).await;
    let request_id = request.request_id.clone();
    let pending = gate.begin(request).await;

    // Hold the trust table so the response stalls after claiming the request.
    let sessions = gate.sessions.lock().await;
    let responder = {
      let gate = Arc::clone(&gate);
      let response = ApprovalResponse::new(&request_id, ApprovalDecision::AllowTool);
      tokio::spawn(async move { gate.handle_response(response).await })
    };
    while !gate.pending_requests().await.is_empty() {
      tokio::task::yield_now().await;
    }

    let waiter = {
      let gate = Arc::clone(&gate);
      tokio::spawn(async move { gate.await_decision(pending).await })
    };
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(301)).await;
    for _ in 0..8 {
      tokio::task::yield_now().await;
    }
    drop(sessions);

    assert!(responder.await.expect("responder task"));
    assert!(waiter.await.expect("waiter task"));
    assert!(gate.session_state("s1").await.trusted_tools.contains("write_file"));
  }

  #[tokio::test]
  async fn clearing_a_session_denies_its_pending_requests() {
    let gate = Arc::new(gate());
    let request = required(&gate, "s1", "execute_shell", shell("make")).await;
    let pending = gate.begin(request).await;
    gate.clear_session("s1").await;
    assert!(!gate.await_decision(pending).await);
  }
}
