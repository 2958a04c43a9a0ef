use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::tools::context::{FunctionCallError, ToolContext, ToolInvocation, ToolOutput};
use crate::tools::registry::ToolHandler;

pub const DEFAULT_SHELL_TIMEOUT_MS: u64 = 120_000;

pub struct ShellHandler;

#[derive(Debug, Deserialize)]
struct ShellArgs {
  command: String,
  timeout_ms: Option<u64>,
}

#[async_trait]
impl ToolHandler for ShellHandler {
  fn is_mutating(&self) -> bool {
    true
  }

  async fn handle(
    &self,
    invocation: ToolInvocation,
    ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    let args: ShellArgs = invocation.parse_arguments()?;
    let timeout_ms = args.timeout_ms.unwrap_or(DEFAULT_SHELL_TIMEOUT_MS);

    let mut cmd = Command::new("bash");
    cmd
      .arg("-lc")
      .arg(&args.command)
      .current_dir(&ctx.cwd)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true);

    let child = cmd
      .spawn()
      .map_err(|e| FunctionCallError::Execution(format!("shell failed to start: {e}")))?;
    ctx.progress(format!("running: {}", args.command)).await;
    debug!(call_id = %ctx.call_id, timeout_ms, "shell command started");

    let output = tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait_with_output())
      .await
      .map_err(|_| FunctionCallError::Timeout(timeout_ms))?
      .map_err(|e| FunctionCallError::Execution(format!("shell failed: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let exit = output.status.code().unwrap_or(-1);

    let mut content = format!("exit_code: {exit}\n");
    for (label, stream) in [("stdout", &stdout), ("stderr", &stderr)] {
      if stream.is_empty() {
        continue;
      }
      content.push_str(label);
      content.push_str(":\n");
      content.push_str(stream);
      if !content.ends_with('\n') {
        content.push('\n');
      }
    }

    let mut out = ToolOutput::success(content);
    out.is_error = exit != 0;
    Ok(out)
  }
}
