use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::tools::context::{FunctionCallError, ToolContext, ToolInvocation, ToolOutput};
use crate::tools::registry::ToolHandler;
use crate::turn::SubAgentRunner;

pub struct SpawnAgentHandler {
  runner: Arc<SubAgentRunner>,
}

impl SpawnAgentHandler {
  pub fn new(runner: Arc<SubAgentRunner>) -> Self {
    Self { runner }
  }
}

#[derive(Debug, Deserialize)]
struct SpawnAgentArgs {
  task: String,
}

#[async_trait]
impl ToolHandler for SpawnAgentHandler {
  async fn handle(
    &self,
    invocation: ToolInvocation,
    ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    let args: SpawnAgentArgs = invocation.parse_arguments()?;
    ctx.progress(format!("sub-agent started: {}", args.task)).await;

    let answer = self
      .runner
      .run(&ctx.session_id, &ctx.call_id, &args.task, ctx.cwd.clone())
      .await
      .map_err(|e| FunctionCallError::Execution(format!("sub-agent failed: {e}")))?;
    Ok(ToolOutput::success(answer))
  }
}
