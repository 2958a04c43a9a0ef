use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::session::{FileAction, FileNote};
use crate::tools::context::{FunctionCallError, StateUpdate, ToolContext, ToolInvocation, ToolOutput};
use crate::tools::registry::ToolHandler;

pub struct ReadFileHandler;

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
  file_path: String,
  offset: Option<usize>,
  limit: Option<usize>,
}

#[async_trait]
impl ToolHandler for ReadFileHandler {
  async fn handle(
    &self,
    invocation: ToolInvocation,
    ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    let args: ReadFileArgs = invocation.parse_arguments()?;
    let path = ctx.resolve_path(&args.file_path);

    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
      FunctionCallError::Execution(format!("failed to read {}: {e}", args.file_path))
    })?;

    let lines: Vec<&str> = content.lines().collect();
    let start = args.offset.unwrap_or(0).min(lines.len());
    let end = match args.limit {
      Some(limit) => start.saturating_add(limit).min(lines.len()),
      None => lines.len(),
    };
    let slice = lines[start..end].join("\n");

    Ok(ToolOutput::success(slice).with_update(StateUpdate::FileNote {
      path,
      note: FileNote {
        action: FileAction::Read,
        lines: lines.len(),
        updated_at: Utc::now(),
      },
    }))
  }
}
