use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::session::{FileAction, FileNote};
use crate::tools::context::{FunctionCallError, StateUpdate, ToolContext, ToolInvocation, ToolOutput};
use crate::tools::registry::ToolHandler;

pub struct WriteFileHandler;

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
  file_path: String,
  content: String,
}

#[async_trait]
impl ToolHandler for WriteFileHandler {
  fn is_mutating(&self) -> bool {
    true
  }

  async fn handle(
    &self,
    invocation: ToolInvocation,
    ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    let args: WriteFileArgs = invocation.parse_arguments()?;
    let path = ctx.resolve_path(&args.file_path);

    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await.map_err(|e| {
        FunctionCallError::Execution(format!("failed to create {}: {e}", parent.display()))
      })?;
    }

    tokio::fs::write(&path, args.content.as_bytes())
      .await
      .map_err(|e| FunctionCallError::Execution(format!("failed to write {}: {e}", args.file_path)))?;

    let lines = args.content.lines().count();
    Ok(
      ToolOutput::success(format!("Wrote {lines} lines to {}", args.file_path)).with_update(
        StateUpdate::FileNote {
          path,
          note: FileNote {
            action: FileAction::Written,
            lines,
            updated_at: Utc::now(),
          },
        },
      ),
    )
  }
}
