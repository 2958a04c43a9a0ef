use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::session::{FileAction, FileNote};
use crate::tools::context::{FunctionCallError, StateUpdate, ToolContext, ToolInvocation, ToolOutput};
use crate::tools::registry::ToolHandler;

pub struct EditFileHandler;

#[derive(Debug, Deserialize)]
struct EditFileArgs {
  file_path: String,
  old_string: String,
  new_string: String,
  #[serde(default)]
  replace_all: bool,
}

#[async_trait]
impl ToolHandler for EditFileHandler {
  fn is_mutating(&self) -> bool {
    true
  }

  async fn handle(
    &self,
    invocation: ToolInvocation,
    ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    let args: EditFileArgs = invocation.parse_arguments()?;
    if args.old_string.is_empty() {
      return Err(FunctionCallError::InvalidArguments(
        "old_string must not be empty".to_string(),
      ));
    }

    let path = ctx.resolve_path(&args.file_path);
    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
      FunctionCallError::Execution(format!("failed to read {}: {e}", args.file_path))
    })?;

    let occurrences = content.matches(&args.old_string).count();
    let updated = match occurrences {
      0 => {
        return Err(FunctionCallError::Execution(format!(
          "old_string not found in {}",
          args.file_path
        )));
      }
      1 => content.replacen(&args.old_string, &args.new_string, 1),
      _ if args.replace_all => content.replace(&args.old_string, &args.new_string),
      n => {
        return Err(FunctionCallError::Execution(format!(
          "old_string matches {n} times in {}; add context or set replace_all",
          args.file_path
        )));
      }
    };

    tokio::fs::write(&path, updated.as_bytes())
      .await
      .map_err(|e| FunctionCallError::Execution(format!("failed to write {}: {e}", args.file_path)))?;

    Ok(
      ToolOutput::success(format!(
        "Replaced {occurrences} occurrence(s) in {}",
        args.file_path
      ))
      .with_update(StateUpdate::FileNote {
        path,
        note: FileNote {
          action: FileAction::Edited,
          lines: updated.lines().count(),
          updated_at: Utc::now(),
        },
      }),
    )
  }
}
