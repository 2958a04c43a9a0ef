use async_trait::async_trait;
use serde::Deserialize;

use crate::tools::context::{FunctionCallError, ToolContext, ToolInvocation, ToolOutput};
use crate::tools::registry::ToolHandler;

pub struct ListDirHandler;

#[derive(Debug, Deserialize)]
struct ListDirArgs {
  dir_path: String,
}

#[async_trait]
impl ToolHandler for ListDirHandler {
  async fn handle(
    &self,
    invocation: ToolInvocation,
    ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    let args: ListDirArgs = invocation.parse_arguments()?;
    let path = ctx.resolve_path(&args.dir_path);
    let failed =
      |e: std::io::Error| FunctionCallError::Execution(format!("failed to list {}: {e}", args.dir_path));

    let mut reader = tokio::fs::read_dir(&path).await.map_err(failed)?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(failed)? {
      let mut name = entry.file_name().to_string_lossy().into_owned();
      if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
        name.push('/');
      }
      entries.push(name);
    }
    entries.sort();

    if entries.is_empty() {
      return Ok(ToolOutput::success("(empty directory)"));
    }
    Ok(ToolOutput::success(entries.join("\n")))
  }
}
