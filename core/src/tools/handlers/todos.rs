use async_trait::async_trait;
use serde::Deserialize;

use crate::session::{Todo, TodoStatus};
use crate::tools::context::{FunctionCallError, StateUpdate, ToolContext, ToolInvocation, ToolOutput};
use crate::tools::registry::ToolHandler;

pub struct WriteTodosHandler;

#[derive(Debug, Deserialize)]
struct WriteTodosArgs {
  todos: Vec<Todo>,
}

#[async_trait]
impl ToolHandler for WriteTodosHandler {
  async fn handle(
    &self,
    invocation: ToolInvocation,
    _ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    let args: WriteTodosArgs = invocation.parse_arguments()?;
    let rendered = render_todos(&args.todos);
    Ok(ToolOutput::success(rendered).with_update(StateUpdate::Todos(args.todos)))
  }
}

/// One line per todo, with a checkbox for its status.
pub fn render_todos(todos: &[Todo]) -> String {
  if todos.is_empty() {
    return "(no todos)".to_string();
  }
  todos
    .iter()
    .map(|todo| {
      let mark = match todo.status {
        TodoStatus::Pending => "[ ]",
        TodoStatus::InProgress => "[~]",
        TodoStatus::Completed => "[x]",
      };
      format!("{mark} {}", todo.content)
    })
    .collect::<Vec<_>>()
    .join("\n")
}
