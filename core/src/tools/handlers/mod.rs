pub mod edit_file;
pub mod list_dir;
pub mod read_file;
pub mod shell;
pub mod spawn_agent;
pub mod todos;
pub mod write_file;

use std::sync::Arc;

use crate::tools::registry::ToolRegistry;
use crate::tools::spec;

/// Register every built-in tool except `spawn_agent`, which needs a runner.
pub fn register_builtin_handlers(registry: &mut ToolRegistry) {
  registry.register_tool(spec::read_file_tool(), Arc::new(read_file::ReadFileHandler));
  registry.register_tool(spec::write_file_tool(), Arc::new(write_file::WriteFileHandler));
  registry.register_tool(spec::edit_file_tool(), Arc::new(edit_file::EditFileHandler));
  registry.register_tool(spec::list_dir_tool(), Arc::new(list_dir::ListDirHandler));
  registry.register_tool(spec::shell_tool(), Arc::new(shell::ShellHandler));
  registry.register_tool(spec::write_todos_tool(), Arc::new(todos::WriteTodosHandler));
}
