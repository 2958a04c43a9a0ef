pub mod context;
pub mod handlers;
pub mod registry;
pub mod spec;
pub mod validation;

use std::sync::Arc;

use turnstile_config::Config;

use crate::model::ModelClient;
use crate::tools::handlers::spawn_agent::SpawnAgentHandler;
use crate::tools::registry::ToolRegistry;
use crate::turn::SubAgentRunner;

/// Build the default tool registry from configuration.
///
/// Sub-agents get the read-only part of the catalogue: no mutating tools,
/// no todo list, and no `spawn_agent` of their own.
pub fn build_default_tools(client: Arc<ModelClient>, config: &Config) -> Arc<ToolRegistry> {
  let mut registry = ToolRegistry::new();
  handlers::register_builtin_handlers(&mut registry);

  let runner = SubAgentRunner::new(
    client,
    Arc::new(read_only_tools(&registry)),
    config.agent.sub_agent_max_iterations,
  );
  registry.register_tool(
    spec::spawn_agent_tool(),
    Arc::new(SpawnAgentHandler::new(Arc::new(runner))),
  );

  Arc::new(registry)
}

/// Tools that neither touch the filesystem nor the session todo list.
pub fn read_only_tools(registry: &ToolRegistry) -> ToolRegistry {
  registry.filtered(|name, handler| !handler.is_mutating() && name != "write_todos")
}
