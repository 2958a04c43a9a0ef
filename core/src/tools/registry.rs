use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::model::ToolDefinition;
use crate::tools::context::{FunctionCallError, ToolContext, ToolInvocation, ToolOutput};
use crate::tools::spec::ToolSpec;
use crate::tools::validation::validate_input;

#[async_trait]
pub trait ToolHandler: Send + Sync {
  /// Whether the tool changes anything outside the session.
  fn is_mutating(&self) -> bool {
    false
  }

  async fn handle(
    &self,
    invocation: ToolInvocation,
    ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError>;
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
  handlers: HashMap<String, Arc<dyn ToolHandler>>,
  specs: HashMap<String, ToolSpec>,
}

impl ToolRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register_tool(&mut self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) {
    let name = spec.name.clone();
    self.specs.insert(name.clone(), spec);
    self.handlers.insert(name, handler);
  }

  pub fn get_handler(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
    self.handlers.get(name)
  }

  pub fn get_spec(&self, name: &str) -> Option<&ToolSpec> {
    self.specs.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.handlers.contains_key(name)
  }

  /// Specs sorted by name.
  pub fn list_specs(&self) -> Vec<ToolSpec> {
    let mut specs: Vec<ToolSpec> = self.specs.values().cloned().collect();
    specs.sort_by(|a, b| a.name.cmp(&b.name));
    specs
  }

  /// Registry restricted to the tools `keep` accepts.
  pub fn filtered(&self, keep: impl Fn(&str, &dyn ToolHandler) -> bool) -> ToolRegistry {
    let mut out = ToolRegistry::new();
    for (name, handler) in &self.handlers {
      if let Some(spec) = self.specs.get(name) {
        if keep(name, handler.as_ref()) {
          out.register_tool(spec.clone(), Arc::clone(handler));
        }
      }
    }
    out
  }

  /// Validate the input and run the named tool.
  pub async fn dispatch(
    &self,
    invocation: ToolInvocation,
    ctx: &ToolContext,
  ) -> Result<ToolOutput, FunctionCallError> {
    let (Some(handler), Some(spec)) = (
      self.get_handler(&invocation.name),
      self.get_spec(&invocation.name),
    ) else {
      return Err(FunctionCallError::ToolNotFound(invocation.name));
    };
    validate_input(&spec.input_schema, &invocation.input)?;
    handler.handle(invocation, ctx).await
  }

  pub fn model_tools(&self) -> Vec<ToolDefinition> {
    self
      .list_specs()
      .into_iter()
      .map(|spec| spec.to_model_tool())
      .collect()
  }
}
