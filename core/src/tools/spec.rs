use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ToolDefinition;

/// JSON schema representation for tool input contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonSchema {
  String {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
  },
  Integer {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
  },
  Boolean {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
  },
  Array {
    items: Box<JsonSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
  },
  Object {
    properties: BTreeMap<String, JsonSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<Vec<String>>,
  },
}

impl JsonSchema {
  pub fn to_value(&self) -> serde_json::Value {
    serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
  pub name: String,
  pub description: String,
  pub input_schema: JsonSchema,
}

impl ToolSpec {
  pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: JsonSchema) -> Self {
    Self {
      name: name.into(),
      description: description.into(),
      input_schema,
    }
  }

  pub fn to_model_tool(&self) -> ToolDefinition {
    ToolDefinition {
      name: self.name.clone(),
      description: self.description.clone(),
      parameters: self.input_schema.to_value(),
    }
  }
}

pub(crate) fn obj(properties: BTreeMap<String, JsonSchema>, required: &[&str]) -> JsonSchema {
  JsonSchema::Object {
    properties,
    required: if required.is_empty() {
      None
    } else {
      Some(required.iter().map(|s| s.to_string()).collect())
    },
  }
}

pub(crate) fn str_field(desc: &str) -> JsonSchema {
  JsonSchema::String {
    description: Some(desc.to_string()),
  }
}

pub(crate) fn int_field(desc: &str) -> JsonSchema {
  JsonSchema::Integer {
    description: Some(desc.to_string()),
  }
}

pub(crate) fn bool_field(desc: &str) -> JsonSchema {
  JsonSchema::Boolean {
    description: Some(desc.to_string()),
  }
}

pub fn read_file_tool() -> ToolSpec {
  let mut props = BTreeMap::new();
  props.insert("file_path".to_string(), str_field("Path of the file to read"));
  props.insert("offset".to_string(), int_field("Zero-based line to start at"));
  props.insert("limit".to_string(), int_field("Maximum number of lines"));
  ToolSpec::new(
    "read_file",
    "Read a text file, optionally a window of its lines",
    obj(props, &["file_path"]),
  )
}

pub fn write_file_tool() -> ToolSpec {
  let mut props = BTreeMap::new();
  props.insert("file_path".to_string(), str_field("Path of the file to write"));
  props.insert("content".to_string(), str_field("Full new file content"));
  ToolSpec::new(
    "write_file",
    "Create or overwrite a file",
    obj(props, &["file_path", "content"]),
  )
}

pub fn edit_file_tool() -> ToolSpec {
  let mut props = BTreeMap::new();
  props.insert("file_path".to_string(), str_field("Path of the file to edit"));
  props.insert("old_string".to_string(), str_field("Exact text to replace"));
  props.insert("new_string".to_string(), str_field("Replacement text"));
  props.insert(
    "replace_all".to_string(),
    bool_field("Replace every occurrence instead of requiring a unique match"),
  );
  ToolSpec::new(
    "edit_file",
    "Replace an exact string in a file",
    obj(props, &["file_path", "old_string", "new_string"]),
  )
}

pub fn list_dir_tool() -> ToolSpec {
  let mut props = BTreeMap::new();
  props.insert("dir_path".to_string(), str_field("Directory to list"));
  ToolSpec::new(
    "list_dir",
    "List directory entries; directories end with /",
    obj(props, &["dir_path"]),
  )
}

pub fn shell_tool() -> ToolSpec {
  let mut props = BTreeMap::new();
  props.insert("command".to_string(), str_field("Shell command"));
  props.insert("timeout_ms".to_string(), int_field("Timeout in milliseconds"));
  ToolSpec::new(
    "execute_shell",
    "Execute a shell command in the working directory",
    obj(props, &["command"]),
  )
}

pub fn write_todos_tool() -> ToolSpec {
  let mut item = BTreeMap::new();
  item.insert("content".to_string(), str_field("Todo text"));
  item.insert(
    "status".to_string(),
    str_field("One of pending, in_progress, completed"),
  );
  let mut props = BTreeMap::new();
  props.insert(
    "todos".to_string(),
    JsonSchema::Array {
      items: Box::new(obj(item, &["content", "status"])),
      description: Some("The complete todo list".to_string()),
    },
  );
  ToolSpec::new(
    "write_todos",
    "Replace the session todo list",
    obj(props, &["todos"]),
  )
}

pub fn spawn_agent_tool() -> ToolSpec {
  let mut props = BTreeMap::new();
  props.insert("task".to_string(), str_field("Self-contained task for the sub-agent"));
  ToolSpec::new(
    "spawn_agent",
    "Delegate a read-only research task to a sub-agent and return its answer",
    obj(props, &["task"]),
  )
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn object_schema_omits_null_required_field() {
    let schema = JsonSchema::Object {
      properties: BTreeMap::new(),
      required: None,
    };
    let value = schema.to_value();

    assert_eq!(value["type"], "object");
    assert!(value.get("required").is_none());
  }

  #[test]
  fn model_tool_carries_schema() {
    let tool = write_todos_tool().to_model_tool();
    assert_eq!(tool.name, "write_todos");
    assert_eq!(tool.parameters["properties"]["todos"]["type"], "array");
    assert_eq!(
      tool.parameters["properties"]["todos"]["items"]["required"],
      serde_json::json!(["content", "status"])
    );
  }
}
