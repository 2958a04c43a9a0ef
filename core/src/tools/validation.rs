use serde_json::Value;

use crate::tools::context::FunctionCallError;
use crate::tools::spec::JsonSchema;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
  #[error("missing required field `{0}`")]
  MissingField(String),
  #[error("field `{field}` must be {expected}")]
  WrongType { field: String, expected: &'static str },
}

/// Check a tool input against its schema: required fields are present and
/// every known field has the declared type. Unknown fields are allowed.
pub fn validate_input(schema: &JsonSchema, input: &Value) -> Result<(), ValidationError> {
  check(schema, input, "input")
}

fn check(schema: &JsonSchema, value: &Value, field: &str) -> Result<(), ValidationError> {
  let wrong = |expected: &'static str| ValidationError::WrongType {
    field: field.to_string(),
    expected,
  };
  match schema {
    JsonSchema::String { .. } if !value.is_string() => Err(wrong("a string")),
    JsonSchema::Integer { .. } if !(value.is_i64() || value.is_u64()) => Err(wrong("an integer")),
    JsonSchema::Boolean { .. } if !value.is_boolean() => Err(wrong("a boolean")),
    JsonSchema::Array { items, .. } => {
      let array = value.as_array().ok_or_else(|| wrong("an array"))?;
      for (index, item) in array.iter().enumerate() {
        check(items, item, &format!("{field}[{index}]"))?;
      }
      Ok(())
    }
    JsonSchema::Object {
      properties,
      required,
    } => {
      let object = value.as_object().ok_or_else(|| wrong("an object"))?;
      for name in required.iter().flatten() {
        if object.get(name).is_none_or(Value::is_null) {
          return Err(ValidationError::MissingField(name.clone()));
        }
      }
      for (name, property) in properties {
        match object.get(name) {
          Some(Value::Null) | None => {}
          Some(child) => check(property, child, name)?,
        }
      }
      Ok(())
    }
    _ => Ok(()),
  }
}

impl From<ValidationError> for FunctionCallError {
  fn from(value: ValidationError) -> Self {
    FunctionCallError::InvalidArguments(value.to_string())
  }
}
