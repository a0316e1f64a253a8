use lathe_protocol::ToolDefinition;
use schemars::JsonSchema;
use serde_json::Value;

use crate::tools::registry::RegistryError;

/// Model-facing description of one registered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
  pub name: String,
  pub description: String,
  pub input_schema: Value,
}

impl ToolSpec {
  pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
    Self {
      name: name.into(),
      description: description.into(),
      input_schema,
    }
  }

  /// Build a spec whose input schema is reflected from the argument type.
  pub fn for_args<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
  ) -> Result<Self, RegistryError> {
    let name = name.into();
    let input_schema = args_schema::<T>(&name)?;
    Ok(Self::new(name, description, input_schema))
  }

  pub fn to_definition(&self) -> ToolDefinition {
    ToolDefinition {
      name: self.name.clone(),
      description: self.description.clone(),
      input_schema: self.input_schema.clone(),
    }
  }
}

/// JSON schema of an argument record, stripped of the generator's root metadata.
pub fn args_schema<T: JsonSchema>(tool: &str) -> Result<Value, RegistryError> {
  let schema = schemars::schema_for!(T);
  let mut value = serde_json::to_value(schema).map_err(|e| RegistryError::InvalidSchema {
    name: tool.to_string(),
    reason: e.to_string(),
  })?;

  let Some(object) = value.as_object_mut() else {
    return Err(RegistryError::InvalidSchema {
      name: tool.to_string(),
      reason: "schema is not a JSON object".to_string(),
    });
  };
  object.remove("$schema");
  object.remove("title");
  if object.get("type").and_then(Value::as_str) != Some("object") {
    return Err(RegistryError::InvalidSchema {
      name: tool.to_string(),
      reason: "arguments must be a record".to_string(),
    });
  }

  Ok(value)
}
