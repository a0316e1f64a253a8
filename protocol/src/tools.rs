use serde::{Deserialize, Serialize};

/// Tool advertised to the model: name, description and argument schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
  pub name: String,
  pub description: String,
  pub input_schema: serde_json::Value,
}

/// Tool invocation requested by the model inside an assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallRequest {
  /// Correlation id assigned by the provider.
  pub id: String,
  pub name: String,
  /// Raw JSON argument payload, decoded only by the registered handler.
  pub arguments: String,
}

impl ToolCallRequest {
  pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      arguments: arguments.into(),
    }
  }

  /// `name(arguments)`, used in diagnostics.
  pub fn signature(&self) -> String {
    format!("{}({})", self.name, self.arguments)
  }
}

/// Outcome of one tool call, correlated to its request by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCallResult {
  pub id: String,
  /// Serialized success value, or the error message when `is_error` is set.
  pub content: String,
  #[serde(default)]
  pub is_error: bool,
}

impl ToolCallResult {
  pub fn success(id: impl Into<String>, content: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      content: content.into(),
      is_error: false,
    }
  }

  pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      content: message.into(),
      is_error: true,
    }
  }
}
