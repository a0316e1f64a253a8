use std::sync::Arc;

use lathe_protocol::ToolCallRequest;
use serde::de::DeserializeOwned;

use crate::tools::sandboxing::Sandbox;
use crate::tools::sandboxing::SandboxError;

/// Invocation payload passed to a tool handler.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
  pub id: String,
  pub name: String,
  pub arguments: String,
}

impl ToolInvocation {
  pub fn parse_arguments<T: DeserializeOwned>(&self) -> Result<T, FunctionCallError> {
    // some providers send an empty payload for argument-less calls
    let raw = if self.arguments.trim().is_empty() {
      "{}"
    } else {
      self.arguments.as_str()
    };
    serde_json::from_str(raw).map_err(|e| {
      FunctionCallError::InvalidArguments(format!("invalid arguments for {}: {e}", self.name))
    })
  }
}

impl From<&ToolCallRequest> for ToolInvocation {
  fn from(call: &ToolCallRequest) -> Self {
    Self {
      id: call.id.clone(),
      name: call.name.clone(),
      arguments: call.arguments.clone(),
    }
  }
}

/// Shared tool runtime context.
#[derive(Debug, Clone)]
pub struct ToolContext {
  pub sandbox: Sandbox,
  /// Interpreter for `python_execute`.
  pub python: String,
}

impl ToolContext {
  pub fn new(sandbox: Sandbox) -> Arc<Self> {
    Self::with_python(sandbox, "python3")
  }

  pub fn with_python(sandbox: Sandbox, python: impl Into<String>) -> Arc<Self> {
    Arc::new(Self {
      sandbox,
      python: python.into(),
    })
  }
}

/// Tool invocation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FunctionCallError {
  #[error("{0}")]
  InvalidArguments(String),

  #[error("function not found")]
  ToolNotFound(String),

  #[error(transparent)]
  Sandbox(#[from] SandboxError),

  #[error("{0}")]
  Execution(String),
}

impl FunctionCallError {
  pub fn io(action: &str, err: std::io::Error) -> Self {
    FunctionCallError::Execution(format!("{action}: {err}"))
  }
}
