use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use lathe_protocol::ToolDefinition;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::tools::context::{FunctionCallError, ToolInvocation};
use crate::tools::spec::ToolSpec;

/// Failure while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
  #[error("tool {0} is already registered")]
  Duplicate(String),

  #[error("invalid argument schema for {name}: {reason}")]
  InvalidSchema { name: String, reason: String },
}

/// Object-safe handler stored in the registry; decodes its own arguments.
#[async_trait]
pub trait ToolHandler: Send + Sync {
  async fn handle(&self, invocation: ToolInvocation) -> Result<Value, FunctionCallError>;
}

/// Handler written against a concrete argument record.
///
/// The record's JSON schema is what the model sees, and the raw payload is
/// decoded into it before `call` runs.
#[async_trait]
pub trait TypedToolHandler: Send + Sync + 'static {
  type Args: DeserializeOwned + JsonSchema + fmt::Debug + Send;
  type Output: Serialize + Send;

  async fn call(&self, args: Self::Args) -> Result<Self::Output, FunctionCallError>;
}

struct Typed<H>(H);

#[async_trait]
impl<H: TypedToolHandler> ToolHandler for Typed<H> {
  async fn handle(&self, invocation: ToolInvocation) -> Result<Value, FunctionCallError> {
    let args: H::Args = invocation.parse_arguments()?;
    info!(
      tool = %invocation.name,
      call_id = %invocation.id,
      "call {}({:?})",
      invocation.name,
      args
    );

    let output = self.0.call(args).await?;
    serde_json::to_value(output).map_err(|e| {
      FunctionCallError::Execution(format!("failed to encode {} result: {e}", invocation.name))
    })
  }
}

/// Name-keyed tool catalogue. Advertises tools in registration order.
#[derive(Default)]
pub struct ToolRegistry {
  specs: Vec<ToolSpec>,
  handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a typed handler, reflecting its argument schema.
  pub fn register<H: TypedToolHandler>(
    &mut self,
    name: &str,
    description: &str,
    handler: H,
  ) -> Result<(), RegistryError> {
    let spec = ToolSpec::for_args::<H::Args>(name, description)?;
    self.register_tool(spec, Arc::new(Typed(handler)))
  }

  pub fn register_tool(
    &mut self,
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
  ) -> Result<(), RegistryError> {
    if self.handlers.contains_key(&spec.name) {
      return Err(RegistryError::Duplicate(spec.name));
    }
    self.handlers.insert(spec.name.clone(), handler);
    self.specs.push(spec);
    Ok(())
  }

  pub fn get_handler(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
    self.handlers.get(name)
  }

  pub fn get_spec(&self, name: &str) -> Option<&ToolSpec> {
    self.specs.iter().find(|spec| spec.name == name)
  }

  pub fn len(&self) -> usize {
    self.specs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.specs.is_empty()
  }

  pub fn definitions(&self) -> Vec<ToolDefinition> {
    self.specs.iter().map(ToolSpec::to_definition).collect()
  }

  pub async fn dispatch(&self, invocation: ToolInvocation) -> Result<Value, FunctionCallError> {
    let handler = self
      .get_handler(&invocation.name)
      .ok_or_else(|| FunctionCallError::ToolNotFound(invocation.name.clone()))?;
    handler.handle(invocation).await
  }
}
