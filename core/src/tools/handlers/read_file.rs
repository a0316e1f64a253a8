use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::tools::context::{FunctionCallError, ToolContext};
use crate::tools::registry::TypedToolHandler;

pub struct ReadFileHandler {
  ctx: Arc<ToolContext>,
}

impl ReadFileHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadFileArgs {
  /// File relative to the working directory
  pub path: String,
}

#[async_trait]
impl TypedToolHandler for ReadFileHandler {
  type Args = ReadFileArgs;
  type Output = String;

  async fn call(&self, args: ReadFileArgs) -> Result<String, FunctionCallError> {
    let path = self.ctx.sandbox.resolve(&args.path)?;
    tokio::fs::read_to_string(&path)
      .await
      .map_err(|e| FunctionCallError::io(&format!("failed to read {}", args.path), e))
  }
}
