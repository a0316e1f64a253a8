use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::tools::context::{FunctionCallError, ToolContext};
use crate::tools::registry::TypedToolHandler;

pub struct MoveFileHandler {
  ctx: Arc<ToolContext>,
}

impl MoveFileHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveFileArgs {
  pub from: String,
  pub to: String,
}

#[async_trait]
impl TypedToolHandler for MoveFileHandler {
  type Args = MoveFileArgs;
  type Output = bool;

  async fn call(&self, args: MoveFileArgs) -> Result<bool, FunctionCallError> {
    let from = self.ctx.sandbox.resolve(&args.from)?;
    let to = self.ctx.sandbox.resolve(&args.to)?;
    tokio::fs::rename(&from, &to).await.map_err(|e| {
      FunctionCallError::io(&format!("failed to move {} to {}", args.from, args.to), e)
    })?;
    Ok(true)
  }
}
