use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::tools::context::{FunctionCallError, ToolContext};
use crate::tools::registry::TypedToolHandler;

pub struct RemoveFileHandler {
  ctx: Arc<ToolContext>,
}

impl RemoveFileHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveFileArgs {
  /// File or empty directory relative to the working directory
  pub path: String,
}

#[async_trait]
impl TypedToolHandler for RemoveFileHandler {
  type Args = RemoveFileArgs;
  type Output = bool;

  async fn call(&self, args: RemoveFileArgs) -> Result<bool, FunctionCallError> {
    let path = self.ctx.sandbox.resolve(&args.path)?;
    if path == self.ctx.sandbox.root() {
      return Err(FunctionCallError::Execution(
        "refusing to remove the working directory".to_string(),
      ));
    }
    let remove_error =
      |e: std::io::Error| FunctionCallError::io(&format!("failed to remove {}", args.path), e);

    let metadata = tokio::fs::symlink_metadata(&path)
      .await
      .map_err(remove_error)?;
    if metadata.is_dir() {
      tokio::fs::remove_dir(&path).await.map_err(remove_error)?;
    } else {
      tokio::fs::remove_file(&path).await.map_err(remove_error)?;
    }
    Ok(true)
  }
}
