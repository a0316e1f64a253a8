use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::tools::context::{FunctionCallError, ToolContext};
use crate::tools::registry::TypedToolHandler;

pub struct WriteFileHandler {
  ctx: Arc<ToolContext>,
}

impl WriteFileHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileArgs {
  /// File relative to the working directory
  pub path: String,
  pub contents: String,
  /// Append instead of overwriting
  #[serde(default)]
  pub append: bool,
}

#[async_trait]
impl TypedToolHandler for WriteFileHandler {
  type Args = WriteFileArgs;
  type Output = bool;

  async fn call(&self, args: WriteFileArgs) -> Result<bool, FunctionCallError> {
    let path = self.ctx.sandbox.resolve(&args.path)?;
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await.map_err(|e| {
        FunctionCallError::io(&format!("failed to create parent of {}", args.path), e)
      })?;
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.create(true);
    if args.append {
      options.append(true);
    } else {
      options.write(true).truncate(true);
    }

    let write_error =
      |e: std::io::Error| FunctionCallError::io(&format!("failed to write {}", args.path), e);
    let mut file = options.open(&path).await.map_err(write_error)?;
    file
      .write_all(args.contents.as_bytes())
      .await
      .map_err(write_error)?;
    file.flush().await.map_err(write_error)?;
    Ok(true)
  }
}
