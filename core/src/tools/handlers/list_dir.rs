use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::context::{FunctionCallError, ToolContext};
use crate::tools::registry::TypedToolHandler;

pub struct ListDirHandler {
  ctx: Arc<ToolContext>,
}

impl ListDirHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDirArgs {
  /// Directory relative to the working directory, `/` for the root
  pub path: String,
}

/// One directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
  pub name: String,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub dir: bool,
  /// Byte size, files only
  #[serde(skip_serializing_if = "Option::is_none")]
  pub size: Option<u64>,
}

#[async_trait]
impl TypedToolHandler for ListDirHandler {
  type Args = ListDirArgs;
  type Output = Vec<DirEntry>;

  async fn call(&self, args: ListDirArgs) -> Result<Vec<DirEntry>, FunctionCallError> {
    let path = self.ctx.sandbox.resolve(&args.path)?;
    let mut reader = tokio::fs::read_dir(&path)
      .await
      .map_err(|e| FunctionCallError::io(&format!("failed to list {}", args.path), e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
      .next_entry()
      .await
      .map_err(|e| FunctionCallError::io(&format!("failed to list {}", args.path), e))?
    {
      let metadata = entry
        .metadata()
        .await
        .map_err(|e| FunctionCallError::io("failed to stat entry", e))?;
      let dir = metadata.is_dir();
      entries.push(DirEntry {
        name: entry.file_name().to_string_lossy().into_owned(),
        dir,
        size: (!dir).then(|| metadata.len()),
      });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
  }
}
