use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::context::{FunctionCallError, ToolContext};
use crate::tools::registry::TypedToolHandler;

/// Recursive listing in the shape of `tree -J`.
pub struct TreeHandler {
  ctx: Arc<ToolContext>,
}

impl TreeHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TreeArgs {
  /// Directory relative to the working directory, `/` for the root
  pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
  Directory {
    name: String,
    contents: Vec<TreeNode>,
  },
  File {
    name: String,
    size: u64,
  },
  Link {
    name: String,
  },
  Report {
    directories: u64,
    files: u64,
  },
}

#[derive(Default)]
struct Counts {
  directories: u64,
  files: u64,
}

#[async_trait]
impl TypedToolHandler for TreeHandler {
  type Args = TreeArgs;
  type Output = Vec<TreeNode>;

  async fn call(&self, args: TreeArgs) -> Result<Vec<TreeNode>, FunctionCallError> {
    let root = self.ctx.sandbox.resolve(&args.path)?;
    let label = args.path.clone();

    tokio::task::spawn_blocking(move || {
      let metadata = std::fs::metadata(&root)
        .map_err(|e| FunctionCallError::io(&format!("failed to open {label}"), e))?;
      if !metadata.is_dir() {
        return Err(FunctionCallError::Execution(format!(
          "{label} is not a directory"
        )));
      }

      let mut counts = Counts::default();
      let contents = walk(&root, &mut counts)?;
      Ok(vec![
        TreeNode::Directory {
          name: label,
          contents,
        },
        TreeNode::Report {
          directories: counts.directories,
          files: counts.files,
        },
      ])
    })
    .await
    .map_err(|e| FunctionCallError::Execution(format!("tree walk aborted: {e}")))?
  }
}

fn walk(dir: &Path, counts: &mut Counts) -> Result<Vec<TreeNode>, FunctionCallError> {
  let read_error =
    |e: std::io::Error| FunctionCallError::io(&format!("failed to read {}", dir.display()), e);

  let mut entries = std::fs::read_dir(dir)
    .map_err(read_error)?
    .collect::<Result<Vec<_>, _>>()
    .map_err(read_error)?;
  entries.sort_by_key(|entry| entry.file_name());

  let mut nodes = Vec::with_capacity(entries.len());
  for entry in entries {
    let name = entry.file_name().to_string_lossy().into_owned();
    // hidden entries are skipped, as tree does by default
    if name.starts_with('.') {
      continue;
    }

    let file_type = entry.file_type().map_err(read_error)?;
    if file_type.is_symlink() {
      counts.files += 1;
      nodes.push(TreeNode::Link { name });
    } else if file_type.is_dir() {
      counts.directories += 1;
      let contents = walk(&entry.path(), counts)?;
      nodes.push(TreeNode::Directory { name, contents });
    } else {
      counts.files += 1;
      let size = entry.metadata().map_err(read_error)?.len();
      nodes.push(TreeNode::File { name, size });
    }
  }
  Ok(nodes)
}
