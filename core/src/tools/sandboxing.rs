// Sandboxing
// Confines tool-supplied paths to the working directory

use std::path::{Component, Path, PathBuf};

/// Rejected path request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
  #[error("absolute paths are not allowed: {0}")]
  AbsolutePath(String),

  #[error("path must not contain '..': {0}")]
  ParentTraversal(String),
}

/// Working directory every file-touching tool resolves against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sandbox {
  root: PathBuf,
}

impl Sandbox {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Map a model-supplied relative path onto the sandbox root.
  ///
  /// `/` means the root itself. Absolute paths are refused, as is any path
  /// whose text contains `..` anywhere, even inside a file name like `a..b`.
  /// Symlinks are not resolved.
  pub fn resolve(&self, requested: &str) -> Result<PathBuf, SandboxError> {
    let requested = if requested == "/" { "." } else { requested };

    if Path::new(requested).is_absolute() {
      return Err(SandboxError::AbsolutePath(requested.to_string()));
    }
    if requested.contains("..") {
      return Err(SandboxError::ParentTraversal(requested.to_string()));
    }

    let mut resolved = self.root.clone();
    for component in Path::new(requested).components() {
      match component {
        Component::Normal(part) => resolved.push(part),
        Component::CurDir => {}
        // root or drive prefixes sneaking past `is_absolute`
        Component::RootDir | Component::Prefix(_) => {
          return Err(SandboxError::AbsolutePath(requested.to_string()));
        }
        Component::ParentDir => {
          return Err(SandboxError::ParentTraversal(requested.to_string()));
        }
      }
    }
    Ok(resolved)
  }
}
