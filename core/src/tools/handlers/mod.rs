pub mod list_dir;
pub mod move_file;
pub mod python;
pub mod read_file;
pub mod remove_file;
pub mod sql;
pub mod tree;
pub mod write_file;

use std::sync::Arc;

use crate::tools::context::ToolContext;
use crate::tools::registry::{RegistryError, ToolRegistry};

/// Built-in tool catalogue, in the order tools are advertised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTool {
  FsList,
  FsTree,
  FsRead,
  FsWrite,
  FsMove,
  FsRemove,
  SqlExec,
  SqlQuery,
  PythonExecute,
}

impl BuiltinTool {
  pub const ALL: [BuiltinTool; 9] = [
    BuiltinTool::FsList,
    BuiltinTool::FsTree,
    BuiltinTool::FsRead,
    BuiltinTool::FsWrite,
    BuiltinTool::FsMove,
    BuiltinTool::FsRemove,
    BuiltinTool::SqlExec,
    BuiltinTool::SqlQuery,
    BuiltinTool::PythonExecute,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      BuiltinTool::FsList => "fs_list",
      BuiltinTool::FsTree => "fs_tree",
      BuiltinTool::FsRead => "fs_read",
      BuiltinTool::FsWrite => "fs_write",
      BuiltinTool::FsMove => "fs_move",
      BuiltinTool::FsRemove => "fs_remove",
      BuiltinTool::SqlExec => "sql_exec",
      BuiltinTool::SqlQuery => "sql_query",
      BuiltinTool::PythonExecute => "python_execute",
    }
  }

  pub fn description(&self) -> &'static str {
    match self {
      BuiltinTool::FsList => "Filesystem: list the entries of a directory",
      BuiltinTool::FsTree => {
        "Filesystem: list a directory recursively. A good starting point for exploring."
      }
      BuiltinTool::FsRead => {
        "Filesystem: read a text file. Avoid large files and binary formats such as images."
      }
      BuiltinTool::FsWrite => "Filesystem: write or append to a file",
      BuiltinTool::FsMove => "Filesystem: move or rename a file",
      BuiltinTool::FsRemove => "Filesystem: remove a file or an empty directory",
      BuiltinTool::SqlExec => {
        "SQLite: execute a statement and report rows affected and the last insert id"
      }
      BuiltinTool::SqlQuery => "SQLite: run a query and return the rows",
      BuiltinTool::PythonExecute => "Execute python code. Especially useful for math.",
    }
  }
}

pub fn register_builtin_handlers(
  registry: &mut ToolRegistry,
  ctx: &Arc<ToolContext>,
) -> Result<(), RegistryError> {
  for tool in BuiltinTool::ALL {
    let ctx = Arc::clone(ctx);
    let (name, description) = (tool.name(), tool.description());
    match tool {
      BuiltinTool::FsList => {
        registry.register(name, description, list_dir::ListDirHandler::new(ctx))?
      }
      BuiltinTool::FsTree => registry.register(name, description, tree::TreeHandler::new(ctx))?,
      BuiltinTool::FsRead => {
        registry.register(name, description, read_file::ReadFileHandler::new(ctx))?
      }
      BuiltinTool::FsWrite => {
        registry.register(name, description, write_file::WriteFileHandler::new(ctx))?
      }
      BuiltinTool::FsMove => {
        registry.register(name, description, move_file::MoveFileHandler::new(ctx))?
      }
      BuiltinTool::FsRemove => {
        registry.register(name, description, remove_file::RemoveFileHandler::new(ctx))?
      }
      BuiltinTool::SqlExec => registry.register(name, description, sql::SqlExecHandler::new(ctx))?,
      BuiltinTool::SqlQuery => {
        registry.register(name, description, sql::SqlQueryHandler::new(ctx))?
      }
      BuiltinTool::PythonExecute => {
        registry.register(name, description, python::PythonHandler::new(ctx))?
      }
    }
  }
  Ok(())
}

#[cfg(test)]
pub(crate) fn test_context() -> (tempfile::TempDir, Arc<ToolContext>) {
  let dir = tempfile::tempdir().expect("tempdir");
  let ctx = ToolContext::new(crate::tools::sandboxing::Sandbox::new(dir.path()));
  (dir, ctx)
}
