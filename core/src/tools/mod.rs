pub mod context;
pub mod handlers;
pub mod parallel;
pub mod registry;
pub mod sandboxing;
pub mod spec;

use std::sync::Arc;

use lathe_config::Config;

use crate::tools::context::ToolContext;
use crate::tools::registry::{RegistryError, ToolRegistry};
use crate::tools::sandboxing::Sandbox;

pub use context::{FunctionCallError, ToolInvocation};
pub use parallel::ToolCallRuntime;
pub use registry::{ToolHandler, TypedToolHandler};
pub use sandboxing::SandboxError;

/// Build the built-in tool registry rooted at the sandbox.
pub fn build_default_tools(
  config: &Config,
  sandbox: Sandbox,
) -> Result<Arc<ToolRegistry>, RegistryError> {
  let ctx = ToolContext::with_python(sandbox, config.tools.python.clone());
  let mut registry = ToolRegistry::new();
  handlers::register_builtin_handlers(&mut registry, &ctx)?;
  Ok(Arc::new(registry))
}
