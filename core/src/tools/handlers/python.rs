use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::tools::context::{FunctionCallError, ToolContext};
use crate::tools::registry::TypedToolHandler;

pub struct PythonHandler {
  ctx: Arc<ToolContext>,
}

impl PythonHandler {
  pub fn new(ctx: Arc<ToolContext>) -> Self {
    Self { ctx }
  }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PythonArgs {
  /// Script file relative to the working directory; `.py` is appended when missing
  pub script_name: String,
  pub code: String,
}

#[async_trait]
impl TypedToolHandler for PythonHandler {
  type Args = PythonArgs;
  type Output = Value;

  async fn call(&self, args: PythonArgs) -> Result<Value, FunctionCallError> {
    let mut path = self.ctx.sandbox.resolve(&args.script_name)?;
    // `.py` on the root itself would land next to the sandbox
    if path == self.ctx.sandbox.root() {
      return Err(FunctionCallError::Execution(
        "script_name must name a file".to_string(),
      ));
    }
    if path.extension().is_none_or(|ext| ext != "py") {
      path.as_mut_os_string().push(".py");
    }

    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| FunctionCallError::io("failed to create script directory", e))?;
    }
    tokio::fs::write(&path, args.code.as_bytes())
      .await
      .map_err(|e| FunctionCallError::io("write python code", e))?;

    debug!(script = %path.display(), interpreter = %self.ctx.python, "running python script");
    let output = tokio::process::Command::new(&self.ctx.python)
      .arg(&path)
      .current_dir(self.ctx.sandbox.root())
      .kill_on_drop(true)
      .output()
      .await
      .map_err(|e| FunctionCallError::io("run python code", e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
      return Err(FunctionCallError::Execution(format!(
        "run python code: {}\n{}",
        output.status,
        stderr.trim_end()
      )));
    }
    if stdout.is_empty() && stderr.is_empty() {
      return Ok(Value::String("ok".to_string()));
    }
    Ok(json!({ "stdout": stdout, "stderr": stderr }))
  }
}
