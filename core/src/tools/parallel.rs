// Parallel Execution
// Runs one model turn's tool calls concurrently and collects their results

use std::sync::Arc;

use lathe_protocol::{ToolCallRequest, ToolCallResult};
use tokio::task::JoinSet;
use tracing::{error, warn};

use crate::tools::context::ToolInvocation;
use crate::tools::registry::ToolRegistry;

/// Tool call runtime for parallel execution
#[derive(Clone)]
pub struct ToolCallRuntime {
  registry: Arc<ToolRegistry>,
}

impl ToolCallRuntime {
  pub fn new(registry: Arc<ToolRegistry>) -> Self {
    Self { registry }
  }

  /// Execute every call concurrently and wait for all of them.
  ///
  /// Exactly one result comes back per call, in call order, each carrying
  /// its call's id. A failing or panicking call never cancels its siblings.
  pub async fn invoke_batch(&self, calls: &[ToolCallRequest]) -> Vec<ToolCallResult> {
    let mut slots: Vec<Option<ToolCallResult>> = vec![None; calls.len()];
    let mut tasks = JoinSet::new();

    for (index, call) in calls.iter().enumerate() {
      let registry = Arc::clone(&self.registry);
      let invocation = ToolInvocation::from(call);
      tasks.spawn(async move {
        let id = invocation.id.clone();
        let result = match registry.dispatch(invocation).await {
          Ok(value) => ToolCallResult::success(id, value.to_string()),
          Err(err) => ToolCallResult::error(id, err.to_string()),
        };
        (index, result)
      });
    }

    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok((index, result)) => slots[index] = Some(result),
        Err(err) => error!("tool task aborted: {err}"),
      }
    }

    let results: Vec<ToolCallResult> = slots
      .into_iter()
      .zip(calls)
      .map(|(slot, call)| {
        slot.unwrap_or_else(|| ToolCallResult::error(&call.id, "tool call aborted"))
      })
      .collect();

    report_failures(calls, &results);
    results
  }
}

fn report_failures(calls: &[ToolCallRequest], results: &[ToolCallResult]) {
  let failures: Vec<String> = calls
    .iter()
    .zip(results)
    .filter(|(_, result)| result.is_error)
    .map(|(call, result)| format!("{}: {}", call.signature(), result.content))
    .collect();

  if !failures.is_empty() {
    warn!(
      "{}/{} tool calls failed:\n{}",
      failures.len(),
      calls.len(),
      failures.join("\n")
    );
  }
}
