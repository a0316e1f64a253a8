mod common;

use std::sync::Arc;

use common::ScriptedProvider;
use lathe_config::Config;
use lathe_core::model::ModelProvider;
use lathe_core::tools::build_default_tools;
use lathe_core::tools::registry::ToolRegistry;
use lathe_core::tools::sandboxing::Sandbox;
use lathe_core::{Dispatcher, Thread};
use lathe_protocol::{Message, Role, ToolCallRequest, ToolCallResult};
use pretty_assertions::assert_eq;

fn dispatcher_over(registry: Arc<ToolRegistry>, thread: Arc<Thread>) -> Dispatcher {
  let provider: Arc<dyn ModelProvider> = ScriptedProvider::new(vec![]);
  Dispatcher::new(provider, registry, thread)
}

#[tokio::test]
async fn unknown_tool_in_empty_registry_yields_one_error_result() {
  let thread = Arc::new(Thread::in_memory());
  let dispatcher = dispatcher_over(Arc::new(ToolRegistry::new()), Arc::clone(&thread));

  let results = dispatcher
    .invoke_tools(&[ToolCallRequest::new("c1", "fs_frobnicate", "{}")])
    .await
    .expect("invoke");

  assert_eq!(
    results,
    vec![ToolCallResult::error("c1", "function not found")]
  );
  let messages = thread.snapshot().await;
  assert_eq!(messages.len(), 1);
  assert_eq!(messages[0].role, Role::ToolResult);
  assert_eq!(messages[0], Message::tool_results(results));
}

#[tokio::test]
async fn concurrent_writes_to_one_file_race_without_corruption() {
  let dir = tempfile::tempdir().expect("tempdir");
  let registry =
    build_default_tools(&Config::default(), Sandbox::new(dir.path())).expect("registry");
  let dispatcher = dispatcher_over(registry, Arc::new(Thread::in_memory()));

  let results = dispatcher
    .invoke_tools(&[
      ToolCallRequest::new("a", "fs_write", r#"{"path":"x.txt","contents":"A"}"#),
      ToolCallRequest::new("b", "fs_write", r#"{"path":"x.txt","contents":"B"}"#),
    ])
    .await
    .expect("invoke");

  assert_eq!(
    results,
    vec![
      ToolCallResult::success("a", "true"),
      ToolCallResult::success("b", "true"),
    ]
  );
  let content = std::fs::read_to_string(dir.path().join("x.txt")).expect("read");
  assert!(content == "A" || content == "B", "unexpected content {content:?}");
}

#[tokio::test]
async fn mixed_batch_reports_every_call_by_id() {
  let dir = tempfile::tempdir().expect("tempdir");
  std::fs::write(dir.path().join("present.txt"), "here").expect("write");
  let registry =
    build_default_tools(&Config::default(), Sandbox::new(dir.path())).expect("registry");
  let thread = Arc::new(Thread::in_memory());
  let dispatcher = dispatcher_over(registry, Arc::clone(&thread));

  let calls = vec![
    ToolCallRequest::new("ok", "fs_read", r#"{"path":"present.txt"}"#),
    ToolCallRequest::new("escape", "fs_read", r#"{"path":"../secret"}"#),
    ToolCallRequest::new("garbled", "fs_read", r#"{"path":"#),
    ToolCallRequest::new("missing", "fs_read", r#"{"path":"absent.txt"}"#),
    ToolCallRequest::new("unknown", "nope", "{}"),
  ];
  let results = dispatcher.invoke_tools(&calls).await.expect("invoke");

  assert_eq!(results.len(), calls.len());
  let ids: Vec<&str> = results.iter().map(|result| result.id.as_str()).collect();
  assert_eq!(ids, vec!["ok", "escape", "garbled", "missing", "unknown"]);
  assert_eq!(results[0], ToolCallResult::success("ok", "\"here\""));
  assert!(results[1..].iter().all(|result| result.is_error));
  assert!(results[2].content.starts_with("invalid arguments for fs_read"));
  assert_eq!(results[4].content, "function not found");
  assert_eq!(thread.len().await, 1);
}
