mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{ScriptedPrompter, ScriptedProvider, failure, text_reply, tool_reply};
use lathe_config::{Config, ModelConfig};
use lathe_core::model::ModelProvider;
use lathe_core::tools::build_default_tools;
use lathe_core::tools::registry::ToolRegistry;
use lathe_core::tools::sandboxing::Sandbox;
use lathe_core::{DispatchError, Dispatcher, RateLimiter, RetryPolicy, Thread};
use lathe_protocol::{Message, Role, ToolCallRequest, ToolCallResult};
use pretty_assertions::assert_eq;

fn unpaced() -> Arc<RateLimiter> {
  Arc::new(RateLimiter::new(0.0, 1))
}

fn dispatcher(
  provider: Arc<ScriptedProvider>,
  registry: Arc<ToolRegistry>,
  thread: Arc<Thread>,
) -> Dispatcher {
  let provider: Arc<dyn ModelProvider> = provider;
  Dispatcher::new(provider, registry, thread)
    .with_rate_limiter(unpaced())
    .with_retry(RetryPolicy::unbounded(Duration::from_millis(1)))
}

#[tokio::test]
async fn text_reply_hands_control_back_to_the_user() {
  let provider = ScriptedProvider::new(vec![text_reply("hi there")]);
  let thread = Arc::new(Thread::in_memory());
  let dispatcher = dispatcher(
    Arc::clone(&provider),
    Arc::new(ToolRegistry::new()),
    Arc::clone(&thread),
  );
  let mut prompter = ScriptedPrompter::new(&["hello"]);

  dispatcher.run(&mut prompter).await.expect("run");

  assert_eq!(
    thread.snapshot().await,
    vec![
      Message::user("hello"),
      Message::assistant(Some("hi there".to_string()), vec![]),
    ]
  );
  assert_eq!(prompter.replies, vec!["hi there".to_string()]);
  assert_eq!(prompter.asked, 2);
  assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn tool_batches_loop_without_prompting() {
  let dir = tempfile::tempdir().expect("tempdir");
  let registry =
    build_default_tools(&Config::default(), Sandbox::new(dir.path())).expect("registry");
  let provider = ScriptedProvider::new(vec![
    tool_reply(vec![ToolCallRequest::new(
      "w1",
      "fs_write",
      r#"{"path":"notes/todo.txt","contents":"ship it"}"#,
    )]),
    tool_reply(vec![ToolCallRequest::new(
      "r1",
      "fs_read",
      r#"{"path":"notes/todo.txt"}"#,
    )]),
    text_reply("done"),
  ]);
  let thread = Arc::new(Thread::in_memory());
  let dispatcher = dispatcher(Arc::clone(&provider), registry, Arc::clone(&thread));
  let mut prompter = ScriptedPrompter::new(&["write a todo"]);

  dispatcher.run(&mut prompter).await.expect("run");

  let messages = thread.snapshot().await;
  let roles: Vec<Role> = messages.iter().map(|message| message.role).collect();
  assert_eq!(
    roles,
    vec![
      Role::User,
      Role::Assistant,
      Role::ToolResult,
      Role::Assistant,
      Role::ToolResult,
      Role::Assistant,
    ]
  );
  assert_eq!(
    messages[2].tool_results_iter().cloned().collect::<Vec<_>>(),
    vec![ToolCallResult::success("w1", "true")]
  );
  assert_eq!(
    messages[4].tool_results_iter().cloned().collect::<Vec<_>>(),
    vec![ToolCallResult::success("r1", "\"ship it\"")]
  );
  assert_eq!(
    std::fs::read_to_string(dir.path().join("notes/todo.txt")).expect("read"),
    "ship it"
  );
  assert_eq!(prompter.asked, 2);
  assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn every_request_carries_thread_tools_and_system_prompt() {
  let dir = tempfile::tempdir().expect("tempdir");
  let registry =
    build_default_tools(&Config::default(), Sandbox::new(dir.path())).expect("registry");
  let provider = ScriptedProvider::new(vec![text_reply("ok")]);
  let thread = Arc::new(Thread::in_memory());
  let model = ModelConfig {
    model: Some("test-model".to_string()),
    max_tokens: 321,
    system_prompt: Some("answer tersely".to_string()),
    ..ModelConfig::default()
  };
  let dispatcher =
    dispatcher(Arc::clone(&provider), registry, Arc::clone(&thread)).with_model_config(&model);

  dispatcher.interact("status?").await.expect("interact");

  let requests = provider.requests();
  assert_eq!(requests.len(), 1);
  assert_eq!(requests[0].model, "test-model");
  assert_eq!(requests[0].max_tokens, 321);
  assert_eq!(requests[0].system.as_deref(), Some("answer tersely"));
  assert_eq!(requests[0].messages, vec![Message::user("status?")]);
  assert_eq!(requests[0].tools.len(), 9);
  assert_eq!(requests[0].tools[0].name, "fs_list");
  assert_eq!(dispatcher.tool_definitions(), requests[0].tools.as_slice());
}

#[tokio::test]
async fn failed_completions_are_retried_until_one_succeeds() {
  let provider = ScriptedProvider::new(vec![
    failure("connection reset"),
    failure("HTTP 529"),
    failure("timeout"),
    text_reply("finally"),
  ]);
  let thread = Arc::new(Thread::in_memory());
  let dispatcher = dispatcher(
    Arc::clone(&provider),
    Arc::new(ToolRegistry::new()),
    Arc::clone(&thread),
  );

  let reply = dispatcher.interact("ping").await.expect("interact");

  assert_eq!(reply.text(), Some("finally".to_string()));
  assert_eq!(provider.calls(), 4);
  // failures leave no trace in the thread
  assert_eq!(thread.len().await, 2);
  let requests = provider.requests();
  assert!(requests.iter().all(|request| request.messages == requests[0].messages));
}

#[tokio::test]
async fn limited_retry_policy_gives_up() {
  let provider = ScriptedProvider::new(vec![failure("down"), failure("still down")]);
  let thread = Arc::new(Thread::in_memory());
  let dispatcher = dispatcher(
    Arc::clone(&provider),
    Arc::new(ToolRegistry::new()),
    Arc::clone(&thread),
  )
  .with_retry(RetryPolicy::limited(Duration::from_millis(1), 2));

  let err = dispatcher.interact("ping").await.expect_err("exhausted");

  assert!(matches!(err, DispatchError::RetriesExhausted { attempts: 2, .. }));
  assert_eq!(provider.calls(), 2);
  assert_eq!(thread.snapshot().await, vec![Message::user("ping")]);
}

#[tokio::test]
async fn blank_prompts_are_skipped() {
  let provider = ScriptedProvider::new(vec![text_reply("yes")]);
  let thread = Arc::new(Thread::in_memory());
  let dispatcher = dispatcher(
    Arc::clone(&provider),
    Arc::new(ToolRegistry::new()),
    Arc::clone(&thread),
  );
  let mut prompter = ScriptedPrompter::new(&["", "   ", "  real question \n"]);

  dispatcher.run(&mut prompter).await.expect("run");

  assert_eq!(
    thread.snapshot().await.first(),
    Some(&Message::user("real question"))
  );
  assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn restored_thread_awaiting_a_reply_is_answered_first() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("thread.lathe.json");
  std::fs::write(
    &path,
    serde_json::to_vec(&vec![Message::user("left hanging")]).expect("encode"),
  )
  .expect("seed thread");

  let provider = ScriptedProvider::new(vec![text_reply("sorry, here")]);
  let thread = Arc::new(Thread::load(&path).await.expect("load"));
  let dispatcher = dispatcher(
    Arc::clone(&provider),
    Arc::new(ToolRegistry::new()),
    Arc::clone(&thread),
  );
  let mut prompter = ScriptedPrompter::new(&[]);

  dispatcher.run(&mut prompter).await.expect("run");

  assert_eq!(provider.calls(), 1);
  assert_eq!(prompter.replies, vec!["sorry, here".to_string()]);
  let on_disk: Vec<Message> =
    serde_json::from_slice(&std::fs::read(&path).expect("read")).expect("parse");
  assert_eq!(on_disk, thread.snapshot().await);
  assert_eq!(on_disk.len(), 2);
}

#[tokio::test]
async fn restored_thread_ending_with_assistant_waits_for_input() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("thread.lathe.json");
  let seeded = vec![
    Message::user("hi"),
    Message::assistant(Some("hello".to_string()), vec![]),
  ];
  std::fs::write(&path, serde_json::to_vec(&seeded).expect("encode")).expect("seed thread");

  let provider = ScriptedProvider::new(vec![]);
  let thread = Arc::new(Thread::load(&path).await.expect("load"));
  let dispatcher = dispatcher(
    Arc::clone(&provider),
    Arc::new(ToolRegistry::new()),
    Arc::clone(&thread),
  );

  dispatcher
    .run(&mut ScriptedPrompter::new(&[]))
    .await
    .expect("run");

  assert_eq!(provider.calls(), 0);
  assert_eq!(thread.snapshot().await, seeded);
}

#[tokio::test(start_paused = true)]
async fn completions_are_paced_by_the_shared_limiter() {
  let provider = ScriptedProvider::new(vec![
    text_reply("one"),
    text_reply("two"),
    text_reply("three"),
  ]);
  let limiter = Arc::new(RateLimiter::new(2.0, 1));
  let provider_dyn: Arc<dyn ModelProvider> = provider.clone();
  let dispatcher = Dispatcher::new(
    provider_dyn,
    Arc::new(ToolRegistry::new()),
    Arc::new(Thread::in_memory()),
  )
  .with_rate_limiter(limiter);

  let start = tokio::time::Instant::now();
  for prompt in ["a", "b", "c"] {
    dispatcher.interact(prompt).await.expect("interact");
  }

  assert_eq!(start.elapsed(), Duration::from_secs(1));
  assert_eq!(provider.calls(), 3);
}
