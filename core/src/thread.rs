// Conversation Thread
// Ordered message history, rewritten to disk after every append

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use lathe_protocol::{Message, Role};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ThreadError {
  #[error("failed to read thread {path}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },

  #[error("failed to parse thread {path}: {source}")]
  Parse {
    path: PathBuf,
    source: serde_json::Error,
  },

  #[error("failed to encode thread: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("failed to write thread {path}: {source}")]
  Write {
    path: PathBuf,
    source: std::io::Error,
  },
}

/// Ordered message history shared by the dispatcher and its tool batches.
///
/// Appends are serialized; each one pushes the message and, when the thread
/// is file-backed, rewrites the whole file before the lock is released.
pub struct Thread {
  path: Option<PathBuf>,
  messages: Mutex<Vec<Message>>,
}

impl Thread {
  /// Thread that lives only for this process.
  pub fn in_memory() -> Self {
    Self {
      path: None,
      messages: Mutex::new(Vec::new()),
    }
  }

  /// Open a file-backed thread; a missing file starts an empty one.
  pub async fn load(path: impl Into<PathBuf>) -> Result<Self, ThreadError> {
    let path = path.into();
    let messages = match tokio::fs::read(&path).await {
      Ok(bytes) => serde_json::from_slice::<Vec<Message>>(&bytes).map_err(|source| {
        ThreadError::Parse {
          path: path.clone(),
          source,
        }
      })?,
      Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
      Err(source) => return Err(ThreadError::Read { path, source }),
    };

    debug!(path = %path.display(), messages = messages.len(), "thread loaded");
    Ok(Self {
      path: Some(path),
      messages: Mutex::new(messages),
    })
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }

  pub async fn append(&self, message: Message) -> Result<(), ThreadError> {
    let mut messages = self.messages.lock().await;
    log_message(&message);
    messages.push(message);

    if let Some(path) = &self.path {
      persist(path, &messages).await?;
    }
    Ok(())
  }

  pub async fn snapshot(&self) -> Vec<Message> {
    self.messages.lock().await.clone()
  }

  pub async fn last(&self) -> Option<Message> {
    self.messages.lock().await.last().cloned()
  }

  pub async fn len(&self) -> usize {
    self.messages.lock().await.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.messages.lock().await.is_empty()
  }
}

async fn persist(path: &Path, messages: &[Message]) -> Result<(), ThreadError> {
  let bytes = serde_json::to_vec_pretty(messages)?;

  // write a sibling file then rename, so a crash never leaves half a thread
  let mut staging = path.as_os_str().to_owned();
  staging.push(".tmp");
  let staging = PathBuf::from(staging);

  let write_error = |source| ThreadError::Write {
    path: path.to_path_buf(),
    source,
  };
  tokio::fs::write(&staging, &bytes).await.map_err(write_error)?;
  tokio::fs::rename(&staging, path).await.map_err(write_error)
}

fn log_message(message: &Message) {
  match message.role {
    Role::User => debug!(role = message.role.as_str(), "{}", message.text().unwrap_or_default()),
    Role::Assistant => {
      if let Some(text) = message.text() {
        info!(role = message.role.as_str(), "{text}");
      }
      for call in message.tool_calls() {
        debug!(role = message.role.as_str(), "requested {}", call.signature());
      }
    }
    Role::ToolResult => {
      for result in message.tool_results_iter() {
        debug!(
          role = message.role.as_str(),
          call_id = %result.id,
          is_error = result.is_error,
          "{}",
          result.content
        );
      }
    }
    Role::System => debug!(role = message.role.as_str(), "system message appended"),
  }
}
