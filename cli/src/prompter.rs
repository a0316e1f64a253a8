// Console Prompter
// Scripted `-p` prompts first, then lines from stdin

use std::collections::VecDeque;
use std::io::Write;

use async_trait::async_trait;
use lathe_core::Prompter;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub struct ConsolePrompter<R> {
  scripted: VecDeque<String>,
  input: R,
}

impl<R> ConsolePrompter<R> {
  pub fn new(scripted: Vec<String>, input: R) -> Self {
    Self {
      scripted: scripted.into(),
      input,
    }
  }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Prompter for ConsolePrompter<R> {
  async fn next_prompt(&mut self) -> std::io::Result<Option<String>> {
    if let Some(prompt) = self.scripted.pop_front() {
      eprintln!("\nλ {prompt}");
      return Ok(Some(prompt));
    }

    let mut stderr = std::io::stderr();
    write!(stderr, "\nλ ")?;
    stderr.flush()?;

    let mut line = String::new();
    if self.input.read_line(&mut line).await? == 0 {
      return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
  }

  fn show_reply(&mut self, text: &str) {
    println!("{text}");
  }
}
