// Lathe CLI - Command Line Interface Entry Point

mod prompter;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lathe_config::{Config, ConfigLoader, ProviderKind, parse_override};
use lathe_core::model::build_provider;
use lathe_core::tools::build_default_tools;
use lathe_core::tools::sandboxing::Sandbox;
use lathe_core::{Dispatcher, RateLimiter, Thread};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::prompter::ConsolePrompter;

/// Lathe - tool-using conversational agent over a working directory
#[derive(Parser, Debug)]
#[command(name = "lathe")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Prompt to send before reading stdin; repeatable, used in order
  #[arg(short = 'p', long = "prompt")]
  prompts: Vec<String>,

  /// API token, or `$NAME` to read it from an environment variable
  #[arg(short = 't', long = "token")]
  token: Option<String>,

  /// Model name
  #[arg(short = 'm', long = "model")]
  model: Option<String>,

  /// Completion provider
  #[arg(long = "provider")]
  provider: Option<ProviderKind>,

  /// Working directory; sandbox root and home of the thread file
  #[arg(short = 'w', long = "cwd", default_value = ".")]
  cwd: PathBuf,

  /// Configuration override in key=value format
  #[arg(short = 'c', long = "config", value_name = "KEY=VALUE")]
  overrides: Vec<String>,

  /// Debug logging
  #[arg(short = 'v', long = "verbose")]
  verbose: bool,
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  if let Err(err) = run(cli).await {
    error!("{err:#}");
    std::process::exit(1);
  }
}

fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

async fn run(cli: Cli) -> Result<()> {
  let cwd = prepare_cwd(&cli.cwd)?;
  let config = load_config(&cli, ConfigLoader::new().with_project_dir(cwd.clone()))?;
  let token = resolve_token(
    cli.token.as_deref(),
    &config.model.api_key_env(),
    |name| std::env::var(name).ok(),
  )?;

  let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
  let thread = Arc::new(if config.thread.persist {
    Thread::load(cwd.join(&config.thread.file)).await?
  } else {
    Thread::in_memory()
  });
  let registry = build_default_tools(&config, Sandbox::new(&cwd))?;
  let provider = build_provider(&config.model, token);

  info!(
    provider = provider.provider_id(),
    model = %config.model.model_name(),
    cwd = %cwd.display(),
    messages = thread.len().await,
    "lathe starting"
  );

  let dispatcher = Dispatcher::from_config(&config, provider, registry, thread, limiter);
  let mut prompter = ConsolePrompter::new(
    cli.prompts,
    tokio::io::BufReader::new(tokio::io::stdin()),
  );
  dispatcher.run(&mut prompter).await?;
  Ok(())
}

fn prepare_cwd(cwd: &Path) -> Result<PathBuf> {
  std::fs::create_dir_all(cwd)
    .with_context(|| format!("failed to create working directory {}", cwd.display()))?;
  cwd
    .canonicalize()
    .with_context(|| format!("failed to resolve working directory {}", cwd.display()))
}

fn load_config(cli: &Cli, loader: ConfigLoader) -> Result<Config> {
  let mut overrides = cli
    .overrides
    .iter()
    .map(String::as_str)
    .map(parse_override)
    .collect::<Result<Vec<_>>>()?;

  // dedicated flags win over -c
  if let Some(provider) = cli.provider {
    overrides.push((
      "model.provider".to_string(),
      provider_name(provider).to_string(),
    ));
  }
  if let Some(model) = &cli.model {
    overrides.push(("model.model".to_string(), model.clone()));
  }

  loader.load_with_cli_overrides(overrides)
}

fn provider_name(provider: ProviderKind) -> &'static str {
  match provider {
    ProviderKind::Anthropic => "anthropic",
    ProviderKind::OpenAi => "openai",
  }
}

/// A token of the form `$NAME` is read from the environment.
fn resolve_token(
  token: Option<&str>,
  default_env: &str,
  lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
  let token = match token {
    Some(token) => token.to_string(),
    None => format!("${default_env}"),
  };

  let Some(name) = token.strip_prefix('$') else {
    return Ok(token);
  };
  match lookup(name).filter(|value| !value.trim().is_empty()) {
    Some(value) => Ok(value),
    None => anyhow::bail!("environment variable {name} is empty; set it or pass --token"),
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn env(name: &str) -> Option<String> {
    (name == "LATHE_TEST_KEY").then(|| "sk-from-env".to_string())
  }

  #[test]
  fn literal_token_is_used_verbatim() {
    assert_eq!(
      resolve_token(Some("sk-literal"), "ANTHROPIC_API_KEY", env).expect("token"),
      "sk-literal"
    );
  }

  #[test]
  fn dollar_token_reads_the_environment() {
    assert_eq!(
      resolve_token(Some("$LATHE_TEST_KEY"), "ANTHROPIC_API_KEY", env).expect("token"),
      "sk-from-env"
    );
    assert_eq!(
      resolve_token(None, "LATHE_TEST_KEY", env).expect("token"),
      "sk-from-env"
    );
  }

  #[test]
  fn empty_variable_is_fatal() {
    let err = resolve_token(None, "UNSET_KEY", env).expect_err("missing");
    assert!(err.to_string().contains("UNSET_KEY"));
  }

  #[test]
  fn flags_parse() {
    let cli = Cli::try_parse_from([
      "lathe",
      "-p",
      "one",
      "-p",
      "two",
      "--provider",
      "openai",
      "-w",
      "/tmp/work",
      "-c",
      "retry.backoff_ms=5",
    ])
    .expect("parse");

    assert_eq!(cli.prompts, vec!["one".to_string(), "two".to_string()]);
    assert_eq!(cli.provider, Some(ProviderKind::OpenAi));
    assert_eq!(cli.cwd, PathBuf::from("/tmp/work"));
    assert_eq!(cli.overrides, vec!["retry.backoff_ms=5".to_string()]);
  }

  #[test]
  fn dedicated_flags_override_config_keys() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cli = Cli::try_parse_from([
      "lathe",
      "-c",
      "model.model=from-config",
      "-m",
      "from-flag",
      "--provider",
      "openai",
    ])
    .expect("parse");

    let loader = ConfigLoader::new()
      .with_global_dir(None)
      .with_project_dir(dir.path().to_path_buf());
    let config = load_config(&cli, loader).expect("config");
    assert_eq!(config.model.model_name(), "from-flag");
    assert_eq!(config.model.provider, ProviderKind::OpenAi);
  }

  #[test]
  fn working_directory_is_created_and_absolute() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cwd = prepare_cwd(&dir.path().join("nested/work")).expect("cwd");
    assert!(cwd.is_absolute());
    assert!(cwd.is_dir());
  }
}
