// Configuration Loader
// Layered configuration loading system

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::layered::{ConfigLayer, ConfigLayerSource, LayeredConfig};
use crate::types::{Config, ProviderKind};

const CONFIG_DIR: &str = ".lathe";
const CONFIG_FILE: &str = "config.toml";

/// Configuration loader with layered support
pub struct ConfigLoader {
  /// Global config directory
  global_dir: Option<PathBuf>,
  /// Project config directory
  project_dir: Option<PathBuf>,
}

impl ConfigLoader {
  /// Create a new configuration loader
  pub fn new() -> Self {
    Self {
      global_dir: dirs::home_dir().map(|home| home.join(CONFIG_DIR)),
      project_dir: None,
    }
  }

  /// Set project directory
  pub fn with_project_dir(mut self, dir: PathBuf) -> Self {
    self.project_dir = Some(dir);
    self
  }

  /// Replace the global config directory, `None` disables the global layer
  pub fn with_global_dir(mut self, dir: Option<PathBuf>) -> Self {
    self.global_dir = dir;
    self
  }

  /// Load configuration with CLI overrides
  pub fn load_with_cli_overrides(&self, cli_overrides: Vec<(String, String)>) -> Result<Config> {
    // Load layers in order:
    // 1. Built-in defaults (serde defaults)
    // 2. Global config (~/.lathe/config.toml)
    // 3. Project config (<cwd>/.lathe/config.toml)
    // 4. CLI overrides
    let mut layered = LayeredConfig::new();

    if let Some(global_dir) = &self.global_dir {
      let path = global_dir.join(CONFIG_FILE);
      if let Some(values) = read_layer(&path)? {
        layered.add_layer(ConfigLayer {
          source: ConfigLayerSource::GlobalConfig(path),
          values,
        });
      }
    }

    if let Some(project_dir) = &self.project_dir {
      let path = project_dir.join(CONFIG_DIR).join(CONFIG_FILE);
      if let Some(values) = read_layer(&path)? {
        layered.add_layer(ConfigLayer {
          source: ConfigLayerSource::ProjectConfig(path),
          values,
        });
      }
    }

    for source in layered.sources() {
      debug!(?source, "loaded config layer");
    }

    let mut config: Config = toml::Value::Table(layered.merge())
      .try_into()
      .context("invalid configuration")?;

    for (key, value) in cli_overrides {
      config = apply_override(config, &key, &value)?;
    }

    Ok(config)
  }
}

impl Default for ConfigLoader {
  fn default() -> Self {
    Self::new()
  }
}

fn read_layer(path: &Path) -> Result<Option<toml::Table>> {
  if !path.exists() {
    return Ok(None);
  }
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read config {}", path.display()))?;
  let values: toml::Table =
    toml::from_str(&content).with_context(|| format!("failed to parse config {}", path.display()))?;
  Ok(Some(values))
}

/// Split a `key=value` CLI override.
pub fn parse_override(raw: &str) -> Result<(String, String)> {
  let (key, value) = raw
    .split_once('=')
    .with_context(|| format!("Invalid override '{raw}', expected KEY=VALUE"))?;
  let key = key.trim();
  if key.is_empty() {
    anyhow::bail!("Invalid override '{raw}', key is empty");
  }
  Ok((key.to_string(), value.trim().to_string()))
}

/// Apply a single CLI override
fn apply_override(mut config: Config, key: &str, value: &str) -> Result<Config> {
  match key {
    "model.provider" => {
      config.model.provider = value.parse::<ProviderKind>()?;
    }
    "model.model" => {
      config.model.model = Some(value.to_string());
    }
    "model.max_tokens" => {
      config.model.max_tokens = parse_value(key, value)?;
    }
    "model.base_url" => {
      config.model.base_url = Some(value.to_string());
    }
    "model.system_prompt" => {
      config.model.system_prompt = Some(value.to_string());
    }
    "rate_limit.requests_per_second" => {
      let rate: f64 = parse_value(key, value)?;
      if !(rate.is_finite() && rate > 0.0) {
        anyhow::bail!("Invalid value for {key}: {value} (must be positive)");
      }
      config.rate_limit.requests_per_second = rate;
    }
    "rate_limit.burst" => {
      config.rate_limit.burst = parse_value(key, value)?;
    }
    "retry.backoff_ms" => {
      config.retry.backoff_ms = parse_value(key, value)?;
    }
    "retry.max_attempts" => {
      config.retry.max_attempts = parse_value(key, value)?;
    }
    "thread.file" => {
      config.thread.file = PathBuf::from(value);
    }
    "thread.persist" => {
      config.thread.persist = parse_value(key, value)?;
    }
    "tools.python" => {
      config.tools.python = value.to_string();
    }
    _ => {
      anyhow::bail!("Unknown config key: {}", key);
    }
  }
  Ok(config)
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  value
    .parse::<T>()
    .with_context(|| format!("Invalid value for {key}: {value}"))
}
