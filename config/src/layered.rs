// Layered Configuration
// Support for layered configuration with precedence

use std::path::PathBuf;

/// Layered configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct LayeredConfig {
  /// Configuration layers, lowest precedence first
  layers: Vec<ConfigLayer>,
}

/// Configuration layer with source tracking
#[derive(Debug, Clone)]
pub struct ConfigLayer {
  /// Layer source
  pub source: ConfigLayerSource,
  /// Configuration values
  pub values: toml::Table,
}

/// Configuration layer source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayerSource {
  /// Global user config
  GlobalConfig(PathBuf),
  /// Project-specific config
  ProjectConfig(PathBuf),
}

impl LayeredConfig {
  /// Create a new layered configuration
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a layer on top of the existing ones
  pub fn add_layer(&mut self, layer: ConfigLayer) {
    self.layers.push(layer);
  }

  pub fn sources(&self) -> impl Iterator<Item = &ConfigLayerSource> {
    self.layers.iter().map(|layer| &layer.source)
  }

  /// Get merged configuration; later layers win key by key, tables merge recursively
  pub fn merge(&self) -> toml::Table {
    let mut merged = toml::Table::new();
    for layer in &self.layers {
      merge_tables(&mut merged, &layer.values);
    }
    merged
  }
}

fn merge_tables(base: &mut toml::Table, overlay: &toml::Table) {
  for (key, value) in overlay {
    match (base.get_mut(key), value) {
      (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
        merge_tables(existing, incoming);
      }
      _ => {
        base.insert(key.clone(), value.clone());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn layer(source: ConfigLayerSource, text: &str) -> ConfigLayer {
    ConfigLayer {
      source,
      values: toml::from_str(text).expect("parse layer"),
    }
  }

  #[test]
  fn nested_tables_merge_key_by_key() {
    let mut layered = LayeredConfig::new();
    layered.add_layer(layer(
      ConfigLayerSource::GlobalConfig(PathBuf::from("global.toml")),
      "[model]\nprovider = \"openai\"\nmax_tokens = 100\n",
    ));
    layered.add_layer(layer(
      ConfigLayerSource::ProjectConfig(PathBuf::from("project.toml")),
      "[model]\nmax_tokens = 300\n",
    ));

    let merged = layered.merge();
    let model = merged
      .get("model")
      .and_then(toml::Value::as_table)
      .expect("model table");
    assert_eq!(model.get("provider").and_then(toml::Value::as_str), Some("openai"));
    assert_eq!(model.get("max_tokens").and_then(toml::Value::as_integer), Some(300));
    assert_eq!(layered.sources().count(), 2);
  }
}
