// Layered Configuration
// Support for layered configuration with precedence

use toml::Table;
use toml::Value;

use crate::ConfigError;

/// Configuration layer source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
  /// Global user config
  GlobalConfig,
  /// Project-specific config
  ProjectConfig,
  /// CLI override
  CliOverride,
}

/// Configuration layer with source tracking
#[derive(Debug, Clone)]
pub struct ConfigLayer {
  /// Layer source
  pub source: ConfigLayerSource,
  /// Configuration values
  pub values: Table,
}

/// Ordered stack of partial configurations; later layers win.
#[derive(Debug, Clone, Default)]
pub struct LayeredConfig {
  layers: Vec<ConfigLayer>,
}

impl LayeredConfig {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_layer(&mut self, source: ConfigLayerSource, values: Table) {
    self.layers.push(ConfigLayer { source, values });
  }

  pub fn layers(&self) -> &[ConfigLayer] {
    &self.layers
  }

  /// Deep-merge all layers. Nested tables merge key by key; any other value
  /// replaces what lower layers set.
  pub fn merge(&self) -> Table {
    let mut merged = Table::new();
    for layer in &self.layers {
      merge_tables(&mut merged, &layer.values);
    }
    merged
  }
}

fn merge_tables(base: &mut Table, overlay: &Table) {
  for (key, value) in overlay {
    match (base.get_mut(key), value) {
      (Some(Value::Table(existing)), Value::Table(incoming)) => merge_tables(existing, incoming),
      _ => {
        base.insert(key.clone(), value.clone());
      }
    }
  }
}

/// Build a single-entry table from a dotted `key=value` override.
///
/// The value is parsed as a TOML value when possible (`50`, `true`,
/// `["a", "b"]`) and kept as a plain string otherwise.
pub fn override_table(key: &str, raw_value: &str) -> Result<Table, ConfigError> {
  let segments: Vec<&str> = key.split('.').map(str::trim).collect();
  if segments.iter().any(|s| s.is_empty()) {
    return Err(ConfigError::InvalidOverride(format!(
      "empty segment in key `{key}`"
    )));
  }

  let mut value = parse_override_value(raw_value);
  for segment in segments.iter().skip(1).rev() {
    let mut table = Table::new();
    table.insert((*segment).to_string(), value);
    value = Value::Table(table);
  }

  let mut root = Table::new();
  root.insert(segments[0].to_string(), value);
  Ok(root)
}

fn parse_override_value(raw: &str) -> Value {
  let probe = format!("value = {raw}");
  match toml::from_str::<Table>(&probe) {
    Ok(mut table) => table
      .remove("value")
      .unwrap_or_else(|| Value::String(raw.to_string())),
    Err(_) => Value::String(raw.to_string()),
  }
}
