// Configuration Loader
// Layered configuration loading system

use std::path::{Path, PathBuf};

use toml::Table;
use tracing::debug;

use crate::ConfigError;
use crate::layered::{ConfigLayerSource, LayeredConfig, override_table};
use crate::types::Config;

/// Directory name used for both the global and the project config.
pub const CONFIG_DIR_NAME: &str = ".turnstile";

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
      global_dir: dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME)),
      project_dir: None,
    }
  }

  /// Loader that ignores the user's home directory.
  pub fn isolated() -> Self {
    Self {
      global_dir: None,
      project_dir: None,
    }
  }

  /// Set global config directory
  pub fn with_global_dir(mut self, dir: PathBuf) -> Self {
    self.global_dir = Some(dir);
    self
  }

  /// Set project directory
  pub fn with_project_dir(mut self, dir: PathBuf) -> Self {
    self.project_dir = Some(dir);
    self
  }

  /// Load configuration with CLI overrides
  pub fn load_with_cli_overrides(
    &self,
    cli_overrides: Vec<(String, String)>,
  ) -> Result<Config, ConfigError> {
    // Layers, lowest precedence first:
    // 1. Built-in defaults (serde defaults on every section)
    // 2. Global config (~/.turnstile/config.toml)
    // 3. Project config (<dir>/.turnstile/config.toml)
    // 4. CLI overrides
    let mut layered = LayeredConfig::new();

    if let Some(global_dir) = &self.global_dir {
      if let Some(values) = read_layer(&global_dir.join("config.toml"))? {
        layered.add_layer(ConfigLayerSource::GlobalConfig, values);
      }
    }

    if let Some(project_dir) = &self.project_dir {
      let path = project_dir.join(CONFIG_DIR_NAME).join("config.toml");
      if let Some(values) = read_layer(&path)? {
        layered.add_layer(ConfigLayerSource::ProjectConfig, values);
      }
    }

    for (key, value) in cli_overrides {
      layered.add_layer(ConfigLayerSource::CliOverride, override_table(&key, &value)?);
    }

    let merged = layered.merge();
    debug!(layers = layered.layers().len(), "merged configuration layers");
    let config = Config::deserialize_table(merged)?;
    config.validate()?;
    Ok(config)
  }
}

impl Default for ConfigLoader {
  fn default() -> Self {
    Self::new()
  }
}

impl Config {
  fn deserialize_table(table: Table) -> Result<Config, ConfigError> {
    serde::Deserialize::deserialize(toml::Value::Table(table))
      .map_err(|e: toml::de::Error| ConfigError::Invalid(e.to_string()))
  }

  /// Reject values the runtime cannot work with.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.agent.max_iterations == 0 {
      return Err(ConfigError::Invalid(
        "agent.max_iterations must be at least 1".to_string(),
      ));
    }
    if self.agent.sub_agent_max_iterations == 0 {
      return Err(ConfigError::Invalid(
        "agent.sub_agent_max_iterations must be at least 1".to_string(),
      ));
    }
    if self.context.window_tokens == 0 {
      return Err(ConfigError::Invalid(
        "context.window_tokens must be positive".to_string(),
      ));
    }
    Ok(())
  }
}

/// Parse `KEY=VALUE` strings as given on the command line.
pub fn parse_cli_overrides(raw: &[String]) -> Result<Vec<(String, String)>, ConfigError> {
  raw
    .iter()
    .map(|entry| {
      entry
        .split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .ok_or_else(|| ConfigError::InvalidOverride(format!("expected KEY=VALUE, got `{entry}`")))
    })
    .collect()
}

fn read_layer(path: &Path) -> Result<Option<Table>, ConfigError> {
  if !path.exists() {
    return Ok(None);
  }
  let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let table = toml::from_str::<Table>(&content).map_err(|e| ConfigError::Parse {
    path: path.to_path_buf(),
    message: e.to_string(),
  })?;
  debug!(path = %path.display(), "loaded config layer");
  Ok(Some(table))
}
