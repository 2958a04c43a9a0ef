// Configuration Types
// All configuration type definitions

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  /// Model configuration
  pub models: ModelsConfig,
  /// Turn loop settings
  pub agent: AgentConfig,
  /// Approval gate settings
  pub approval: ApprovalConfig,
  /// Context window accounting
  pub context: ContextConfig,
}

// ============================================================================
// MODELS CONFIGURATION
// ============================================================================

/// Models configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
  /// Model provider
  pub provider: String,
  /// Model name
  pub model: String,
  /// Base URL for API
  pub base_url: Option<String>,
  /// Environment variable holding the API key
  pub api_key_env: String,
  /// Sampling temperature
  pub temperature: Option<f32>,
  /// Maximum output tokens per model call
  pub max_tokens: Option<u32>,
}

impl Default for ModelsConfig {
  fn default() -> Self {
    Self {
      provider: "openai".to_string(),
      model: "gpt-4o".to_string(),
      base_url: None,
      api_key_env: "OPENAI_API_KEY".to_string(),
      temperature: None,
      max_tokens: Some(4096),
    }
  }
}

// ============================================================================
// AGENT CONFIGURATION
// ============================================================================

/// Agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
  /// Upper bound on model calls within one user turn
  pub max_iterations: usize,
  /// Upper bound on model calls within one spawned sub-agent
  pub sub_agent_max_iterations: usize,
  /// Replaces the built-in system prompt when set
  pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
  fn default() -> Self {
    Self {
      max_iterations: 50,
      sub_agent_max_iterations: 10,
      system_prompt: None,
    }
  }
}

// ============================================================================
// APPROVAL CONFIGURATION
// ============================================================================

/// Approval gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
  /// Seconds to wait for a decision before treating it as a denial
  pub timeout_secs: u64,
  /// Tools that must be confirmed before running
  pub required_tools: Vec<String>,
}

impl Default for ApprovalConfig {
  fn default() -> Self {
    Self {
      timeout_secs: 300,
      required_tools: vec![
        "execute_shell".to_string(),
        "write_file".to_string(),
        "edit_file".to_string(),
      ],
    }
  }
}

// ============================================================================
// CONTEXT CONFIGURATION
// ============================================================================

/// Context window accounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
  /// Model context window size in tokens
  pub window_tokens: u64,
  /// Fraction of the window at which a warning is raised
  pub warning_threshold: f64,
  /// Fraction of the window treated as the soft limit
  pub soft_limit_threshold: f64,
}

impl Default for ContextConfig {
  fn default() -> Self {
    Self {
      window_tokens: 200_000,
      warning_threshold: 0.8,
      soft_limit_threshold: 0.9,
    }
  }
}
