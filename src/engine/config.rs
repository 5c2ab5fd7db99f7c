// Paw Voice Engine — Configuration
// Engine settings with per-field serde defaults, loadable from TOML.
// A missing file means "use defaults"; a malformed one is a Config error.

use crate::atoms::constants::*;
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::GenerationOptions;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Upper bound on history entries rendered into a prompt.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize { DEFAULT_CONTEXT_MAX_ENTRIES }

impl Default for ContextConfig {
    fn default() -> Self {
        Self { max_entries: DEFAULT_CONTEXT_MAX_ENTRIES }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Bound on a whole generative call, from request to last token.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default)]
    pub stop_sequences: Vec<String>,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_timeout_secs() -> u64 { DEFAULT_GENERATION_TIMEOUT_SECS }
fn default_max_tokens() -> u32 { DEFAULT_MAX_TOKENS }
fn default_temperature() -> f64 { DEFAULT_TEMPERATURE }
fn default_system_prompt() -> String { DEFAULT_SYSTEM_PROMPT.to_string() }

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_GENERATION_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            stop_sequences: Vec::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop_sequences: self.stop_sequences.clone(),
            system_prompt: if self.system_prompt.trim().is_empty() {
                None
            } else {
                Some(self.system_prompt.clone())
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_base_url() -> String { DEFAULT_BACKEND_BASE_URL.into() }
fn default_model() -> String { DEFAULT_BACKEND_MODEL.into() }

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_BASE_URL.into(),
            api_key: None,
            model: DEFAULT_BACKEND_MODEL.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file; a missing file yields defaults.
    pub fn load(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            info!("[config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!("[config] Loaded {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.context.max_entries == 0 {
            return Err(EngineError::Config("context.max_entries must be at least 1".into()));
        }
        if self.generation.timeout_secs == 0 {
            return Err(EngineError::Config("generation.timeout_secs must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(EngineError::Config(format!(
                "generation.temperature {} is outside 0.0..=2.0",
                self.generation.temperature
            )));
        }
        Ok(())
    }
}
