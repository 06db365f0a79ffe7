use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PhoneClawError, PhoneClawResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    /// Extra app label → package id mappings, layered over the built-in table.
    #[serde(default)]
    pub apps: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    pub active_provider: String,
    pub providers: HashMap<String, ProviderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub display_name: String,
    /// Full chat-completions URL.
    pub api_base: String,
    pub model: String,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Use SSE streaming. Phone model endpoints usually answer in one JSON body.
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Upper bound for the whole round-trip, response body included.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Optional API key stored in config.toml (env var PHONECLAW_<ID>_API_KEY wins).
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_top_p() -> f64 {
    0.85
}

fn default_frequency_penalty() -> f64 {
    0.2
}

fn default_max_tokens() -> u32 {
    3000
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_read_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Pause between steps so the device UI can settle.
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    #[serde(default = "default_true")]
    pub record_history: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            step_delay_ms: default_step_delay_ms(),
            record_history: true,
        }
    }
}

fn default_max_steps() -> u32 {
    100
}

fn default_step_delay_ms() -> u64 {
    1500
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SafetyConfig {
    /// Hand control back to the user instead of tapping a button the model flagged.
    #[serde(default)]
    pub takeover_on_sensitive_tap: bool,
}

fn resolve_config_path() -> PhoneClawResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    Err(PhoneClawError::Config(
        "config.toml not found next to executable or in working directory".into(),
    ))
}

pub fn load_config() -> PhoneClawResult<AppConfig> {
    // Load .env if present so API keys can live outside config.toml.
    let _ = dotenvy::dotenv();
    let path = resolve_config_path()?;
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> PhoneClawResult<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), provider = %config.llm.active_provider, "config loaded");
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> PhoneClawResult<()> {
    let path = resolve_config_path()?;
    save_config_to(config, &path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> PhoneClawResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[llm]
active_provider = "zhipu"

[llm.providers.zhipu]
display_name = "Zhipu"
api_base = "https://open.bigmodel.cn/api/paas/v4/chat/completions"
model = "autoglm-phone"
"#;

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg: AppConfig = toml::from_str(MINIMAL).unwrap();
        let p = &cfg.llm.providers["zhipu"];
        assert_eq!(p.temperature, 0.0);
        assert_eq!(p.top_p, 0.85);
        assert_eq!(p.frequency_penalty, 0.2);
        assert_eq!(p.max_tokens, 3000);
        assert!(!p.stream);
        assert_eq!(p.connect_timeout_secs, 30);
        assert_eq!(p.read_timeout_secs, 120);
        assert_eq!(cfg.agent.max_steps, 100);
        assert_eq!(cfg.agent.step_delay_ms, 1500);
        assert!(cfg.agent.record_history);
        assert!(!cfg.safety.takeover_on_sensitive_tap);
        assert!(cfg.apps.is_empty());
    }

    #[test]
    fn save_then_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg: AppConfig = toml::from_str(MINIMAL).unwrap();
        cfg.agent.max_steps = 7;
        cfg.apps.insert("便签".into(), "com.example.notes".into());

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.agent.max_steps, 7);
        assert_eq!(loaded.apps["便签"], "com.example.notes");
        assert_eq!(loaded.llm.active_provider, "zhipu");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, PhoneClawError::Io(_)));
    }
}
