use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, LlmConfig};
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::llm::provider::LlmProvider;
use crate::llm::providers::openai_compatible::OpenAiCompatibleProvider;
use crate::llm::types::CallConfig;

/// Registry of all available LLM providers, keyed by their config.toml identifier.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    active: String,
    llm_config: LlmConfig,
}

impl ProviderRegistry {
    pub fn new(active: String) -> Self {
        Self {
            providers: HashMap::new(),
            active,
            llm_config: LlmConfig::default(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get_active(&self) -> PhoneClawResult<Arc<dyn LlmProvider>> {
        self.providers.get(&self.active).cloned().ok_or_else(|| {
            PhoneClawError::Config(format!(
                "Active provider '{}' not found in registry",
                self.active
            ))
        })
    }

    pub fn set_active(&mut self, name: String) -> PhoneClawResult<()> {
        if self.providers.contains_key(&name) {
            self.active = name;
            Ok(())
        } else {
            Err(PhoneClawError::Config(format!("Provider '{name}' not registered")))
        }
    }

    pub fn list_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    /// Active provider plus the sampling parameters configured for it.
    pub fn active_call_config(&self) -> PhoneClawResult<(Arc<dyn LlmProvider>, CallConfig)> {
        let provider = self.get_active()?;
        let entry = self.llm_config.providers.get(&self.active).ok_or_else(|| {
            PhoneClawError::Config(format!("No [llm.providers.{}] section", self.active))
        })?;
        let cfg = CallConfig {
            model: entry.model.clone(),
            stream: entry.stream,
            temperature: entry.temperature,
            top_p: entry.top_p,
            frequency_penalty: entry.frequency_penalty,
            max_tokens: entry.max_tokens,
        };
        tracing::debug!(
            provider = %self.active,
            model = %cfg.model,
            stream = cfg.stream,
            temperature = cfg.temperature,
            "resolved call config"
        );
        Ok((provider, cfg))
    }

    /// Build a registry from the loaded app config.
    /// API keys are read from environment variables named `PHONECLAW_<ID>_API_KEY`,
    /// falling back to the key stored in config.toml.
    pub fn from_config(config: &AppConfig) -> PhoneClawResult<Self> {
        let mut registry = Self {
            providers: HashMap::new(),
            active: config.llm.active_provider.clone(),
            llm_config: config.llm.clone(),
        };
        for (id, entry) in &config.llm.providers {
            let api_key = std::env::var(format!("PHONECLAW_{}_API_KEY", id.to_uppercase()))
                .unwrap_or_else(|_| entry.api_key.clone().unwrap_or_default());
            if api_key.is_empty() {
                tracing::warn!(provider = %id, "no API key configured");
            }
            let provider = OpenAiCompatibleProvider::new(
                id.clone(),
                entry.api_base.clone(),
                api_key,
                Duration::from_secs(entry.connect_timeout_secs),
                Duration::from_secs(entry.read_timeout_secs),
            )?;
            registry.register(Arc::new(provider));
        }
        Ok(registry)
    }
}
