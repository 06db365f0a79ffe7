use async_trait::async_trait;

use crate::agent_engine::event_bus::Observer;
use crate::errors::PhoneClawResult;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};

/// Model transport. Implementations send the whole conversation and return the
/// final reply text; intermediate chunks may be forwarded to the observer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider's identifier (matches the config.toml key).
    fn name(&self) -> &str;

    async fn chat(
        &self,
        messages: &[ChatMessage],
        cfg: &CallConfig,
        observer: &dyn Observer,
    ) -> PhoneClawResult<LlmResponse>;
}
