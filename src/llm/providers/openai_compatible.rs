use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};

use crate::agent_engine::event_bus::{AgentEvent, Observer};
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::llm::provider::LlmProvider;
use crate::llm::sse_parser;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse, StreamChunk, StreamChunkKind};

pub struct OpenAiCompatibleProvider {
    id: String,
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        id: String,
        api_base: String,
        api_key: String,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> PhoneClawResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            id,
            api_base,
            api_key,
            client,
        })
    }
}

/// Request body as sent on the wire.
pub fn build_request_body(messages: &[ChatMessage], cfg: &CallConfig) -> serde_json::Value {
    serde_json::json!({
        "model": cfg.model,
        "messages": messages,
        "temperature": cfg.temperature,
        "top_p": cfg.top_p,
        "frequency_penalty": cfg.frequency_penalty,
        "max_tokens": cfg.max_tokens,
        "stream": cfg.stream,
    })
}

/// Copy of the body with base64 image payloads replaced, for logging only.
pub fn sanitize_for_log(body: &serde_json::Value) -> serde_json::Value {
    let mut log_body = body.clone();
    if let Some(msgs) = log_body.get_mut("messages").and_then(|m| m.as_array_mut()) {
        for msg in msgs {
            let Some(parts) = msg.get_mut("content").and_then(|c| c.as_array_mut()) else {
                continue;
            };
            for part in parts {
                if part.get("type").and_then(|t| t.as_str()) == Some("image_url") {
                    if let Some(url) = part.get_mut("image_url").and_then(|i| i.get_mut("url")) {
                        *url = serde_json::Value::String("<omitted_base64_image>".to_string());
                    }
                }
            }
        }
    }
    log_body
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.id
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        cfg: &CallConfig,
        observer: &dyn Observer,
    ) -> PhoneClawResult<LlmResponse> {
        let body = build_request_body(messages, cfg);

        tracing::debug!(
            provider = %self.id,
            model = %cfg.model,
            stream = cfg.stream,
            messages = messages.len(),
            "sending LLM request"
        );
        tracing::trace!(
            body = %sanitize_for_log(&body),
            "request body (sanitized, base64 omitted)"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let err_body = response.text().await.unwrap_or_default();
            return Err(PhoneClawError::LlmProvider(format!("{}: {}", status, err_body)));
        }

        if cfg.stream {
            self.handle_stream(response, observer).await
        } else {
            self.handle_json(response, observer).await
        }
    }
}

impl OpenAiCompatibleProvider {
    /// Handle SSE streaming response.
    async fn handle_stream(
        &self,
        response: reqwest::Response,
        observer: &dyn Observer,
    ) -> PhoneClawResult<LlmResponse> {
        let acc = collect_stream(response.bytes_stream(), observer).await?;
        tracing::info!(
            content_len = acc.content.len(),
            reasoning_len = acc.reasoning.len(),
            "LLM stream complete"
        );
        Ok(acc)
    }

    /// Handle a non-streaming JSON response.
    async fn handle_json(
        &self,
        response: reqwest::Response,
        observer: &dyn Observer,
    ) -> PhoneClawResult<LlmResponse> {
        let json: serde_json::Value = response.json().await?;
        let parsed = parse_completion(&json)?;

        tracing::info!(content_len = parsed.content.len(), "LLM JSON response received");

        if !parsed.content.is_empty() {
            observer.emit(AgentEvent::LlmChunk(StreamChunk {
                kind: StreamChunkKind::Content,
                content: parsed.content.clone(),
            }));
        }
        observer.emit(AgentEvent::LlmChunk(StreamChunk {
            kind: StreamChunkKind::Done,
            content: String::new(),
        }));

        Ok(parsed)
    }
}

/// Drains an SSE byte stream, forwarding every chunk to the observer and
/// accumulating the full reply. Lines are split on raw bytes so multi-byte
/// characters spanning network chunks survive.
pub(crate) async fn collect_stream<S, B, E>(
    stream: S,
    observer: &dyn Observer,
) -> PhoneClawResult<LlmResponse>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    PhoneClawError: From<E>,
{
    futures_util::pin_mut!(stream);
    let mut pending: Vec<u8> = Vec::new();
    let mut acc = LlmResponse::default();

    while let Some(result) = stream.next().await {
        pending.extend_from_slice(result?.as_ref());

        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match sse_parser::parse_sse_line(line) {
                Ok(Some(chunk)) => match chunk.kind {
                    StreamChunkKind::Reasoning => {
                        acc.reasoning.push_str(&chunk.content);
                        observer.emit(AgentEvent::LlmChunk(chunk));
                    }
                    StreamChunkKind::Content => {
                        acc.content.push_str(&chunk.content);
                        observer.emit(AgentEvent::LlmChunk(chunk));
                    }
                    StreamChunkKind::Error => {
                        let message = chunk.content.clone();
                        observer.emit(AgentEvent::LlmChunk(chunk));
                        return Err(PhoneClawError::LlmProvider(message));
                    }
                    StreamChunkKind::Done => {
                        observer.emit(AgentEvent::LlmChunk(chunk));
                        return Ok(acc);
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("SSE parse skipped: {e}");
                }
            }
        }
    }

    // Stream ended without a [DONE] marker.
    observer.emit(AgentEvent::LlmChunk(StreamChunk {
        kind: StreamChunkKind::Done,
        content: String::new(),
    }));
    Ok(acc)
}

/// Extracts the first choice of a chat-completions JSON body.
pub fn parse_completion(json: &serde_json::Value) -> PhoneClawResult<LlmResponse> {
    let Some(choice) = json["choices"].as_array().and_then(|c| c.first()) else {
        return Err(PhoneClawError::LlmProvider(
            "Invalid response format: no choices".into(),
        ));
    };
    let message = &choice["message"];
    Ok(LlmResponse {
        content: message["content"].as_str().unwrap_or("").to_string(),
        reasoning: message["reasoning_content"].as_str().unwrap_or("").to_string(),
    })
}
