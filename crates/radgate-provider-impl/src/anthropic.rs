use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use radgate_common::{ErrorKind, GatewayError};
use radgate_protocol::{
    ChatMessage, Choice, ContentPart, MessageRole, ProviderRequest, ProviderResult, ResponseOutput,
    StreamFrame, Usage,
};
use radgate_provider_core::{PricingTable, ProviderAdapter, ProviderConfig, UpstreamOutcome};
use wreq::Client;

use crate::http_client::{build_client, classify_wreq_error, outcome_to_gateway_error, with_retries};
use crate::sse::SseLineAccumulator;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic Messages API adapter: extracts the system message into a
/// top-level `system` field, forwards only `user`/`assistant` turns,
/// and signs with `x-api-key` + `anthropic-version` (spec §4.1).
pub struct AnthropicAdapter {
    name: String,
    config: ProviderConfig,
    client: Client,
    pricing: PricingTable,
}

impl AnthropicAdapter {
    pub fn new(name: impl Into<String>, config: ProviderConfig, pricing: PricingTable) -> Result<Self, wreq::Error> {
        let client = build_client(Duration::from_secs(10), config.timeout)?;
        Ok(Self { name: name.into(), config, client, pricing })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body(&self, request: &ProviderRequest, provider_model: &str) -> serde_json::Value {
        let system: String = request
            .payload
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.text_only())
            .collect::<Vec<_>>()
            .join("\n");

        let messages: Vec<_> = request
            .payload
            .messages
            .iter()
            .filter(|m| matches!(m.role, MessageRole::User | MessageRole::Assistant))
            .map(|m| {
                let role = if m.role == MessageRole::User { "user" } else { "assistant" };
                serde_json::json!({ "role": role, "content": m.text_only() })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": provider_model,
            "messages": messages,
            "max_tokens": request.payload.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "stream": request.payload.stream,
        });
        let obj = body.as_object_mut().expect("object");
        if !system.is_empty() {
            obj.insert("system".into(), serde_json::json!(system));
        }
        if let Some(t) = request.payload.temperature {
            obj.insert("temperature".into(), serde_json::json!(t));
        }
        if !request.payload.stop.is_empty() {
            obj.insert("stop_sequences".into(), serde_json::json!(request.payload.stop));
        }
        if let Some(tools) = &request.payload.tools {
            obj.insert("tools".into(), tools.clone());
        }
        body
    }

    fn usage_from_json(&self, provider_model: &str, value: &serde_json::Value) -> Usage {
        let prompt_tokens = value.pointer("/usage/input_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
        let completion_tokens = value.pointer("/usage/output_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
        Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            cost_total: self.pricing.cost_total(provider_model, prompt_tokens, completion_tokens),
        }
    }

    fn parse_non_stream(&self, provider_model: &str, value: serde_json::Value) -> Result<ProviderResult, GatewayError> {
        let usage = self.usage_from_json(provider_model, &value);
        let text = value
            .get("content")
            .and_then(|c| c.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        let finish_reason = value.get("stop_reason").and_then(|v| v.as_str()).map(str::to_string);

        Ok(ProviderResult {
            provider: self.name.clone(),
            model: provider_model.to_string(),
            output: ResponseOutput::Materialized(vec![Choice {
                index: 0,
                role: MessageRole::Assistant,
                message: ChatMessage { role: MessageRole::Assistant, content: vec![ContentPart::Text { text }] },
                finish_reason,
            }]),
            usage,
        })
    }

    async fn parse_stream(&self, provider_model: &str, mut upstream: wreq::Response) -> Result<ProviderResult, GatewayError> {
        let (tx, rx) = tokio::sync::mpsc::channel::<StreamFrame>(32);
        let provider_model_owned = provider_model.to_string();
        let pricing = self.pricing.clone();

        tokio::spawn(async move {
            let mut acc = SseLineAccumulator::new();
            let mut byte_stream = upstream.bytes_stream();
            let mut prompt_tokens = 0u64;

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(StreamFrame::error("network", e.to_string())).await;
                        return;
                    }
                };
                for event in acc.push(&chunk) {
                    let value = match serde_json::from_str::<serde_json::Value>(&event.data) {
                        Ok(value) => value,
                        Err(e) => {
                            let _ = tx.send(StreamFrame::error("decode", e.to_string())).await;
                            return;
                        }
                    };
                    match event.event.as_deref() {
                        Some("message_start") => {
                            prompt_tokens = value
                                .pointer("/message/usage/input_tokens")
                                .and_then(|v| v.as_u64())
                                .unwrap_or(0);
                        }
                        Some("content_block_delta") => {
                            let delta_text = value
                                .pointer("/delta/text")
                                .and_then(|v| v.as_str())
                                .map(str::to_string);
                            if tx
                                .send(StreamFrame { delta_text, role: None, finish_reason: None, usage: None, error: None })
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        Some("error") => {
                            let kind = value.pointer("/error/type").and_then(|v| v.as_str()).unwrap_or("upstream").to_string();
                            let message = value.pointer("/error/message").and_then(|v| v.as_str()).unwrap_or("stream error").to_string();
                            let _ = tx.send(StreamFrame::error(kind, message)).await;
                            return;
                        }
                        Some("message_delta") => {
                            let finish_reason = value
                                .pointer("/delta/stop_reason")
                                .and_then(|v| v.as_str())
                                .map(str::to_string);
                            let completion_tokens = value
                                .pointer("/usage/output_tokens")
                                .and_then(|v| v.as_u64())
                                .unwrap_or(0);
                            let usage = Usage {
                                prompt_tokens,
                                completion_tokens,
                                total_tokens: prompt_tokens + completion_tokens,
                                cost_total: pricing.cost_total(&provider_model_owned, prompt_tokens, completion_tokens),
                            };
                            if tx
                                .send(StreamFrame { delta_text: None, role: None, finish_reason, usage: Some(usage), error: None })
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        _ => {}
                    }
                }
            }
        });

        Ok(ProviderResult {
            provider: self.name.clone(),
            model: provider_model.to_string(),
            output: ResponseOutput::Streaming(rx),
            usage: Usage::zero(),
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, request: ProviderRequest, provider_model: &str) -> Result<ProviderResult, GatewayError> {
        let is_stream = request.payload.stream;
        let body = self.build_body(&request, provider_model);

        let response = with_retries(self.config.max_retries, |_attempt| async {
            let builder = self
                .client
                .post(self.endpoint())
                .header("x-api-key", &self.config.credential)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body);
            let response = builder.send().await.map_err(|e| classify_wreq_error(&e))?;

            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let body_text = response.text().await.unwrap_or_default();
                return Err(UpstreamOutcome::Http { status, body_snippet: body_text });
            }
            Ok(response)
        })
        .await
        .map_err(|outcome| outcome_to_gateway_error(&outcome, &self.name))?;

        if is_stream {
            return self.parse_stream(provider_model, response).await;
        }

        let value = response.json::<serde_json::Value>().await.map_err(|e| {
            GatewayError::new(ErrorKind::Decode, e.to_string()).with_provider(self.name.clone())
        })?;
        self.parse_non_stream(provider_model, value)
    }
}
