use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use radgate_common::{ErrorKind, GatewayError};
use radgate_protocol::{
    ApiType, ChatMessage, Choice, ContentPart, MessageRole, ProviderRequest, ProviderResult,
    ResponseOutput, StreamFrame, Usage,
};
use radgate_provider_core::{AuthScheme, PricingTable, ProviderAdapter, ProviderConfig, UpstreamOutcome};
use wreq::Client;

use crate::http_client::{build_client, classify_wreq_error, outcome_to_gateway_error, with_retries};
use crate::sse::SseLineAccumulator;

/// OpenAI-compatible chat/embeddings adapter. Also serves Azure/
/// LocalAI-style variants via a configured base URL and header
/// overrides (spec §4.1/§6 `GENERIC_*` family reuses this adapter
/// through `GenericCompatAdapter`).
pub struct OpenAiCompatAdapter {
    name: String,
    config: ProviderConfig,
    client: Client,
    pricing: PricingTable,
}

impl OpenAiCompatAdapter {
    pub fn new(name: impl Into<String>, config: ProviderConfig, pricing: PricingTable) -> Result<Self, wreq::Error> {
        let client = build_client(Duration::from_secs(10), config.timeout)?;
        Ok(Self { name: name.into(), config, client, pricing })
    }

    fn apply_auth(&self, builder: wreq::RequestBuilder) -> wreq::RequestBuilder {
        let builder = match self.config.auth_scheme {
            AuthScheme::Bearer => builder.header("authorization", format!("Bearer {}", self.config.credential)),
            AuthScheme::ApiKey => builder.header("api-key", &self.config.credential),
            AuthScheme::Custom => builder,
        };
        self.config
            .custom_headers
            .iter()
            .fold(builder, |b, (k, v)| b.header(k, v))
    }

    fn endpoint(&self, api_type: ApiType) -> String {
        let path = match api_type {
            ApiType::Embeddings => "/embeddings",
            _ => "/chat/completions",
        };
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn role_str(role: MessageRole) -> &'static str {
        match role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }

    fn build_body(&self, request: &ProviderRequest, provider_model: &str) -> serde_json::Value {
        if request.api_type == ApiType::Embeddings {
            return serde_json::json!({
                "model": provider_model,
                "input": request.payload.input,
            });
        }

        let messages: Vec<_> = request
            .payload
            .messages
            .iter()
            .map(|m| serde_json::json!({ "role": Self::role_str(m.role), "content": m.text_only() }))
            .collect();

        let mut body = serde_json::json!({
            "model": provider_model,
            "messages": messages,
            "stream": request.payload.stream,
        });
        let obj = body.as_object_mut().expect("object");
        if let Some(t) = request.payload.temperature {
            obj.insert("temperature".into(), serde_json::json!(t));
        }
        if let Some(t) = request.payload.max_tokens {
            obj.insert("max_tokens".into(), serde_json::json!(t));
        }
        if !request.payload.stop.is_empty() {
            obj.insert("stop".into(), serde_json::json!(request.payload.stop));
        }
        if let Some(tools) = &request.payload.tools {
            obj.insert("tools".into(), tools.clone());
        }
        if request.payload.stream {
            obj.insert("stream_options".into(), serde_json::json!({ "include_usage": true }));
        }
        body
    }

    fn usage_from_json(&self, provider_model: &str, value: &serde_json::Value) -> Usage {
        let prompt_tokens = value.pointer("/usage/prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
        let completion_tokens = value.pointer("/usage/completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
        let total_tokens = value
            .pointer("/usage/total_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(prompt_tokens + completion_tokens);
        Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            cost_total: self.pricing.cost_total(provider_model, prompt_tokens, completion_tokens),
        }
    }

    fn parse_non_stream(&self, provider_model: &str, value: serde_json::Value) -> Result<ProviderResult, GatewayError> {
        let usage = self.usage_from_json(provider_model, &value);
        let choices = value
            .get("choices")
            .and_then(|c| c.as_array())
            .ok_or_else(|| GatewayError::new(ErrorKind::Decode, "missing choices array").with_provider(self.name.clone()))?;

        let mut out = Vec::with_capacity(choices.len());
        for (i, choice) in choices.iter().enumerate() {
            let content = choice.pointer("/message/content").and_then(|v| v.as_str()).unwrap_or("").to_string();
            let finish_reason = choice.get("finish_reason").and_then(|v| v.as_str()).map(str::to_string);
            out.push(Choice {
                index: i as u32,
                role: MessageRole::Assistant,
                message: ChatMessage { role: MessageRole::Assistant, content: vec![ContentPart::Text { text: content }] },
                finish_reason,
            });
        }

        Ok(ProviderResult {
            provider: self.name.clone(),
            model: provider_model.to_string(),
            output: ResponseOutput::Materialized(out),
            usage,
        })
    }

    async fn parse_stream(
        &self,
        provider_model: &str,
        mut upstream: wreq::Response,
    ) -> Result<ProviderResult, GatewayError> {
        let (tx, rx) = tokio::sync::mpsc::channel::<StreamFrame>(32);
        let name = self.name.clone();
        let provider_model = provider_model.to_string();
        let pricing = self.pricing.clone();

        tokio::spawn(async move {
            let mut acc = SseLineAccumulator::new();
            let mut byte_stream = upstream.bytes_stream();
            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(StreamFrame::error("network", e.to_string())).await;
                        return;
                    }
                };
                for event in acc.push(&chunk) {
                    if event.data.trim() == "[DONE]" {
                        continue;
                    }
                    let value = match serde_json::from_str::<serde_json::Value>(&event.data) {
                        Ok(value) => value,
                        Err(e) => {
                            let _ = tx.send(StreamFrame::error("decode", e.to_string())).await;
                            return;
                        }
                    };
                    let delta_text = value
                        .pointer("/choices/0/delta/content")
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    let finish_reason = value
                        .pointer("/choices/0/finish_reason")
                        .and_then(|v| v.as_str())
                        .map(str::to_string);
                    let has_usage = value.get("usage").is_some();
                    let frame = StreamFrame {
                        delta_text,
                        role: None,
                        finish_reason,
                        usage: has_usage.then(|| {
                            let prompt_tokens = value.pointer("/usage/prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
                            let completion_tokens = value.pointer("/usage/completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
                            Usage {
                                prompt_tokens,
                                completion_tokens,
                                total_tokens: prompt_tokens + completion_tokens,
                                cost_total: pricing.cost_total(&provider_model, prompt_tokens, completion_tokens),
                            }
                        }),
                        error: None,
                    };
                    if tx.send(frame).await.is_err() {
                        return;
                    }
                }
            }
            let _ = name;
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
impl ProviderAdapter for OpenAiCompatAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, request: ProviderRequest, provider_model: &str) -> Result<ProviderResult, GatewayError> {
        let is_stream = request.payload.stream;
        let body = self.build_body(&request, provider_model);
        let url = self.endpoint(request.api_type);

        let response = with_retries(self.config.max_retries, |_attempt| async {
            let builder = self.apply_auth(self.client.post(&url)).json(&body);
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
