use radgate_common::{ErrorKind, GatewayError};
use radgate_protocol::{ApiType, ChatMessage, ContentPart, MessageRole, ProviderRequest, RequestPayload, ResponseOutput};
use serde_json::{Value, json};

/// Parses an OpenAI-compatible chat body (`/v1/chat/completions`) into
/// the neutral request shape (spec §4.1/§6). Unknown top-level fields
/// are folded into `payload.extra` so adapters can forward them
/// verbatim — the gateway never invents a vendor-specific field it
/// doesn't model.
pub fn openai_chat_to_provider_request(body: &Value) -> Result<ProviderRequest, GatewayError> {
    let model = require_str(body, "model")?;
    let messages = parse_openai_messages(body)?;
    let mut payload = base_payload(body, messages);
    payload.stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
    Ok(ProviderRequest { api_type: ApiType::Chat, model, payload })
}

/// Parses an OpenAI responses-API body (`/v1/responses`) — shape-
/// compatible with chat except the message list is named `input`
/// rather than `messages` (spec §6).
pub fn openai_responses_to_provider_request(body: &Value) -> Result<ProviderRequest, GatewayError> {
    let model = require_str(body, "model")?;
    let messages = match body.get("input") {
        Some(Value::String(text)) => vec![ChatMessage::text(MessageRole::User, text.clone())],
        Some(Value::Array(_)) => parse_openai_messages_from(body, "input")?,
        _ => return Err(GatewayError::new(ErrorKind::BadRequest, "missing 'input'")),
    };
    let mut payload = base_payload(body, messages);
    payload.stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
    Ok(ProviderRequest { api_type: ApiType::Responses, model, payload })
}

/// Parses an Anthropic-shaped `/v1/messages` body: system message is a
/// top-level string field, not part of the message list (spec §4.1).
pub fn anthropic_messages_to_provider_request(body: &Value) -> Result<ProviderRequest, GatewayError> {
    let model = require_str(body, "model")?;
    let mut messages = Vec::new();
    if let Some(system) = body.get("system").and_then(Value::as_str) {
        messages.push(ChatMessage::text(MessageRole::System, system));
    }
    messages.extend(parse_openai_messages_from(body, "messages")?);
    let mut payload = base_payload(body, messages);
    payload.stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
    if payload.max_tokens.is_none() {
        payload.max_tokens = Some(4096);
    }
    Ok(ProviderRequest { api_type: ApiType::Messages, model, payload })
}

/// Parses an OpenAI-shaped embeddings body: `input` is a raw string or
/// list of strings, not a conversation (spec §4.1).
pub fn embeddings_to_provider_request(body: &Value) -> Result<ProviderRequest, GatewayError> {
    let model = require_str(body, "model")?;
    let input = match body.get("input") {
        Some(Value::String(text)) => vec![text.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string).ok_or_else(|| GatewayError::new(ErrorKind::BadRequest, "'input' entries must be strings")))
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(GatewayError::new(ErrorKind::BadRequest, "missing 'input'")),
    };
    let payload = RequestPayload { input, ..RequestPayload::default() };
    Ok(ProviderRequest { api_type: ApiType::Embeddings, model, payload })
}

fn base_payload(body: &Value, messages: Vec<ChatMessage>) -> RequestPayload {
    let mut extra = std::collections::HashMap::new();
    if let Value::Object(map) = body {
        for (key, value) in map {
            if !KNOWN_TOP_LEVEL_FIELDS.contains(&key.as_str()) {
                extra.insert(key.clone(), value.clone());
            }
        }
    }
    RequestPayload {
        messages,
        temperature: body.get("temperature").and_then(Value::as_f64),
        max_tokens: body.get("max_tokens").and_then(Value::as_u64).map(|n| n as u32),
        stream: false,
        stop: parse_stop(body),
        tools: body.get("tools").cloned(),
        input: Vec::new(),
        extra,
    }
}

const KNOWN_TOP_LEVEL_FIELDS: &[&str] = &[
    "model", "messages", "input", "system", "temperature", "max_tokens", "stream", "stop", "tools",
];

fn parse_stop(body: &Value) -> Vec<String> {
    match body.get("stop") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

fn require_str(body: &Value, field: &str) -> Result<String, GatewayError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GatewayError::new(ErrorKind::BadRequest, format!("missing '{field}'")))
}

fn parse_openai_messages(body: &Value) -> Result<Vec<ChatMessage>, GatewayError> {
    parse_openai_messages_from(body, "messages")
}

fn parse_openai_messages_from(body: &Value, field: &str) -> Result<Vec<ChatMessage>, GatewayError> {
    let items = body
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::new(ErrorKind::BadRequest, format!("missing '{field}'")))?;

    items
        .iter()
        .map(|item| {
            let role = match item.get("role").and_then(Value::as_str) {
                Some("system") => MessageRole::System,
                Some("assistant") => MessageRole::Assistant,
                Some("tool") => MessageRole::Tool,
                Some("user") => MessageRole::User,
                _ => return Err(GatewayError::new(ErrorKind::BadRequest, "message missing valid 'role'")),
            };
            let content = match item.get("content") {
                Some(Value::String(text)) => vec![ContentPart::Text { text: text.clone() }],
                Some(Value::Array(parts)) => parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str).map(|text| ContentPart::Text { text: text.to_string() }))
                    .collect(),
                _ => return Err(GatewayError::new(ErrorKind::BadRequest, "message missing 'content'")),
            };
            Ok(ChatMessage { role, content })
        })
        .collect()
}

/// Renders a materialized choice list into an OpenAI-compatible
/// `/v1/chat/completions` response body.
pub fn render_openai_chat(model: &str, usage: &radgate_protocol::Usage, choices: &[radgate_protocol::Choice]) -> Value {
    json!({
        "id": radgate_common::new_request_id(),
        "object": "chat.completion",
        "model": model,
        "choices": choices.iter().map(|choice| json!({
            "index": choice.index,
            "message": {
                "role": role_str(choice.message.role),
                "content": choice.message.text_only(),
            },
            "finish_reason": choice.finish_reason,
        })).collect::<Vec<_>>(),
        "usage": {
            "prompt_tokens": usage.prompt_tokens,
            "completion_tokens": usage.completion_tokens,
            "total_tokens": usage.total_tokens,
        },
    })
}

/// Renders a materialized choice list as an Anthropic-shaped
/// `/v1/messages` response body.
pub fn render_anthropic_messages(model: &str, usage: &radgate_protocol::Usage, choices: &[radgate_protocol::Choice]) -> Value {
    let text = choices.first().map(|c| c.message.text_only()).unwrap_or_default();
    json!({
        "id": radgate_common::new_request_id(),
        "type": "message",
        "role": "assistant",
        "model": model,
        "content": [{"type": "text", "text": text}],
        "stop_reason": choices.first().and_then(|c| c.finish_reason.clone()),
        "usage": {
            "input_tokens": usage.prompt_tokens,
            "output_tokens": usage.completion_tokens,
        },
    })
}

fn role_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    }
}

/// Extracts the choices out of a materialized `ProviderResult`, or an
/// empty-content single choice for a result whose output is streaming
/// (callers of this helper only ever see materialized results; the
/// streaming branch is handled separately in `sse`).
pub fn materialized_choices(output: &ResponseOutput) -> &[radgate_protocol::Choice] {
    match output {
        ResponseOutput::Materialized(choices) => choices,
        ResponseOutput::Streaming(_) => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_openai_chat_body() {
        let body = json!({"model": "gpt-4o-mini", "messages": [{"role": "user", "content": "hi"}]});
        let req = openai_chat_to_provider_request(&body).unwrap();
        assert_eq!(req.model, "gpt-4o-mini");
        assert_eq!(req.payload.messages.len(), 1);
        assert_eq!(req.payload.messages[0].text_only(), "hi");
    }

    #[test]
    fn missing_model_is_bad_request() {
        let body = json!({"messages": []});
        assert!(matches!(openai_chat_to_provider_request(&body), Err(e) if e.kind == ErrorKind::BadRequest));
    }

    #[test]
    fn anthropic_system_message_is_extracted_and_not_duplicated() {
        let body = json!({
            "model": "claude-3-5-sonnet",
            "system": "be terse",
            "messages": [{"role": "user", "content": "hi"}],
        });
        let req = anthropic_messages_to_provider_request(&body).unwrap();
        assert_eq!(req.payload.messages.len(), 2);
        assert_eq!(req.payload.messages[0].role, MessageRole::System);
        assert_eq!(req.payload.max_tokens, Some(4096));
    }

    #[test]
    fn anthropic_without_system_has_no_system_message() {
        let body = json!({"model": "m", "messages": [{"role": "user", "content": "hi"}]});
        let req = anthropic_messages_to_provider_request(&body).unwrap();
        assert_eq!(req.payload.messages.len(), 1);
        assert_eq!(req.payload.messages[0].role, MessageRole::User);
    }

    #[test]
    fn embeddings_accepts_single_string_or_array() {
        let body = json!({"model": "m", "input": "hello"});
        let req = embeddings_to_provider_request(&body).unwrap();
        assert_eq!(req.payload.input, vec!["hello".to_string()]);

        let body = json!({"model": "m", "input": ["a", "b"]});
        let req = embeddings_to_provider_request(&body).unwrap();
        assert_eq!(req.payload.input, vec!["a".to_string(), "b".to_string()]);
    }
}
