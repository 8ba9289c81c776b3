use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The four incoming surfaces the gateway accepts (spec §3/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiType {
    Chat,
    Embeddings,
    Messages,
    Responses,
}

impl ApiType {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiType::Chat => "chat",
            ApiType::Embeddings => "embeddings",
            ApiType::Messages => "messages",
            ApiType::Responses => "responses",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// One piece of message content. Most vendors only ever send `Text`;
/// the variant exists so image/tool-call parts survive translation
/// without adapters needing to special-case every vendor's extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ToolUse { id: String, name: String, input: serde_json::Value },
    ToolResult { tool_use_id: String, content: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::Text { text: text.into() }],
        }
    }

    /// Concatenates all `Text` parts, ignoring tool parts. Adapters
    /// that only forward plain text (e.g. embeddings input) use this
    /// instead of matching on `content` themselves.
    pub fn text_only(&self) -> String {
        self.content
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Vendor-neutral structured parameters and message list (spec §3).
/// Self-describing: adapters translate this into their own wire
/// format without consulting any ambient state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequestPayload {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// Tool/function schema, forwarded verbatim — its shape already
    /// varies per vendor and re-modeling it neutrally buys nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<serde_json::Value>,
    /// Embeddings input (when `api_type == embeddings`); kept separate
    /// from `messages` since embeddings calls carry raw strings, not
    /// a conversation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Neutral call descriptor passed from the gateway through the
/// dispatcher into whichever adapter wins the candidate list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub api_type: ApiType,
    pub model: String,
    pub payload: RequestPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only_ignores_tool_parts() {
        let msg = ChatMessage {
            role: MessageRole::Assistant,
            content: vec![
                ContentPart::Text { text: "hello ".into() },
                ContentPart::ToolUse {
                    id: "1".into(),
                    name: "lookup".into(),
                    input: serde_json::json!({}),
                },
                ContentPart::Text { text: "world".into() },
            ],
        };
        assert_eq!(msg.text_only(), "hello world");
    }
}
