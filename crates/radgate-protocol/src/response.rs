use serde::{Deserialize, Serialize};

use crate::request::{ChatMessage, MessageRole};
use crate::usage::Usage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub role: MessageRole,
    pub message: ChatMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Carried by a synthetic terminal frame when a stream fails after at
/// least one frame has already been flushed to the client (spec §7:
/// such failures MUST surface as a terminal frame, not a silent close).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamError {
    pub kind: String,
    pub message: String,
}

/// A single delta emitted mid-stream (spec §4.1). Adapters convert
/// their native frame format — OpenAI SSE `data:` lines, Anthropic
/// event-typed frames — into this shape. The terminal frame of a
/// stream always carries `usage` or `error`; exactly one such frame is
/// ever observable before the stream closes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StreamFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StreamError>,
}

impl StreamFrame {
    pub fn is_terminal(&self) -> bool {
        self.usage.is_some() || self.error.is_some()
    }

    /// Builds the synthetic terminal frame emitted when a stream fails
    /// mid-flight, after at least one frame has already reached the
    /// client (spec §7).
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        StreamFrame { error: Some(StreamError { kind: kind.into(), message: message.into() }), ..Default::default() }
    }
}

/// Either a fully materialized response or a lazy, single-consumer,
/// finite sequence of delta frames (spec §3). The receiver end is
/// owned by exactly one caller; it cannot be restarted or cloned.
pub enum ResponseOutput {
    Materialized(Vec<Choice>),
    Streaming(tokio::sync::mpsc::Receiver<StreamFrame>),
}

impl std::fmt::Debug for ResponseOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseOutput::Materialized(choices) => {
                f.debug_tuple("Materialized").field(choices).finish()
            }
            ResponseOutput::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Neutral response returned by an adapter's `Execute` and propagated
/// up through the dispatcher to the gateway (spec §3).
#[derive(Debug)]
pub struct ProviderResult {
    pub provider: String,
    pub model: String,
    pub output: ResponseOutput,
    pub usage: Usage,
}
