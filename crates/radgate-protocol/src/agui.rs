use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use radgate_common::time_fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgUiEventKind {
    RunStart,
    RunComplete,
    RunError,
    MessageDelta,
    ToolCall,
    ToolResult,
    StateSnapshot,
    StateDelta,
}

/// Event published on the AG-UI Event Hub (spec §3/§4.5). `timestamp`
/// is rendered with nanosecond precision on emit; parsing tolerates
/// second-precision input from other emitters (see
/// `radgate_common::time_fmt`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgUiEvent {
    #[serde(rename = "type")]
    pub kind: AgUiEventKind,
    pub run_id: String,
    pub agent_id: String,
    /// Empty string means "broadcast to all clients subscribed to
    /// this agent", per the hub's broadcast rule.
    #[serde(default)]
    pub thread_id: String,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: time::OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

fn serialize_timestamp<S: serde::Serializer>(
    ts: &time::OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time_fmt::to_rfc3339_nanos(*ts))
}

fn deserialize_timestamp<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<time::OffsetDateTime, D::Error> {
    let s = String::deserialize(deserializer)?;
    time_fmt::parse_rfc3339(&s).map_err(serde::de::Error::custom)
}

impl AgUiEvent {
    pub fn new(kind: AgUiEventKind, run_id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            kind,
            run_id: run_id.into(),
            agent_id: agent_id.into(),
            thread_id: String::new(),
            timestamp: time::OffsetDateTime::now_utc(),
            data: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    pub fn with_data(mut self, data: serde_json::Map<String, serde_json::Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// The synthetic connect-time event the hub sends to a fresh
    /// subscriber (spec §4.5): `{status: "connected", client_id}`.
    pub fn connected(agent_id: impl Into<String>, client_id: &str) -> Self {
        let mut data = serde_json::Map::new();
        data.insert("status".into(), serde_json::Value::String("connected".into()));
        data.insert("client_id".into(), serde_json::Value::String(client_id.into()));
        Self::new(AgUiEventKind::StateSnapshot, "", agent_id).with_data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let event = AgUiEvent::new(AgUiEventKind::MessageDelta, "run-1", "agent-1")
            .with_thread("thread-1");
        let json = serde_json::to_string(&event).unwrap();
        let parsed: AgUiEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, "run-1");
        assert_eq!(parsed.thread_id, "thread-1");
        assert_eq!(parsed.timestamp.unix_timestamp(), event.timestamp.unix_timestamp());
    }

    #[test]
    fn connected_event_has_status_and_client_id() {
        let event = AgUiEvent::connected("agent-1", "client-abc");
        assert_eq!(event.thread_id, "");
        let data = event.data.unwrap();
        assert_eq!(data["status"], "connected");
        assert_eq!(data["client_id"], "client-abc");
    }
}
