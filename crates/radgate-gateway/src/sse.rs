use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use futures_util::StreamExt;
use radgate_agui::EventHub;
use radgate_protocol::{AgUiEvent, StreamFrame};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// The four headers spec §4.5/§6 requires on every SSE response.
fn sse_headers(resp: &mut Response) {
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
}

fn wrap(line: String) -> Result<bytes::Bytes, std::io::Error> {
    Ok(bytes::Bytes::from(line))
}

/// Renders an OpenAI-compatible delta frame as a `data: <json>\n\n`
/// SSE record (spec §4.1/§6: `chat.completion.chunk` shape).
fn render_openai_chunk(frame: &StreamFrame, model: &str) -> String {
    let chunk = json!({
        "object": "chat.completion.chunk",
        "model": model,
        "choices": [{
            "index": 0,
            "delta": {
                "role": frame.role.map(role_str),
                "content": frame.delta_text,
                "error": frame.error.as_ref().map(|e| json!({"kind": e.kind, "message": e.message})),
            },
            "finish_reason": frame.finish_reason,
        }],
        "usage": frame.usage.as_ref().map(|u| json!({
            "prompt_tokens": u.prompt_tokens,
            "completion_tokens": u.completion_tokens,
            "total_tokens": u.total_tokens,
        })),
    });
    format!("data: {chunk}\n\n")
}

fn role_str(role: radgate_protocol::MessageRole) -> &'static str {
    match role {
        radgate_protocol::MessageRole::System => "system",
        radgate_protocol::MessageRole::User => "user",
        radgate_protocol::MessageRole::Assistant => "assistant",
        radgate_protocol::MessageRole::Tool => "tool",
    }
}

const DONE_RECORD: &str = "data: [DONE]\n\n";

/// Streams an adapter's delta frames as OpenAI-compatible SSE, ending
/// with a terminating `data: [DONE]\n\n` record (spec §6). A mid-stream
/// adapter failure arrives as one last `StreamFrame` carrying `error`
/// (spec §7) and is rendered like any other chunk before `[DONE]`.
pub fn openai_chat_stream_response(rx: mpsc::Receiver<StreamFrame>, model: String) -> Response {
    let lines = ReceiverStream::new(rx)
        .map(move |frame| render_openai_chunk(&frame, &model))
        .chain(futures_util::stream::once(async { DONE_RECORD.to_string() }))
        .map(wrap);

    let mut resp = Response::new(Body::from_stream(lines));
    *resp.status_mut() = StatusCode::OK;
    sse_headers(&mut resp);
    resp
}

/// Unregisters a subscriber from the hub when its stream is dropped —
/// client close, cancellation, or write error all end up dropping the
/// response body, which drops this (spec §4.5's disconnect contract).
struct UnsubscribeOnDrop {
    hub: EventHub,
    client_id: String,
}

impl Drop for UnsubscribeOnDrop {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.client_id);
    }
}

/// Streams AG-UI events to one subscriber (spec §4.5), removing it
/// from the hub's client map as soon as the stream ends for any reason.
pub fn agui_stream_response(hub: EventHub, client_id: String, rx: mpsc::Receiver<AgUiEvent>) -> Response {
    let guard = UnsubscribeOnDrop { hub, client_id };
    let state = (ReceiverStream::new(rx), guard);
    let events = futures_util::stream::unfold(state, |(mut rx, guard)| async move {
        let event = rx.next().await?;
        Some((event, (rx, guard)))
    });

    let lines = events
        .map(|event| {
            let json = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
            format!("data: {json}\n\n")
        })
        .map(wrap);

    let mut resp = Response::new(Body::from_stream(lines));
    *resp.status_mut() = StatusCode::OK;
    sse_headers(&mut resp);
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_stream_error_under_delta_error_key() {
        let frame = StreamFrame::error("decode", "unexpected end of JSON");
        let rendered = render_openai_chunk(&frame, "gpt-4o-mini");
        let data = rendered.strip_prefix("data: ").unwrap().trim_end();
        let value: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(value["choices"][0]["delta"]["error"]["kind"], "decode");
        assert_eq!(value["choices"][0]["delta"]["content"], serde_json::Value::Null);
    }

    #[test]
    fn dropping_the_response_unsubscribes_the_client() {
        let hub = EventHub::new();
        let (client_id, rx) = hub.subscribe("agent-a", "");
        assert_eq!(hub.subscriber_count(), 1);

        let resp = agui_stream_response(hub.clone(), client_id, rx);
        assert_eq!(hub.subscriber_count(), 1, "still registered while the response is alive");

        drop(resp);
        assert_eq!(hub.subscriber_count(), 0, "dropping the stream should unsubscribe the client");
    }
}
