/// One complete SSE record: an optional `event:` name and the
/// (possibly multi-line) `data:` payload, joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// Accumulates raw upstream bytes into complete SSE records. Vendors
/// split frames across arbitrary TCP chunk boundaries, so this keeps
/// a small internal buffer between `push` calls.
#[derive(Debug, Default)]
pub struct SseLineAccumulator {
    buf: String,
}

impl SseLineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a raw chunk and returns every complete record (terminated
    /// by a blank line) found so far. Partial trailing data is kept
    /// for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));
        let mut events = Vec::new();

        loop {
            let Some(blank_at) = find_blank_line(&self.buf) else {
                break;
            };
            let record = self.buf[..blank_at].to_string();
            let consumed = blank_at + blank_line_len(&self.buf[blank_at..]);
            self.buf.drain(..consumed);

            if let Some(event) = parse_record(&record) {
                events.push(event);
            }
        }
        events
    }
}

fn find_blank_line(buf: &str) -> Option<usize> {
    if let Some(pos) = buf.find("\r\n\r\n") {
        return Some(pos);
    }
    buf.find("\n\n")
}

fn blank_line_len(rest: &str) -> usize {
    if rest.starts_with("\r\n\r\n") {
        4
    } else {
        2
    }
}

fn parse_record(record: &str) -> Option<SseEvent> {
    let mut event = None;
    let mut data_lines = Vec::new();
    for line in record.lines() {
        if let Some(rest) = line.strip_prefix("event:") {
            event = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim_start().to_string());
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    Some(SseEvent { event, data: data_lines.join("\n") })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_data_only_record() {
        let mut acc = SseLineAccumulator::new();
        let events = acc.push(b"data: {\"a\":1}\n\n");
        assert_eq!(events, vec![SseEvent { event: None, data: "{\"a\":1}".into() }]);
    }

    #[test]
    fn parses_event_and_data_record() {
        let mut acc = SseLineAccumulator::new();
        let events = acc.push(b"event: content_block_delta\ndata: {\"x\":2}\n\n");
        assert_eq!(events[0].event.as_deref(), Some("content_block_delta"));
        assert_eq!(events[0].data, "{\"x\":2}");
    }

    #[test]
    fn buffers_partial_chunks_across_calls() {
        let mut acc = SseLineAccumulator::new();
        assert!(acc.push(b"data: {\"a\"").is_empty());
        let events = acc.push(b":1}\n\n");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn handles_multiple_records_in_one_chunk() {
        let mut acc = SseLineAccumulator::new();
        let events = acc.push(b"data: {\"a\":1}\n\ndata: {\"a\":2}\n\n");
        assert_eq!(events.len(), 2);
    }
}
