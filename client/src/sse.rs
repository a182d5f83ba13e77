use arcade_shared::Notification;
use bytes::{Bytes, BytesMut};
use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::error::{Error, Result};

/// Upper bound on an event that is still being assembled.
pub const MAX_EVENT_BYTES: usize = 16 * 1024 * 1024;

/// Incremental `text/event-stream` decoder. Feed it raw chunks as they arrive and it hands
/// back the `data` payload of every completed event. Comment lines (keep-alives) and the
/// `event`, `id` and `retry` fields are dropped.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: BytesMut,
    data: Vec<String>,
    data_len: usize,
    limit: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_limit(MAX_EVENT_BYTES)
    }
}

impl SseDecoder {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            data: Vec::new(),
            data_len: 0,
            limit,
        }
    }

    /// Fails once an unfinished event grows past the limit. The decoder is reset on failure.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let mut line = self.buffer.split_to(newline + 1);
            line.truncate(newline);
            if line.last() == Some(&b'\r') {
                line.truncate(newline - 1);
            }
            if let Some(event) = self.feed_line(&line) {
                events.push(event);
            }
        }
        if self.pending() > self.limit {
            self.buffer.clear();
            self.data.clear();
            self.data_len = 0;
            return Err(Error::EventTooLarge { limit: self.limit });
        }
        Ok(events)
    }

    fn feed_line(&mut self, line: &[u8]) -> Option<String> {
        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let event = self.data.join("\n");
            self.data.clear();
            self.data_len = 0;
            return Some(event);
        }
        if line[0] == b':' {
            return None;
        }
        let line = String::from_utf8_lossy(line);
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (&*line, ""),
        };
        if field == "data" {
            self.data_len += value.len();
            self.data.push(value.to_string());
        }
        None
    }

    /// Bytes held for the event being assembled, terminated lines included.
    pub fn pending(&self) -> usize {
        self.buffer.len() + self.data_len
    }
}

/// Turn a raw event-stream body into decoded subscription pushes. An oversized event ends the
/// stream after reporting the error.
pub fn notification_stream<S>(body: S) -> BoxStream<'static, Result<Notification>>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let mut decoder = SseDecoder::default();
    body.scan(false, move |overflowed, chunk| {
        if *overflowed {
            return future::ready(None);
        }
        let items: Vec<Result<Notification>> = match chunk {
            Ok(chunk) => match decoder.push(&chunk) {
                Ok(events) => events
                    .into_iter()
                    .map(|data| serde_json::from_str::<Notification>(&data).map_err(Error::from))
                    .collect(),
                Err(e) => {
                    *overflowed = true;
                    vec![Err(e)]
                }
            },
            Err(e) => vec![Err(Error::from(e))],
        };
        future::ready(Some(stream::iter(items)))
    })
    .flatten()
    .boxed()
}
