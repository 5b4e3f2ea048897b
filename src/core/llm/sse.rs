//! Server-Sent Events decoding for streaming generation responses.
//!
//! Only `data:` fields matter here. Bytes are buffered until a full line is
//! available, so multi-byte characters split across network chunks are never
//! decoded in halves.

use std::collections::VecDeque;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::warn;

use super::base::{LLMError, TokenStream};

pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental `data:` line decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the payloads of every complete `data:` line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line[..line.len() - 1]) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&rest)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.strip_suffix('\r').unwrap_or(&line);
    let value = line.strip_prefix("data:")?;
    let value = value.strip_prefix(' ').unwrap_or(value);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Interpretation of one `data:` payload by a provider.
#[derive(Debug, PartialEq, Eq)]
pub enum SseToken {
    Text(String),
    /// Valid event carrying no text.
    Skip,
    Done,
    /// Payload that is not the expected JSON.
    Invalid(String),
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

struct StreamState {
    body: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    extract: fn(&str) -> SseToken,
    provider: &'static str,
    done: bool,
}

/// Turn an SSE response body into a fragment stream.
///
/// Invalid events are logged and skipped. A transport error is yielded once
/// and ends the stream.
pub fn token_stream(
    body: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    extract: fn(&str) -> SseToken,
    provider: &'static str,
) -> TokenStream {
    let state = StreamState {
        body: Box::pin(body.fuse()),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        extract,
        provider,
        done: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        loop {
            while let Some(payload) = state.pending.pop_front() {
                match (state.extract)(&payload) {
                    SseToken::Text(text) => return Some((Ok(text), state)),
                    SseToken::Skip => continue,
                    SseToken::Done => {
                        state.done = true;
                        state.pending.clear();
                    }
                    SseToken::Invalid(reason) => {
                        warn!("Skipping invalid {} stream event: {}", state.provider, reason);
                    }
                }
            }

            if state.done {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.decoder.push(&chunk);
                    state.pending.extend(payloads);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((
                        Err(LLMError::StreamError(format!("Stream read error: {e}"))),
                        state,
                    ));
                }
                None => match state.decoder.finish() {
                    // The body is fused, so the next poll lands here again with nothing left.
                    Some(payload) => state.pending.push_back(payload),
                    None => state.done = true,
                },
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_emits_data_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"a\":1}\n\n: comment\nevent: x\ndata:{\"b\":2}\r\n");
        assert_eq!(payloads, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn test_decoder_keeps_partial_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: hel").is_empty());
        assert_eq!(decoder.push(b"lo\n"), vec!["hello"]);
    }

    #[test]
    fn test_decoder_handles_split_multibyte_characters() {
        let line = "data: 你好\n".as_bytes();
        let mut decoder = SseDecoder::new();
        // Split inside the first CJK character.
        assert!(decoder.push(&line[..8]).is_empty());
        assert_eq!(decoder.push(&line[8..]), vec!["你好"]);
    }

    #[test]
    fn test_decoder_finish_returns_unterminated_line() {
        let mut decoder = SseDecoder::new();
        decoder.push(b"data: tail");
        assert_eq!(decoder.finish(), Some("tail".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    fn plain(payload: &str) -> SseToken {
        match payload {
            DONE_SENTINEL => SseToken::Done,
            "skip" => SseToken::Skip,
            "bad" => SseToken::Invalid("bad".to_string()),
            text => SseToken::Text(text.to_string()),
        }
    }

    #[tokio::test]
    async fn test_token_stream_skips_and_stops_at_done() {
        let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from_static(b"data: one\ndata: skip\n")),
            Ok(Bytes::from_static(b"data: bad\ndata: two\n")),
            Ok(Bytes::from_static(b"data: [DONE]\ndata: never\n")),
        ];
        let stream = token_stream(futures::stream::iter(chunks), plain, "test");
        let out: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(out, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_token_stream_flushes_trailing_event() {
        let chunks: Vec<Result<Bytes, reqwest::Error>> =
            vec![Ok(Bytes::from_static(b"data: one\ndata: last"))];
        let stream = token_stream(futures::stream::iter(chunks), plain, "test");
        let out: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(out, vec!["one", "last"]);
    }
}
