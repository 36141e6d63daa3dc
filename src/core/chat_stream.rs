//! Streaming prompt exchange
//!
//! One spawned task per exchange. The task negotiates the endpoint (native
//! first, OpenAI-compatible on failure), reads the chunked response body, and
//! forwards parsed fragments over an unbounded channel to the UI loop. Lines
//! are only parsed once their terminating newline has arrived, so a JSON
//! object split across reads is never fed to the parser half-finished.

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ApiFlavor, CompletionChunk, GenerateChunk, GenerateRequest};
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub model: String,
    pub prompt: String,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let StreamParams {
                client,
                base_url,
                model,
                prompt,
                cancel_token,
                stream_id,
            } = params;

            let request = GenerateRequest {
                model,
                prompt,
                stream: true,
            };

            tokio::select! {
                _ = run_exchange(&client, &base_url, &request, &cancel_token, &tx, stream_id) => {}
                _ = cancel_token.cancelled() => {}
            }
        });
    }
}

async fn run_exchange(
    client: &reqwest::Client,
    base_url: &str,
    request: &GenerateRequest,
    cancel_token: &CancellationToken,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) {
    let (response, flavor) = match open_stream(client, base_url, request).await {
        Ok(opened) => opened,
        Err(err) => {
            let _ = tx.send((StreamMessage::Error(err), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    let mut stream = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        if cancel_token.is_cancelled() {
            return;
        }

        if let Ok(chunk_bytes) = chunk {
            buffer.extend_from_slice(&chunk_bytes);
            if process_buffered_lines(&mut buffer, flavor, tx, stream_id) {
                return;
            }
        }
    }

    let _ = tx.send((StreamMessage::End, stream_id));
}

/// Try the native generate endpoint; fall back to the OpenAI-compatible one
/// when the request fails to establish (connect error or non-success status).
async fn open_stream(
    client: &reqwest::Client,
    base_url: &str,
    request: &GenerateRequest,
) -> Result<(reqwest::Response, ApiFlavor), String> {
    match try_generate_endpoint(client, base_url, ApiFlavor::Native, request).await {
        Ok(response) => Ok((response, ApiFlavor::Native)),
        Err(native_err) => {
            debug!(error = %native_err, "native generate endpoint failed, trying OpenAI-compatible endpoint");
            match try_generate_endpoint(client, base_url, ApiFlavor::OpenAiCompat, request).await {
                Ok(response) => Ok((response, ApiFlavor::OpenAiCompat)),
                Err(fallback_err) => Err(format!(
                    "native endpoint: {native_err}; fallback endpoint: {fallback_err}"
                )),
            }
        }
    }
}

async fn try_generate_endpoint(
    client: &reqwest::Client,
    base_url: &str,
    flavor: ApiFlavor,
    request: &GenerateRequest,
) -> Result<reqwest::Response, String> {
    let url = construct_api_url(base_url, flavor.generate_endpoint());
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(request)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }

    Ok(response)
}

/// Drain every complete line from `buffer`, leaving the trailing partial line
/// in place for the next read. Returns true once the stream signalled
/// completion.
fn process_buffered_lines(
    buffer: &mut Vec<u8>,
    flavor: ApiFlavor,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    while let Some(newline_pos) = memchr(b'\n', buffer) {
        let line = match std::str::from_utf8(&buffer[..newline_pos]) {
            Ok(s) => s.trim().to_string(),
            Err(err) => {
                debug!(error = %err, "skipping stream line with invalid UTF-8");
                buffer.drain(..=newline_pos);
                continue;
            }
        };
        buffer.drain(..=newline_pos);

        if process_stream_line(&line, flavor, tx, stream_id) {
            return true;
        }
    }
    false
}

/// Parse one complete stream line. Returns true when the line signals the end
/// of the stream (native `done: true`). Malformed lines are skipped.
fn process_stream_line(
    line: &str,
    flavor: ApiFlavor,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    if line.is_empty() {
        return false;
    }

    let payload = line
        .strip_prefix("data:")
        .map(str::trim_start)
        .unwrap_or(line);

    if payload == "[DONE]" {
        return false;
    }

    match flavor {
        ApiFlavor::Native => match serde_json::from_str::<GenerateChunk>(payload) {
            Ok(chunk) => {
                let done = chunk.is_done();
                if let Some(text) = chunk.response {
                    if !text.is_empty() {
                        let _ = tx.send((StreamMessage::Chunk(text), stream_id));
                    }
                }
                if done {
                    let _ = tx.send((StreamMessage::End, stream_id));
                    return true;
                }
                false
            }
            Err(_) => false,
        },
        ApiFlavor::OpenAiCompat => match serde_json::from_str::<CompletionChunk>(payload) {
            Ok(chunk) => {
                if let Some(text) = chunk.first_fragment() {
                    if !text.is_empty() {
                        let _ = tx.send((StreamMessage::Chunk(text.to_string()), stream_id));
                    }
                }
                false
            }
            Err(_) => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (
        mpsc::UnboundedSender<(StreamMessage, u64)>,
        mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    ) {
        mpsc::unbounded_channel()
    }

    fn expect_chunk(rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>, expected: &str) {
        match rx.try_recv().expect("expected a stream message") {
            (StreamMessage::Chunk(content), _) => assert_eq!(content, expected),
            (other, _) => panic!("expected chunk, got {other:?}"),
        }
    }

    #[test]
    fn native_lines_accumulate_and_done_ends_stream() {
        let (tx, mut rx) = channel();

        assert!(!process_stream_line(
            r#"data: {"response":"a"}"#,
            ApiFlavor::Native,
            &tx,
            1
        ));
        expect_chunk(&mut rx, "a");

        assert!(process_stream_line(
            r#"data: {"response":"b","done":true}"#,
            ApiFlavor::Native,
            &tx,
            1
        ));
        expect_chunk(&mut rx, "b");
        assert!(matches!(rx.try_recv(), Ok((StreamMessage::End, 1))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn native_lines_parse_without_data_prefix() {
        let (tx, mut rx) = channel();

        assert!(!process_stream_line(
            r#"{"response":"bare","done":false}"#,
            ApiFlavor::Native,
            &tx,
            7
        ));
        expect_chunk(&mut rx, "bare");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn done_sentinel_and_malformed_lines_are_skipped() {
        let (tx, mut rx) = channel();

        assert!(!process_stream_line("data: [DONE]", ApiFlavor::Native, &tx, 1));
        assert!(!process_stream_line(
            r#"data: {"response": "trunc"#,
            ApiFlavor::Native,
            &tx,
            1
        ));
        assert!(!process_stream_line("not json at all", ApiFlavor::Native, &tx, 1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn openai_lines_extract_delta_then_text() {
        let (tx, mut rx) = channel();

        assert!(!process_stream_line(
            r#"data: {"choices":[{"delta":{"content":"from-delta"}}]}"#,
            ApiFlavor::OpenAiCompat,
            &tx,
            2
        ));
        expect_chunk(&mut rx, "from-delta");

        assert!(!process_stream_line(
            r#"data: {"choices":[{"text":"from-text"}]}"#,
            ApiFlavor::OpenAiCompat,
            &tx,
            2
        ));
        expect_chunk(&mut rx, "from-text");
    }

    #[test]
    fn openai_done_sentinel_does_not_end_read() {
        // The byte stream ending is what terminates OpenAI-compatible reads.
        let (tx, mut rx) = channel();
        assert!(!process_stream_line(
            "data: [DONE]",
            ApiFlavor::OpenAiCompat,
            &tx,
            3
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn partial_line_is_held_until_newline_arrives() {
        let (tx, mut rx) = channel();
        let mut buffer: Vec<u8> = Vec::new();

        // First read ends mid-object: nothing may be parsed yet.
        buffer.extend_from_slice(br#"data: {"respo"#);
        assert!(!process_buffered_lines(&mut buffer, ApiFlavor::Native, &tx, 4));
        assert!(rx.try_recv().is_err());
        assert!(!buffer.is_empty());

        // Second read completes the object and the line.
        buffer.extend_from_slice(b"nse\":\"joined\"}\n");
        assert!(!process_buffered_lines(&mut buffer, ApiFlavor::Native, &tx, 4));
        expect_chunk(&mut rx, "joined");
        assert!(buffer.is_empty());
    }

    #[test]
    fn multiple_lines_in_one_read_are_all_processed() {
        let (tx, mut rx) = channel();
        let mut buffer: Vec<u8> = Vec::new();

        buffer.extend_from_slice(
            b"{\"response\":\"a\"}\n{\"response\":\"b\"}\n{\"response\":\"\",\"done\":true}\n",
        );
        assert!(process_buffered_lines(&mut buffer, ApiFlavor::Native, &tx, 5));

        expect_chunk(&mut rx, "a");
        expect_chunk(&mut rx, "b");
        assert!(matches!(rx.try_recv(), Ok((StreamMessage::End, 5))));
    }

    #[test]
    fn invalid_utf8_line_is_skipped_without_ending_stream() {
        let (tx, mut rx) = channel();
        let mut buffer: Vec<u8> = vec![0xff, 0xfe, b'\n'];
        buffer.extend_from_slice(b"{\"response\":\"after\"}\n");

        assert!(!process_buffered_lines(&mut buffer, ApiFlavor::Native, &tx, 6));
        expect_chunk(&mut rx, "after");
    }
}
