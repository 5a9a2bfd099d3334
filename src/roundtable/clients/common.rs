//! Plumbing shared by HTTP completion clients: a pooled `reqwest::Client`,
//! the API error type and the server-sent-events decoder.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

lazy_static::lazy_static! {
    /// One connection pool for every client instance.
    static ref HTTP_CLIENT: reqwest::Client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(300))
        .build()
        .unwrap_or_else(|err| {
            log::warn!(
                "roundtable::clients::common: falling back to default HTTP client: {}",
                err
            );
            reqwest::Client::new()
        });
}

/// Shared HTTP client; cloning only bumps a reference count.
pub fn http_client() -> reqwest::Client {
    HTTP_CLIENT.clone()
}

/// Non-success HTTP status from a completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenAI API error: {} - {}", self.status, self.body)
    }
}

impl std::error::Error for ApiError {}

/// Append `/chat/completions` unless the endpoint already names it.
///
/// ```rust
/// use roundtable::clients::common::completions_url;
///
/// assert_eq!(
///     completions_url("https://api.openai.com/v1"),
///     "https://api.openai.com/v1/chat/completions"
/// );
/// assert_eq!(
///     completions_url("http://localhost:8080/v1/chat/completions"),
///     "http://localhost:8080/v1/chat/completions"
/// );
/// ```
pub fn completions_url(endpoint: &str) -> String {
    if endpoint.contains("/chat/completions") {
        endpoint.to_string()
    } else {
        format!("{}/chat/completions", endpoint.trim_end_matches('/'))
    }
}

#[derive(Deserialize)]
struct StreamFrame {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

/// Incremental decoder for `text/event-stream` chat completion bodies.
///
/// Bytes are buffered until a full line is available, so frames and multi-byte
/// characters split across network reads decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed raw bytes; returns the content deltas of every complete frame.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut chunks = Vec::new();
        if self.done {
            return chunks;
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            let Some(data) = line.strip_prefix("data: ") else {
                continue;
            };
            if data == "[DONE]" {
                self.done = true;
                self.buffer.clear();
                break;
            }
            match serde_json::from_str::<StreamFrame>(data) {
                Ok(frame) => {
                    if let Some(content) = frame
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content)
                        .filter(|content| !content.is_empty())
                    {
                        chunks.push(content);
                    }
                }
                Err(err) => {
                    log::error!("SseDecoder::feed(...): failed to parse SSE data: {}", err);
                }
            }
        }
        chunks
    }
}
