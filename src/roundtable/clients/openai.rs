//! The `OpenAIClient` struct implements `ClientWrapper` for any OpenAI-compatible
//! Chat Completions endpoint (OpenAI itself, Azure-style proxies, local servers).
//!
//! # Key Features
//!
//! - **System prompt**: the speaking agent's system prompt is prepended to the
//!   working context on every request.
//! - **Model override**: an agent's `model` replaces the configured default.
//! - **Speaker names**: the context's `name` labels are forwarded as-is.
//! - **Streaming**: server-sent events decoded into a stream of content chunks.
//!
//! # Example
//!
//! ```rust,no_run
//! use roundtable::clients::openai::OpenAIClient;
//! use roundtable::{Agent, ClientWrapper, CompletionConfig, ContextMessage};
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret_key: String = std::env::var("OPEN_AI_SECRET").unwrap_or_default();
//!     let client = OpenAIClient::new(CompletionConfig {
//!         api_key: secret_key,
//!         model: "gpt-4.1-nano".into(),
//!         ..CompletionConfig::default()
//!     });
//!
//!     if !client.test_connection().await {
//!         eprintln!("endpoint unreachable");
//!         return;
//!     }
//!
//!     let agent = Agent::new("poet", "Poet", "Answer in rhyme.");
//!     match client.send_message(&[ContextMessage::user("Hello!")], Some(&agent)).await {
//!         Ok(reply) => println!("Poet: {}", reply),
//!         Err(err) => eprintln!("error: {}", err),
//!     }
//! }
//! ```

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::pin::Pin;

use crate::roundtable::agent::Agent;
use crate::roundtable::client_wrapper::{ChunkStream, ClientError, ClientWrapper, ContextMessage};
use crate::roundtable::clients::common::{completions_url, http_client, ApiError, SseDecoder};
use crate::roundtable::config::CompletionConfig;

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Vec<u8>>> + Send>>;

struct StreamState {
    bytes: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Client for OpenAI-compatible chat completion endpoints.
pub struct OpenAIClient {
    config: CompletionConfig,
    url: String,
}

impl OpenAIClient {
    pub fn new(config: CompletionConfig) -> Self {
        let url = completions_url(&config.endpoint);
        log::debug!("OpenAIClient::new(...): using {}", url);
        Self { config, url }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Fully resolved `/chat/completions` URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// JSON body for a chat completion request.
    pub fn request_body(
        &self,
        messages: &[ContextMessage],
        agent: Option<&Agent>,
        stream: bool,
    ) -> Value {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if let Some(agent) = agent {
            wire.push(json!({ "role": "system", "content": agent.system_prompt }));
        }
        for message in messages {
            let mut entry = json!({ "role": message.role.as_str(), "content": message.content });
            if let Some(name) = &message.name {
                entry["name"] = json!(name);
            }
            wire.push(entry);
        }

        let model = agent
            .and_then(|a| a.model.clone())
            .unwrap_or_else(|| self.config.model.clone());

        let mut body = json!({
            "model": model,
            "messages": wire,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "stream": stream,
        });
        if let Some(top_p) = self.config.top_p {
            body["top_p"] = json!(top_p);
        }
        body
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response, ClientError> {
        let response = http_client()
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!(
                "OpenAIClient::post(...): {} returned {}: {}",
                self.url,
                status,
                body
            );
            return Err(Box::new(ApiError {
                status: status.as_u16(),
                body,
            }));
        }
        Ok(response)
    }

    /// Probe the endpoint with a one-token request. Never errors.
    pub async fn test_connection(&self) -> bool {
        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": "test" }],
            "max_tokens": 1,
        });
        match self.post(&body).await {
            Ok(_) => true,
            Err(err) => {
                log::error!("OpenAIClient::test_connection(...): connection test failed: {}", err);
                false
            }
        }
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    async fn send_message(
        &self,
        messages: &[ContextMessage],
        agent: Option<&Agent>,
    ) -> Result<String, ClientError> {
        let body = self.request_body(messages, agent, false);
        let response: CompletionResponse = self.post(&body).await?.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| "OpenAI API returned no choices".into())
    }

    async fn send_message_stream(
        &self,
        messages: &[ContextMessage],
        agent: Option<&Agent>,
    ) -> Result<ChunkStream, ClientError> {
        let body = self.request_body(messages, agent, true);
        let response = self.post(&body).await?;

        let state = StreamState {
            bytes: Box::pin(response.bytes_stream().map(|r| r.map(|b| b.to_vec()))),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            finished: false,
        };

        let chunks = stream::unfold(state, |mut state| async move {
            loop {
                if let Some(chunk) = state.pending.pop_front() {
                    return Some((Ok(chunk), state));
                }
                if state.finished || state.decoder.is_done() {
                    return None;
                }
                match state.bytes.next().await {
                    Some(Ok(bytes)) => {
                        let decoded = state.decoder.feed(&bytes);
                        state.pending.extend(decoded);
                    }
                    Some(Err(err)) => {
                        state.finished = true;
                        return Some((Err(Box::new(err) as ClientError), state));
                    }
                    None => state.finished = true,
                }
            }
        });

        Ok(Box::pin(chunks))
    }
}
