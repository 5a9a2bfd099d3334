//! The completion-client seam.
//!
//! A [`ClientWrapper`] is a wrapper around a specific chat-completion service.
//! It does not keep track of the conversation: the discussion scheduler owns the
//! working context and hands the full sequence to the wrapper on every turn.
//! The wrapper is responsible for prepending the agent's system prompt and for
//! honouring the agent's model override.

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::pin::Pin;

use crate::roundtable::agent::Agent;

/// Represents the possible roles for a context entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    // set by the client wrapper from the agent's system prompt
    System,
    // the human participant
    User,
    // any agent's reply
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the working context sent to the completion API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    /// The role associated with the entry.
    pub role: Role,
    /// The text of the entry.
    pub content: String,
    /// API-safe speaker label, only set on agent replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ContextMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            name: None,
        }
    }

    pub fn assistant(content: impl Into<String>, name: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            name,
        }
    }
}

/// Error type returned by completion clients.
pub type ClientError = Box<dyn Error + Send + Sync>;

/// A finite, non-restartable sequence of content chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Trait defining the interface to a chat-completion service.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send the working context and wait for the full reply.
    /// - `messages`: the working context, without any system prompt.
    /// - `agent`: the speaking agent; supplies the system prompt and model override.
    async fn send_message(
        &self,
        messages: &[ContextMessage],
        agent: Option<&Agent>,
    ) -> Result<String, ClientError>;

    /// Send the working context and get the reply as a stream of chunks.
    ///
    /// The default implementation returns an error so wrappers without streaming
    /// support still satisfy the trait.
    async fn send_message_stream(
        &self,
        _messages: &[ContextMessage],
        _agent: Option<&Agent>,
    ) -> Result<ChunkStream, ClientError> {
        Err("Streaming not supported by this client".into())
    }
}
