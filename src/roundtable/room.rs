//! Rooms and their durable message log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roundtable::client_wrapper::Role;
use crate::roundtable::config::DEFAULT_DISCUSSION_ROUNDS;

/// Author of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl From<MessageRole> for Role {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Role::User,
            MessageRole::Assistant => Role::Assistant,
        }
    }
}

/// A persisted chat message.
///
/// Agent turns create exactly one `Message` with empty content and then update
/// it in place until the turn completes or fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    /// Owning agent; `None` for user messages.
    pub agent_id: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Fresh, empty message with a random id.
    pub fn new(role: MessageRole, agent_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            agent_id,
            content: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// A named conversation with its member agents and message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    /// Member agent ids in speaking order.
    pub agent_ids: Vec<String>,
    /// Rounds per discussion run; always at least one.
    pub discussion_rounds: u32,
    /// Shuffle the speaking order every round.
    pub random_order: bool,
    /// Message log in insertion order.
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// New empty room: three rounds, sequential order.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            agent_ids: Vec::new(),
            discussion_rounds: DEFAULT_DISCUSSION_ROUNDS,
            random_order: false,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }
}
