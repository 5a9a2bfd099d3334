//! Collaborator seams owned by the hosting application.
//!
//! The scheduler never reaches for global state: it is handed a
//! [`MessageStore`] and an [`AgentRegistry`] at construction. Each store
//! mutation is treated as independently atomic; the core holds no locks across
//! calls and performs no transactions.
//!
//! [`InMemoryRoomStore`] and [`InMemoryAgentRegistry`] are complete reference
//! implementations, suitable for tests and for hosts without persistence.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::roundtable::agent::Agent;
use crate::roundtable::config::clamp_discussion_rounds;
use crate::roundtable::error::StoreError;
use crate::roundtable::room::{Message, MessageRole, Room};

/// Durable room and message storage.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Snapshot of a room, messages in insertion order.
    async fn room(&self, room_id: &str) -> Result<Room, StoreError>;

    /// Append an empty message and return its id. The message is visible to
    /// readers as soon as this returns.
    async fn create_message(
        &self,
        room_id: &str,
        role: MessageRole,
        agent_id: Option<&str>,
    ) -> Result<String, StoreError>;

    /// Replace the full content of a message. Idempotent.
    async fn set_content(
        &self,
        room_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<(), StoreError>;
}

/// Lookup of agent personas by id.
pub trait AgentRegistry: Send + Sync {
    fn get(&self, agent_id: &str) -> Option<Agent>;
}

fn poisoned() -> StoreError {
    StoreError::Backend("store lock poisoned".to_string())
}

/// Process-local room store.
#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: RwLock<Vec<Room>>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with default settings and return its id.
    pub fn create_room(&self, name: impl Into<String>) -> Result<String, StoreError> {
        let room = Room::new(name);
        let id = room.id.clone();
        self.rooms.write().map_err(|_| poisoned())?.push(room);
        Ok(id)
    }

    /// Insert a fully formed room, e.g. one loaded by the host.
    pub fn insert_room(&self, room: Room) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().map_err(|_| poisoned())?;
        rooms.retain(|r| r.id != room.id);
        rooms.push(room);
        Ok(())
    }

    pub fn delete_room(&self, room_id: &str) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().map_err(|_| poisoned())?;
        let before = rooms.len();
        rooms.retain(|r| r.id != room_id);
        if rooms.len() == before {
            return Err(StoreError::RoomNotFound(room_id.to_string()));
        }
        Ok(())
    }

    pub fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        Ok(self.rooms.read().map_err(|_| poisoned())?.clone())
    }

    pub fn rename_room(&self, room_id: &str, name: impl Into<String>) -> Result<(), StoreError> {
        let name = name.into();
        self.with_room_mut(room_id, |room| room.name = name)
    }

    /// Add a member; adding an existing member is a no-op.
    pub fn add_agent_to_room(&self, room_id: &str, agent_id: &str) -> Result<(), StoreError> {
        self.with_room_mut(room_id, |room| {
            if !room.agent_ids.iter().any(|id| id == agent_id) {
                room.agent_ids.push(agent_id.to_string());
            }
        })
    }

    pub fn remove_agent_from_room(&self, room_id: &str, agent_id: &str) -> Result<(), StoreError> {
        self.with_room_mut(room_id, |room| room.agent_ids.retain(|id| id != agent_id))
    }

    /// Set the round count, clamped to the supported range.
    pub fn set_discussion_rounds(&self, room_id: &str, rounds: u32) -> Result<u32, StoreError> {
        let rounds = clamp_discussion_rounds(rounds);
        self.with_room_mut(room_id, |room| room.discussion_rounds = rounds)?;
        Ok(rounds)
    }

    pub fn set_random_order(&self, room_id: &str, random_order: bool) -> Result<(), StoreError> {
        self.with_room_mut(room_id, |room| room.random_order = random_order)
    }

    pub fn delete_message(&self, room_id: &str, message_id: &str) -> Result<(), StoreError> {
        let mut found = false;
        self.with_room_mut(room_id, |room| {
            let before = room.messages.len();
            room.messages.retain(|m| m.id != message_id);
            found = room.messages.len() != before;
        })?;
        if !found {
            return Err(StoreError::MessageNotFound {
                room_id: room_id.to_string(),
                message_id: message_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn messages(&self, room_id: &str) -> Result<Vec<Message>, StoreError> {
        let rooms = self.rooms.read().map_err(|_| poisoned())?;
        rooms
            .iter()
            .find(|r| r.id == room_id)
            .map(|r| r.messages.clone())
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))
    }

    fn with_room_mut<F>(&self, room_id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Room),
    {
        let mut rooms = self.rooms.write().map_err(|_| poisoned())?;
        let room = rooms
            .iter_mut()
            .find(|r| r.id == room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))?;
        f(room);
        room.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl MessageStore for InMemoryRoomStore {
    async fn room(&self, room_id: &str) -> Result<Room, StoreError> {
        let rooms = self.rooms.read().map_err(|_| poisoned())?;
        rooms
            .iter()
            .find(|r| r.id == room_id)
            .cloned()
            .ok_or_else(|| StoreError::RoomNotFound(room_id.to_string()))
    }

    async fn create_message(
        &self,
        room_id: &str,
        role: MessageRole,
        agent_id: Option<&str>,
    ) -> Result<String, StoreError> {
        let message = Message::new(role, agent_id.map(str::to_string));
        let id = message.id.clone();
        self.with_room_mut(room_id, |room| room.messages.push(message))?;
        Ok(id)
    }

    async fn set_content(
        &self,
        room_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        let mut found = false;
        self.with_room_mut(room_id, |room| {
            if let Some(msg) = room.messages.iter_mut().find(|m| m.id == message_id) {
                msg.content = content.to_string();
                found = true;
            }
        })?;
        if !found {
            return Err(StoreError::MessageNotFound {
                room_id: room_id.to_string(),
                message_id: message_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Process-local agent registry preserving insertion order.
#[derive(Default)]
pub struct InMemoryAgentRegistry {
    agents: RwLock<Vec<Agent>>,
}

impl InMemoryAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent, replacing any previous agent with the same id.
    /// Returns the id for convenience.
    pub fn add_agent(&self, agent: Agent) -> String {
        let id = agent.id.clone();
        if let Ok(mut agents) = self.agents.write() {
            agents.retain(|a| a.id != id);
            agents.push(agent);
        }
        id
    }

    /// Apply `update` to the agent; returns `false` if it does not exist.
    pub fn update_agent<F>(&self, agent_id: &str, update: F) -> bool
    where
        F: FnOnce(&mut Agent),
    {
        let Ok(mut agents) = self.agents.write() else {
            return false;
        };
        match agents.iter_mut().find(|a| a.id == agent_id) {
            Some(agent) => {
                update(agent);
                true
            }
            None => false,
        }
    }

    pub fn remove_agent(&self, agent_id: &str) -> Option<Agent> {
        let mut agents = self.agents.write().ok()?;
        let index = agents.iter().position(|a| a.id == agent_id)?;
        Some(agents.remove(index))
    }

    /// Flip the active flag; returns the new value.
    pub fn toggle_active(&self, agent_id: &str) -> Option<bool> {
        let mut new_state = None;
        self.update_agent(agent_id, |agent| {
            agent.is_active = !agent.is_active;
            new_state = Some(agent.is_active);
        });
        new_state
    }

    pub fn list(&self) -> Vec<Agent> {
        self.agents.read().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn active_agents(&self) -> Vec<Agent> {
        self.list().into_iter().filter(|a| a.is_active).collect()
    }
}

impl AgentRegistry for InMemoryAgentRegistry {
    fn get(&self, agent_id: &str) -> Option<Agent> {
        self.agents
            .read()
            .ok()?
            .iter()
            .find(|a| a.id == agent_id)
            .cloned()
    }
}
