//! # Roundtable
//!
//! Roundtable drives group conversations between one human and an ordered set of
//! independent LLM agents that share a room. A single human message kicks off a
//! multi-round discussion in which every active agent speaks once per round,
//! each seeing the full conversation so far, including the replies produced
//! earlier in the same round.
//!
//! The crate provides:
//!
//! * **Agents**: [`Agent`] profiles with a system prompt, optional model override
//!   and an active flag.
//! * **Rooms**: [`Room`] holds ordered membership, the round count (1 to 10),
//!   the random-order flag and the persisted message log.
//! * **Scheduling**: [`DiscussionScheduler`] runs rounds and turns strictly one
//!   at a time, with pacing delays and cooperative cancellation.
//! * **Turn order**: [`turn_order::TurnOrderGenerator`] keeps stored order or
//!   reshuffles every round without letting the previous closer open the next
//!   round.
//! * **Providers**: the [`ClientWrapper`] trait, implemented for any
//!   OpenAI-compatible endpoint by [`clients::openai::OpenAIClient`], with
//!   both full and streamed replies.
//! * **Storage seams**: [`store::MessageStore`] and [`store::AgentRegistry`],
//!   with in-memory implementations for embedding and tests.
//! * **Observability**: [`event::EventHandler`] callbacks and
//!   [`scheduler::RunHandle`] state for typing indicators and stop buttons.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roundtable::clients::openai::OpenAIClient;
//! use roundtable::store::{InMemoryAgentRegistry, InMemoryRoomStore};
//! use roundtable::{Agent, CompletionConfig, DiscussionScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     roundtable::init_logger();
//!
//!     let client = Arc::new(OpenAIClient::new(CompletionConfig {
//!         api_key: std::env::var("OPEN_AI_SECRET")?,
//!         ..CompletionConfig::default()
//!     }));
//!     let store = Arc::new(InMemoryRoomStore::new());
//!     let agents = Arc::new(InMemoryAgentRegistry::new());
//!
//!     let room_id = store.create_room("Product review")?;
//!     for (id, name, prompt) in [
//!         ("pm", "Product Manager", "Focus on user value."),
//!         ("eng", "Engineer", "Focus on feasibility."),
//!     ] {
//!         agents.add_agent(Agent::new(id, name, prompt));
//!         store.add_agent_to_room(&room_id, id)?;
//!     }
//!
//!     let scheduler = DiscussionScheduler::new(store.clone(), agents, client);
//!     scheduler.send_message(&room_id, "Should we ship dark mode?").await?;
//!
//!     for message in store.messages(&room_id)? {
//!         println!("[{:?}] {}", message.agent_id, message.content);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Subsequent calls are no-ops, which makes it safe to call from every test.
///
/// ```rust
/// roundtable::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

pub mod roundtable;

// Re-exporting key items for easier external access.
pub use roundtable::agent;
pub use roundtable::agent::Agent;
pub use roundtable::client_wrapper;
pub use roundtable::client_wrapper::{ChunkStream, ClientError, ClientWrapper, ContextMessage, Role};
pub use roundtable::clients;
pub use roundtable::config;
pub use roundtable::config::{CompletionConfig, SchedulerConfig};
pub use roundtable::context;
pub use roundtable::error;
pub use roundtable::error::{DiscussionError, StoreError};
pub use roundtable::event;
pub use roundtable::event::{DiscussionEvent, EventHandler};
pub use roundtable::room;
pub use roundtable::room::{Message, MessageRole, Room};
pub use roundtable::scheduler;
pub use roundtable::scheduler::{
    DiscussionOutcome, DiscussionScheduler, DiscussionState, RunHandle, TurnRecord,
};
pub use roundtable::store;
pub use roundtable::turn_executor;
pub use roundtable::turn_order;
