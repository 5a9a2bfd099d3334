//! Discussion event system.
//!
//! Provides a callback-based observability layer for discussion runs.
//! Implement [`EventHandler`] to receive real-time notifications about run
//! lifecycle, round boundaries and individual agent turns.
//!
//! The handler is wrapped in `Arc<dyn EventHandler>` and registered on the
//! scheduler via
//! [`with_event_handler`](crate::scheduler::DiscussionScheduler::with_event_handler).
//! Events are delivered inline, in order, on the run's own task.
//!
//! # Event Flow (one run)
//!
//! ```text
//! RunStarted
//!   └─ RoundStarted { round: 1, order }
//!       ├─ TurnStarted → TurnCompleted | TurnFailed
//!       ├─ AgentSkipped            (absent or inactive member)
//!       └─ ...
//!   └─ RoundCompleted { round: 1 }
//!   └─ ...
//! RunCompleted | RunCancelled | RunAborted
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use roundtable::event::{DiscussionEvent, EventHandler};
//! use async_trait::async_trait;
//!
//! struct Typing;
//!
//! #[async_trait]
//! impl EventHandler for Typing {
//!     async fn on_discussion_event(&self, event: &DiscussionEvent) {
//!         if let DiscussionEvent::TurnStarted { agent_name, .. } = event {
//!             println!("{} is typing...", agent_name);
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;

/// Events emitted by a [`DiscussionScheduler`](crate::scheduler::DiscussionScheduler).
///
/// Round numbers are 1-based; `order_index` is 0-based within the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscussionEvent {
    /// The user message has been persisted and the first round is about to start.
    RunStarted {
        room_id: String,
        user_message_id: String,
        rounds: u32,
        member_count: usize,
    },

    RoundStarted {
        room_id: String,
        round: u32,
        /// Agent ids in the order they will be offered a turn.
        order: Vec<String>,
    },

    /// The turn's message exists (empty) and the agent is marked as streaming.
    TurnStarted {
        room_id: String,
        round: u32,
        order_index: usize,
        agent_id: String,
        agent_name: String,
        message_id: String,
    },

    TurnCompleted {
        room_id: String,
        round: u32,
        agent_id: String,
        message_id: String,
        /// Character length of the final reply.
        response_length: usize,
    },

    /// The completion client failed; the message holds the error text.
    TurnFailed {
        room_id: String,
        round: u32,
        agent_id: String,
        message_id: String,
        error: String,
    },

    /// A member id that is not registered or whose agent is inactive.
    AgentSkipped {
        room_id: String,
        round: u32,
        agent_id: String,
    },

    RoundCompleted { room_id: String, round: u32 },

    RunCompleted {
        room_id: String,
        rounds: u32,
        turns: usize,
    },

    /// A stop request was honoured; no further turns will start.
    RunCancelled { room_id: String, turns: usize },

    /// A failure outside turn isolation ended the run early.
    RunAborted { room_id: String, error: String },
}

/// Trait for receiving discussion events.
///
/// The method has a default no-op implementation. The `Send + Sync` bound lets
/// one handler be shared by several schedulers.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_discussion_event(&self, _event: &DiscussionEvent) {}
}
