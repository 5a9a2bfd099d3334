//! One agent's turn.
//!
//! The executor creates the turn's message, marks the agent as streaming,
//! drives the completion client (chunked or single response), writes content
//! into the store, clears the streaming mark and, on success, appends the reply
//! to the working context.
//!
//! Completion failures are contained here: the message gets the fixed error
//! text and the executor returns normally. Only store failures propagate, and
//! those abort the whole run.

use futures_util::StreamExt;
use std::sync::Arc;

use crate::roundtable::agent::Agent;
use crate::roundtable::client_wrapper::{ClientError, ClientWrapper};
use crate::roundtable::context::WorkingContext;
use crate::roundtable::error::StoreError;
use crate::roundtable::event::{DiscussionEvent, EventHandler};
use crate::roundtable::room::MessageRole;
use crate::roundtable::scheduler::RunHandle;
use crate::roundtable::store::MessageStore;

/// Literal content written into a failed turn's message.
///
/// ```rust
/// use roundtable::turn_executor::failure_message;
///
/// assert_eq!(failure_message("Skeptic"), "Error: Failed to get response from Skeptic");
/// ```
pub fn failure_message(agent_name: &str) -> String {
    format!("Error: Failed to get response from {}", agent_name)
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed {
        message_id: String,
        content: String,
    },
    Failed {
        message_id: String,
        error: String,
    },
}

impl TurnOutcome {
    pub fn message_id(&self) -> &str {
        match self {
            TurnOutcome::Completed { message_id, .. } | TurnOutcome::Failed { message_id, .. } => {
                message_id
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }
}

/// Where a turn sits in the schedule; used to label events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPosition {
    /// 1-based.
    pub round: u32,
    /// 0-based within the round's order.
    pub order_index: usize,
}

/// Drives a single agent's request/response or streaming lifecycle.
pub struct AgentTurnExecutor {
    store: Arc<dyn MessageStore>,
    client: Arc<dyn ClientWrapper>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl AgentTurnExecutor {
    pub fn new(store: Arc<dyn MessageStore>, client: Arc<dyn ClientWrapper>) -> Self {
        Self {
            store,
            client,
            event_handler: None,
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    async fn emit(&self, event: DiscussionEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_discussion_event(&event).await;
        }
    }

    /// Run one turn for an active agent.
    ///
    /// Inactive agents must be filtered out by the caller.
    pub async fn run(
        &self,
        room_id: &str,
        position: TurnPosition,
        context: &mut WorkingContext,
        agent: &Agent,
        streaming: bool,
        handle: &RunHandle,
    ) -> Result<TurnOutcome, StoreError> {
        let message_id = self
            .store
            .create_message(room_id, MessageRole::Assistant, Some(&agent.id))
            .await?;
        handle.set_streaming_agent(Some(&agent.id));

        self.emit(DiscussionEvent::TurnStarted {
            room_id: room_id.to_string(),
            round: position.round,
            order_index: position.order_index,
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            message_id: message_id.clone(),
        })
        .await;

        let result = if streaming {
            self.stream_reply(room_id, &message_id, context, agent).await
        } else {
            self.complete_reply(room_id, &message_id, context, agent)
                .await
        };

        handle.set_streaming_agent(None);

        match result? {
            Ok(content) => {
                log::debug!(
                    "AgentTurnExecutor::run(...): {} replied with {} chars",
                    agent.name,
                    content.len()
                );
                context.push_agent_reply(agent, content.clone());
                self.emit(DiscussionEvent::TurnCompleted {
                    room_id: room_id.to_string(),
                    round: position.round,
                    agent_id: agent.id.clone(),
                    message_id: message_id.clone(),
                    response_length: content.chars().count(),
                })
                .await;
                Ok(TurnOutcome::Completed {
                    message_id,
                    content,
                })
            }
            Err(err) => {
                log::error!(
                    "AgentTurnExecutor::run(...): error getting response from {}: {}",
                    agent.name,
                    err
                );
                self.store
                    .set_content(room_id, &message_id, &failure_message(&agent.name))
                    .await?;
                self.emit(DiscussionEvent::TurnFailed {
                    room_id: room_id.to_string(),
                    round: position.round,
                    agent_id: agent.id.clone(),
                    message_id: message_id.clone(),
                    error: err.to_string(),
                })
                .await;
                Ok(TurnOutcome::Failed {
                    message_id,
                    error: err.to_string(),
                })
            }
        }
    }

    /// Outer `Result` carries store failures, inner one the client's.
    async fn stream_reply(
        &self,
        room_id: &str,
        message_id: &str,
        context: &WorkingContext,
        agent: &Agent,
    ) -> Result<Result<String, ClientError>, StoreError> {
        let mut stream = match self
            .client
            .send_message_stream(context.messages(), Some(agent))
            .await
        {
            Ok(stream) => stream,
            Err(err) => return Ok(Err(err)),
        };

        let mut full_content = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(text) => {
                    full_content.push_str(&text);
                    self.store
                        .set_content(room_id, message_id, &full_content)
                        .await?;
                }
                Err(err) => return Ok(Err(err)),
            }
        }
        Ok(Ok(full_content))
    }

    async fn complete_reply(
        &self,
        room_id: &str,
        message_id: &str,
        context: &WorkingContext,
        agent: &Agent,
    ) -> Result<Result<String, ClientError>, StoreError> {
        match self
            .client
            .send_message(context.messages(), Some(agent))
            .await
        {
            Ok(content) => {
                self.store.set_content(room_id, message_id, &content).await?;
                Ok(Ok(content))
            }
            Err(err) => Ok(Err(err)),
        }
    }
}
