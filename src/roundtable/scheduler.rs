//! The discussion scheduler: rounds, turns, pacing and cancellation.
//!
//! A run starts when the human submits a message to a room:
//!
//! 1. The working context is seeded from the room's persisted log plus the new
//!    text, and the user message is persisted.
//! 2. For each round the [`TurnOrderGenerator`] decides the speaking order
//!    (sequential, or shuffled with the last speaker of the previous round
//!    kept out of the opening slot).
//! 3. Each active agent gets one turn through the [`AgentTurnExecutor`];
//!    absent or inactive members are skipped. A fixed pause follows every turn
//!    and a longer one separates rounds.
//!
//! Turns never overlap. Each run's state is observable through its
//! [`RunHandle`]: `Idle → Running → (Idle | Cancelled)`. Stopping is
//! cooperative: the turn in flight finishes, pacing delays are cut short, and
//! no further turn starts.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roundtable::clients::openai::OpenAIClient;
//! use roundtable::scheduler::DiscussionScheduler;
//! use roundtable::store::{InMemoryAgentRegistry, InMemoryRoomStore};
//! use roundtable::{Agent, CompletionConfig, SchedulerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let store = Arc::new(InMemoryRoomStore::new());
//! let agents = Arc::new(InMemoryAgentRegistry::new());
//! let client = Arc::new(OpenAIClient::new(CompletionConfig {
//!     api_key: std::env::var("OPEN_AI_SECRET")?,
//!     ..CompletionConfig::default()
//! }));
//!
//! let optimist = agents.add_agent(Agent::new("optimist", "Optimist", "Always see the upside."));
//! let skeptic = agents.add_agent(Agent::new("skeptic", "Skeptic", "Question everything."));
//!
//! let room_id = store.create_room("Debate club")?;
//! store.add_agent_to_room(&room_id, &optimist)?;
//! store.add_agent_to_room(&room_id, &skeptic)?;
//! store.set_discussion_rounds(&room_id, 2)?;
//!
//! let scheduler = DiscussionScheduler::new(store.clone(), agents, client)
//!     .with_config(SchedulerConfig::default().with_streaming(true));
//!
//! let outcome = scheduler.send_message(&room_id, "Is remote work here to stay?").await?;
//! println!("{} turns over {} rounds", outcome.turns.len(), outcome.rounds_completed);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::roundtable::client_wrapper::ClientWrapper;
use crate::roundtable::config::SchedulerConfig;
use crate::roundtable::context::WorkingContext;
use crate::roundtable::error::{DiscussionError, StoreError};
use crate::roundtable::event::{DiscussionEvent, EventHandler};
use crate::roundtable::room::{MessageRole, Room};
use crate::roundtable::store::{AgentRegistry, MessageStore};
use crate::roundtable::turn_executor::{AgentTurnExecutor, TurnPosition};
use crate::roundtable::turn_order::TurnOrderGenerator;

/// Lifecycle of a discussion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscussionState {
    Idle,
    Running,
    Cancelled,
}

#[derive(Debug)]
struct RunStatus {
    state: DiscussionState,
    loading: bool,
    streaming_agent_id: Option<String>,
    // holds the room until the run's loop has returned, even after stop()
    active: bool,
}

/// Observable, stoppable view of one run.
///
/// Cloning is cheap; all clones share the same status and cancel handle.
#[derive(Debug, Clone)]
pub struct RunHandle {
    room_id: String,
    status: Arc<Mutex<RunStatus>>,
    cancel: CancellationToken,
}

impl RunHandle {
    /// A fresh handle in the `Running` state, for driving an
    /// [`AgentTurnExecutor`] outside the scheduler.
    pub fn new(room_id: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            status: Arc::new(Mutex::new(RunStatus {
                state: DiscussionState::Running,
                loading: true,
                streaming_agent_id: None,
                active: true,
            })),
            cancel: CancellationToken::new(),
        }
    }

    fn status(&self) -> MutexGuard<'_, RunStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn state(&self) -> DiscussionState {
        self.status().state
    }

    /// `true` from submission until the run ends or is stopped.
    pub fn is_loading(&self) -> bool {
        self.status().loading
    }

    /// The agent whose turn is in flight, for typing indicators.
    pub fn streaming_agent_id(&self) -> Option<String> {
        self.status().streaming_agent_id.clone()
    }

    /// Request cancellation.
    ///
    /// The loading flag and streaming indicator clear immediately. A turn
    /// already in flight still runs to completion.
    pub fn stop(&self) {
        self.cancel.cancel();
        let mut status = self.status();
        if status.state == DiscussionState::Running {
            status.state = DiscussionState::Cancelled;
        }
        status.loading = false;
        status.streaming_agent_id = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The run's cancel handle, for completion clients that can abort requests.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn set_streaming_agent(&self, agent_id: Option<&str>) {
        let mut status = self.status();
        if agent_id.is_some() && self.cancel.is_cancelled() {
            return;
        }
        status.streaming_agent_id = agent_id.map(str::to_string);
    }

    /// `true` until the run has fully returned, including after `stop()`.
    pub fn is_active(&self) -> bool {
        self.status().active
    }

    fn finish(&self, state: DiscussionState) {
        let mut status = self.status();
        if status.state != DiscussionState::Cancelled {
            status.state = state;
        }
        status.loading = false;
        status.streaming_agent_id = None;
        status.active = false;
    }

    /// A schedule-level failure ends in `Idle`, even after a stop request.
    fn abort(&self) {
        let mut status = self.status();
        status.state = DiscussionState::Idle;
        status.loading = false;
        status.streaming_agent_id = None;
        status.active = false;
    }
}

/// One executed turn: which agent spoke where, and into which message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRecord {
    /// 1-based.
    pub round: u32,
    /// 0-based position in that round's order.
    pub order_index: usize,
    pub agent_id: String,
    pub message_id: String,
    /// `false` when the message holds the failure text.
    pub succeeded: bool,
}

/// Result of a run that was not aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionOutcome {
    pub room_id: String,
    pub user_message_id: String,
    /// Executed turns in speaking order.
    pub turns: Vec<TurnRecord>,
    /// Rounds whose every turn was offered.
    pub rounds_completed: u32,
    pub cancelled: bool,
}

/// Top-level driver of group discussions.
pub struct DiscussionScheduler {
    store: Arc<dyn MessageStore>,
    agents: Arc<dyn AgentRegistry>,
    client: Arc<dyn ClientWrapper>,
    config: SchedulerConfig,
    turn_order: Mutex<TurnOrderGenerator>,
    runs: Mutex<HashMap<String, RunHandle>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl DiscussionScheduler {
    /// Create a scheduler with default pacing, streaming on, and an
    /// entropy-seeded turn order.
    pub fn new(
        store: Arc<dyn MessageStore>,
        agents: Arc<dyn AgentRegistry>,
        client: Arc<dyn ClientWrapper>,
    ) -> Self {
        Self {
            store,
            agents,
            client,
            config: SchedulerConfig::default(),
            turn_order: Mutex::new(TurnOrderGenerator::new()),
            runs: Mutex::new(HashMap::new()),
            event_handler: None,
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the turn order generator, typically with a seeded one.
    pub fn with_turn_order(mut self, generator: TurnOrderGenerator) -> Self {
        self.turn_order = Mutex::new(generator);
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    async fn emit(&self, event: DiscussionEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_discussion_event(&event).await;
        }
    }

    /// Handle of the most recent run in a room, if any.
    pub fn run_handle(&self, room_id: &str) -> Option<RunHandle> {
        self.runs_guard().get(room_id).cloned()
    }

    /// `Idle` when the room never ran.
    pub fn state(&self, room_id: &str) -> DiscussionState {
        self.run_handle(room_id)
            .map(|h| h.state())
            .unwrap_or(DiscussionState::Idle)
    }

    /// Stop the room's run. Returns `false` if nothing was running.
    pub fn stop(&self, room_id: &str) -> bool {
        match self.run_handle(room_id) {
            Some(handle) if handle.state() == DiscussionState::Running => {
                log::info!("DiscussionScheduler::stop(...): stopping run in room {}", room_id);
                handle.stop();
                true
            }
            _ => false,
        }
    }

    fn runs_guard(&self) -> MutexGuard<'_, HashMap<String, RunHandle>> {
        self.runs.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin_run(&self, room_id: &str) -> Result<RunHandle, DiscussionError> {
        let mut runs = self.runs_guard();
        if let Some(existing) = runs.get(room_id) {
            if existing.is_active() {
                return Err(DiscussionError::AlreadyRunning(room_id.to_string()));
            }
        }
        let handle = RunHandle::new(room_id);
        runs.insert(room_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Submit a human message and run the full multi-round discussion.
    ///
    /// # Errors
    ///
    /// Configuration failures ([`DiscussionError::EmptyMessage`],
    /// [`DiscussionError::RoomNotFound`], [`DiscussionError::NoActiveAgents`],
    /// [`DiscussionError::AlreadyRunning`]) are returned before anything is
    /// written. A store failure during the run aborts the remaining schedule
    /// and is returned as [`DiscussionError::Store`]; messages already written
    /// stay. Completion-client failures are never returned: they become the
    /// failed turn's message text.
    pub async fn send_message(
        &self,
        room_id: &str,
        text: &str,
    ) -> Result<DiscussionOutcome, DiscussionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DiscussionError::EmptyMessage);
        }

        let handle = self.begin_run(room_id)?;

        let room = match self.prepare(room_id).await {
            Ok(room) => room,
            Err(err) => {
                handle.finish(DiscussionState::Idle);
                return Err(err);
            }
        };

        match self.drive(&room, text, &handle).await {
            Ok(outcome) => {
                if outcome.cancelled {
                    handle.finish(DiscussionState::Cancelled);
                    self.emit(DiscussionEvent::RunCancelled {
                        room_id: room.id.clone(),
                        turns: outcome.turns.len(),
                    })
                    .await;
                } else {
                    handle.finish(DiscussionState::Idle);
                    self.emit(DiscussionEvent::RunCompleted {
                        room_id: room.id.clone(),
                        rounds: outcome.rounds_completed,
                        turns: outcome.turns.len(),
                    })
                    .await;
                }
                Ok(outcome)
            }
            Err(err) => {
                log::error!(
                    "DiscussionScheduler::send_message(...): run in room {} aborted: {}",
                    room.id,
                    err
                );
                handle.abort();
                self.emit(DiscussionEvent::RunAborted {
                    room_id: room.id.clone(),
                    error: err.to_string(),
                })
                .await;
                Err(err.into())
            }
        }
    }

    /// Load the room and make sure at least one member can speak.
    async fn prepare(&self, room_id: &str) -> Result<Room, DiscussionError> {
        let room = self.store.room(room_id).await.map_err(|err| match err {
            StoreError::RoomNotFound(id) => DiscussionError::RoomNotFound(id),
            other => DiscussionError::Store(other),
        })?;

        let has_active_member = room
            .agent_ids
            .iter()
            .any(|id| self.agents.get(id).is_some_and(|agent| agent.is_active));
        if !has_active_member {
            log::warn!(
                "DiscussionScheduler::prepare(...): no active agents in room {}",
                room_id
            );
            return Err(DiscussionError::NoActiveAgents(room_id.to_string()));
        }
        Ok(room)
    }

    fn next_order(&self, members: &[String], randomize: bool, last: Option<&str>) -> Vec<String> {
        self.turn_order
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .order(members, randomize, last)
    }

    /// Sleep unless the run gets cancelled first.
    async fn pause(&self, delay: Duration, handle: &RunHandle) {
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = handle.cancel.cancelled() => {}
        }
    }

    async fn drive(
        &self,
        room: &Room,
        text: &str,
        handle: &RunHandle,
    ) -> Result<DiscussionOutcome, StoreError> {
        let mut executor = AgentTurnExecutor::new(self.store.clone(), self.client.clone());
        if let Some(handler) = &self.event_handler {
            executor = executor.with_event_handler(Arc::clone(handler));
        }

        let mut context = WorkingContext::seed(&room.messages, text);

        let user_message_id = self
            .store
            .create_message(&room.id, MessageRole::User, None)
            .await?;
        self.store
            .set_content(&room.id, &user_message_id, text)
            .await?;

        let rounds = room.discussion_rounds.max(1);
        log::info!(
            "DiscussionScheduler::drive(...): room {} starting {} round(s) with {} member(s)",
            room.id,
            rounds,
            room.agent_ids.len()
        );
        self.emit(DiscussionEvent::RunStarted {
            room_id: room.id.clone(),
            user_message_id: user_message_id.clone(),
            rounds,
            member_count: room.agent_ids.len(),
        })
        .await;

        let mut turns = Vec::new();
        let mut rounds_completed = 0;
        let mut last_speaker: Option<String> = None;

        'rounds: for round in 1..=rounds {
            if handle.is_cancelled() {
                break;
            }

            let order = self.next_order(&room.agent_ids, room.random_order, last_speaker.as_deref());
            log::debug!("DiscussionScheduler::drive(...): round {} order {:?}", round, order);
            self.emit(DiscussionEvent::RoundStarted {
                room_id: room.id.clone(),
                round,
                order: order.clone(),
            })
            .await;

            let last_index = order.len().saturating_sub(1);
            for (index, agent_id) in order.iter().enumerate() {
                if handle.is_cancelled() {
                    break 'rounds;
                }

                let agent = match self.agents.get(agent_id) {
                    Some(agent) if agent.is_active => agent,
                    _ => {
                        log::warn!(
                            "DiscussionScheduler::drive(...): skipping absent or inactive agent {}",
                            agent_id
                        );
                        self.emit(DiscussionEvent::AgentSkipped {
                            room_id: room.id.clone(),
                            round,
                            agent_id: agent_id.clone(),
                        })
                        .await;
                        continue;
                    }
                };

                let position = TurnPosition {
                    round,
                    order_index: index,
                };
                let outcome = executor
                    .run(
                        &room.id,
                        position,
                        &mut context,
                        &agent,
                        self.config.streaming,
                        handle,
                    )
                    .await?;

                turns.push(TurnRecord {
                    round,
                    order_index: index,
                    agent_id: agent_id.clone(),
                    message_id: outcome.message_id().to_string(),
                    succeeded: outcome.is_success(),
                });

                if index == last_index {
                    last_speaker = Some(agent_id.clone());
                }

                self.pause(self.config.inter_agent_delay, handle).await;
            }

            rounds_completed = round;
            self.emit(DiscussionEvent::RoundCompleted {
                room_id: room.id.clone(),
                round,
            })
            .await;

            if round < rounds {
                self.pause(self.config.inter_round_delay, handle).await;
            }
        }

        Ok(DiscussionOutcome {
            room_id: room.id.clone(),
            user_message_id,
            turns,
            rounds_completed,
            cancelled: handle.is_cancelled(),
        })
    }
}
