//! Configuration for roundtable.
//!
//! Provides [`CompletionConfig`] for the bundled OpenAI-compatible client and
//! [`SchedulerConfig`] for the discussion scheduler. Users construct these
//! manually; no file parsing dependencies are required.
//!
//! # Example
//!
//! ```rust
//! use roundtable::{CompletionConfig, SchedulerConfig};
//! use std::time::Duration;
//!
//! let completion = CompletionConfig {
//!     api_key: "sk-...".into(),
//!     model: "gpt-4o-mini".into(),
//!     ..CompletionConfig::default()
//! };
//!
//! let scheduler = SchedulerConfig::default()
//!     .with_streaming(false)
//!     .with_inter_agent_delay(Duration::from_millis(250));
//! assert_eq!(scheduler.inter_round_delay, Duration::from_millis(1000));
//! ```

use std::time::Duration;

/// Rounds used by rooms that never had the setting changed.
pub const DEFAULT_DISCUSSION_ROUNDS: u32 = 3;
/// Lower bound enforced when a room's round count is changed.
pub const MIN_DISCUSSION_ROUNDS: u32 = 1;
/// Upper bound enforced when a room's round count is changed.
pub const MAX_DISCUSSION_ROUNDS: u32 = 10;

/// Pause after every agent turn.
pub const DEFAULT_INTER_AGENT_DELAY: Duration = Duration::from_millis(500);
/// Pause between two rounds (not after the last one).
pub const DEFAULT_INTER_ROUND_DELAY: Duration = Duration::from_millis(1000);

/// Clamp a requested round count into `MIN_DISCUSSION_ROUNDS..=MAX_DISCUSSION_ROUNDS`.
///
/// ```rust
/// use roundtable::config::clamp_discussion_rounds;
///
/// assert_eq!(clamp_discussion_rounds(0), 1);
/// assert_eq!(clamp_discussion_rounds(4), 4);
/// assert_eq!(clamp_discussion_rounds(42), 10);
/// ```
pub fn clamp_discussion_rounds(rounds: u32) -> u32 {
    rounds.clamp(MIN_DISCUSSION_ROUNDS, MAX_DISCUSSION_ROUNDS)
}

/// Settings for [`OpenAIClient`](crate::clients::openai::OpenAIClient).
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Sent as a bearer token.
    pub api_key: String,
    /// Base URL or full `/chat/completions` URL.
    pub endpoint: String,
    /// Model used when the speaking agent has no override.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: Option<f64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            top_p: None,
        }
    }
}

/// Session-wide settings consumed by the
/// [`DiscussionScheduler`](crate::scheduler::DiscussionScheduler).
///
/// Round count and random ordering are per room and live on
/// [`Room`](crate::room::Room).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Consume replies chunk by chunk instead of waiting for the full response.
    pub streaming: bool,
    pub inter_agent_delay: Duration,
    pub inter_round_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            streaming: true,
            inter_agent_delay: DEFAULT_INTER_AGENT_DELAY,
            inter_round_delay: DEFAULT_INTER_ROUND_DELAY,
        }
    }
}

impl SchedulerConfig {
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_inter_agent_delay(mut self, delay: Duration) -> Self {
        self.inter_agent_delay = delay;
        self
    }

    pub fn with_inter_round_delay(mut self, delay: Duration) -> Self {
        self.inter_round_delay = delay;
        self
    }

    /// Zero pacing; handy for tests and batch use.
    pub fn without_delays(self) -> Self {
        self.with_inter_agent_delay(Duration::ZERO)
            .with_inter_round_delay(Duration::ZERO)
    }
}
