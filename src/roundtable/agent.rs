//! Agent personas.
//!
//! An [`Agent`] is read-only from the scheduler's point of view: it supplies a
//! display name (used to label replies in the working context), a system prompt
//! and an optional model override for the completion client.

use serde::{Deserialize, Serialize};

/// A configured persona that produces assistant turns.
///
/// # Examples
///
/// ```
/// use roundtable::Agent;
///
/// let agent = Agent::new("critic", "Film Critic", "You review movies harshly.")
///     .with_model("gpt-4o-mini")
///     .with_avatar("🎬");
///
/// assert!(agent.is_active);
/// assert_eq!(agent.model.as_deref(), Some("gpt-4o-mini"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Stable identifier referenced by room membership lists.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Prepended to every request made on this agent's behalf.
    pub system_prompt: String,
    /// Overrides the completion client's default model when set.
    pub model: Option<String>,
    /// Inactive agents are skipped by the scheduler.
    pub is_active: bool,
    /// Short description shown to humans; never sent to the API.
    pub personality: Option<String>,
    pub avatar: Option<String>,
}

impl Agent {
    /// Create an active agent with no model override.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            system_prompt: system_prompt.into(),
            model: None,
            is_active: true,
            personality: None,
            avatar: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.personality = Some(personality.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Builder variant of toggling the active flag.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}
