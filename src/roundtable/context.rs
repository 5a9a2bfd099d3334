//! The working context: the ordered conversation sent to the completion API.
//!
//! A [`WorkingContext`] is seeded from a room's persisted messages plus the
//! newly submitted user text, then grows by one `assistant` entry after every
//! successful agent turn so later speakers see earlier replies. It lives only
//! for the duration of one discussion run and is never persisted.
//!
//! No truncation or summarisation happens here; any token budgeting is left to
//! the completion client.
//!
//! ```rust
//! use roundtable::context::WorkingContext;
//! use roundtable::{Agent, Role};
//!
//! let mut ctx = WorkingContext::seed(&[], "Hi");
//! ctx.push_agent_reply(&Agent::new("a", "Dr. Who?", "..."), "Hello!");
//!
//! let last = ctx.messages().last().unwrap();
//! assert_eq!(last.role, Role::Assistant);
//! assert_eq!(last.name.as_deref(), Some("DrWho"));
//! ```

use crate::roundtable::agent::Agent;
use crate::roundtable::client_wrapper::ContextMessage;
use crate::roundtable::room::Message;

/// Run-scoped conversation history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingContext {
    messages: Vec<ContextMessage>,
}

impl WorkingContext {
    /// Build the initial context: every persisted message (role and content
    /// only) followed by the new user entry.
    pub fn seed(persisted: &[Message], user_text: &str) -> Self {
        let mut messages: Vec<ContextMessage> = persisted
            .iter()
            .map(|msg| ContextMessage {
                role: msg.role.into(),
                content: msg.content.clone(),
                name: None,
            })
            .collect();
        messages.push(ContextMessage::user(user_text));
        Self { messages }
    }

    /// Append a completed reply, tagged with the agent's API-safe name.
    pub fn push_agent_reply(&mut self, agent: &Agent, content: impl Into<String>) {
        self.messages
            .push(ContextMessage::assistant(content, api_safe_name(&agent.name)));
    }

    pub fn messages(&self) -> &[ContextMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Strip every character outside `[A-Za-z0-9_-]` from a display name.
///
/// Returns `None` when nothing survives, since chat APIs reject an empty
/// `name`. Collisions are not deduplicated.
///
/// ```rust
/// use roundtable::context::api_safe_name;
///
/// assert_eq!(api_safe_name("Technical Expert").as_deref(), Some("TechnicalExpert"));
/// assert_eq!(api_safe_name("gpt_4-mini").as_deref(), Some("gpt_4-mini"));
/// assert_eq!(api_safe_name("🤖 🎨"), None);
/// ```
pub fn api_safe_name(display_name: &str) -> Option<String> {
    let name: String = display_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roundtable::client_wrapper::Role;
    use crate::roundtable::room::MessageRole;

    fn persisted(role: MessageRole, content: &str) -> Message {
        let mut msg = Message::new(role, None);
        msg.content = content.to_string();
        msg
    }

    #[test]
    fn test_seed_ends_with_user_entry() {
        let history = vec![
            persisted(MessageRole::User, "earlier question"),
            persisted(MessageRole::Assistant, "earlier answer"),
        ];
        let ctx = WorkingContext::seed(&history, "new question");

        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.messages()[0].content, "earlier question");
        assert_eq!(ctx.messages()[1].role, Role::Assistant);
        assert!(ctx.messages()[1].name.is_none());
        assert_eq!(ctx.messages()[2], ContextMessage::user("new question"));
    }

    #[test]
    fn test_replies_append_in_order() {
        let mut ctx = WorkingContext::seed(&[], "Hi");
        ctx.push_agent_reply(&Agent::new("a", "Ann", ""), "one");
        ctx.push_agent_reply(&Agent::new("b", "Ann", ""), "two");

        let names: Vec<_> = ctx.messages().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec![None, Some("Ann".into()), Some("Ann".into())]);
        assert_eq!(ctx.messages()[2].content, "two");
    }

    #[test]
    fn test_name_without_safe_characters_is_omitted() {
        let mut ctx = WorkingContext::seed(&[], "Hi");
        ctx.push_agent_reply(&Agent::new("a", "Éé !", ""), "reply");
        assert!(ctx.messages()[1].name.is_none());
    }
}
