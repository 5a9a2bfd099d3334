//! Error types for the store seam and the discussion scheduler.
//!
//! Turn-level completion failures are deliberately absent: they are recovered
//! inside the turn executor and only ever surface as message text.

use std::error::Error;
use std::fmt;

/// Failures reported by a [`MessageStore`](crate::store::MessageStore).
///
/// # Examples
///
/// ```
/// use roundtable::error::StoreError;
///
/// let err = StoreError::RoomNotFound("r1".into());
/// assert_eq!(err.to_string(), "Room not found: r1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    RoomNotFound(String),
    MessageNotFound { room_id: String, message_id: String },
    /// Anything else the backing store wants to report.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::RoomNotFound(id) => write!(f, "Room not found: {}", id),
            StoreError::MessageNotFound {
                room_id,
                message_id,
            } => write!(f, "Message {} not found in room {}", message_id, room_id),
            StoreError::Backend(msg) => write!(f, "Store failure: {}", msg),
        }
    }
}

impl Error for StoreError {}

/// Errors returned by
/// [`DiscussionScheduler::send_message`](crate::scheduler::DiscussionScheduler::send_message).
///
/// The first four are configuration failures: the run is declined before any
/// message is written. [`DiscussionError::Store`] is a schedule-level failure that
/// aborted a run; messages written before the failure remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscussionError {
    RoomNotFound(String),
    /// The submitted text was blank after trimming.
    EmptyMessage,
    /// No member of the room resolves to an active agent.
    NoActiveAgents(String),
    /// Another run for the same room has not returned yet; a stopped run
    /// holds the room until its in-flight turn finishes.
    AlreadyRunning(String),
    Store(StoreError),
}

impl fmt::Display for DiscussionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscussionError::RoomNotFound(id) => write!(f, "Room not found: {}", id),
            DiscussionError::EmptyMessage => write!(f, "Message is empty"),
            DiscussionError::NoActiveAgents(id) => {
                write!(f, "No active agents in room {}", id)
            }
            DiscussionError::AlreadyRunning(id) => {
                write!(f, "A discussion is already running in room {}", id)
            }
            DiscussionError::Store(err) => write!(f, "Discussion aborted: {}", err),
        }
    }
}

impl Error for DiscussionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DiscussionError::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for DiscussionError {
    fn from(err: StoreError) -> Self {
        DiscussionError::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_schedule_level() {
        let err: DiscussionError = StoreError::Backend("disk full".into()).into();
        assert_eq!(err.to_string(), "Discussion aborted: Store failure: disk full");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_configuration_errors_have_no_source() {
        assert!(DiscussionError::EmptyMessage.source().is_none());
        assert_eq!(
            DiscussionError::NoActiveAgents("r1".into()).to_string(),
            "No active agents in room r1"
        );
    }
}
