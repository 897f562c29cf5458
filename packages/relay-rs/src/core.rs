//! Core traits for relay messages.
//!
//! # Overview
//!
//! Relay routes **messages**. A message is either:
//! - a *command* (intent, imperative name: `StartModeration`), or
//! - an *event* (fact, past-tense name: `PostAccepted`).
//!
//! The distinction is a naming convention surfaced through [`MessageRole`];
//! the bus routes both identically, one handler per [`Message::Kind`].
//!
//! # Correlation
//!
//! Every top-level [`MessageBus::handle`](crate::MessageBus::handle) call is
//! tagged with a fresh [`CorrelationId`] so that the whole cascade it triggers
//! shows up under one tracing span.

use std::fmt;
use std::hash::Hash;

use uuid::Uuid;

/// Whether a message expresses intent or records a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    /// Imperative request ("do this").
    Command,
    /// Past-tense fact ("this happened").
    Event,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::Command => write!(f, "command"),
            MessageRole::Event => write!(f, "event"),
        }
    }
}

/// A routable message.
///
/// Implementors are usually one closed enum covering every command and event
/// of an application, with a companion fieldless `Kind` enum used as the
/// routing key.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone)]
/// enum AppMessage {
///     Greet(Greet),
///     Greeted(Greeted),
/// }
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum AppKind { Greet, Greeted }
///
/// impl Message for AppMessage {
///     type Kind = AppKind;
///
///     fn kind(&self) -> AppKind {
///         match self {
///             AppMessage::Greet(_) => AppKind::Greet,
///             AppMessage::Greeted(_) => AppKind::Greeted,
///         }
///     }
/// }
/// ```
pub trait Message: Clone + Send + Sync + fmt::Debug + 'static {
    /// Routing key. One handler may be registered per kind.
    type Kind: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Routing key of this message.
    fn kind(&self) -> Self::Kind;

    /// Command or event. Defaults to event.
    fn role(&self) -> MessageRole {
        MessageRole::Event
    }
}

/// Correlation ID grouping every message handled in one cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Sentinel value for uncorrelated work.
    pub const NONE: Self = Self(Uuid::nil());

    /// Create a new random correlation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Check if this is the NONE sentinel value.
    pub fn is_none(&self) -> bool {
        self.0.is_nil()
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for CorrelationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_none() {
        assert!(CorrelationId::NONE.is_none());
        assert!(CorrelationId::default().is_none());
        assert!(!CorrelationId::new().is_none());
    }

    #[test]
    fn test_correlation_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let cid = CorrelationId::from(uuid);
        assert_eq!(cid.as_uuid(), uuid);
        assert_eq!(cid.to_string(), uuid.to_string());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(MessageRole::Command.to_string(), "command");
        assert_eq!(MessageRole::Event.to_string(), "event");
    }
}
