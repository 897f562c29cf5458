//! The shared lifecycle shape of posts and comments.

use relay::EventSink;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Comment, Post};
use crate::common::{AuthorId, PublicationId};
use crate::domains::blog::errors::PublicationError;
use crate::messages::SystemMessage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicationKind {
    #[default]
    Post,
    Comment,
}

impl fmt::Display for PublicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicationKind::Post => write!(f, "post"),
            PublicationKind::Comment => write!(f, "comment"),
        }
    }
}

/// A lifecycle state that can name itself in errors and logs.
pub trait LifecycleState: Copy + PartialEq + fmt::Debug {
    fn as_str(&self) -> &'static str;
}

/// Check that `current` is one of `allowed` before a transition.
///
/// Nothing is mutated here; callers set the new state only after this
/// returns `Ok`.
pub(crate) fn guard<S: LifecycleState>(
    kind: PublicationKind,
    id: &PublicationId,
    current: S,
    allowed: &[S],
    attempted: &'static str,
) -> Result<(), PublicationError> {
    if allowed.contains(&current) {
        Ok(())
    } else {
        Err(PublicationError::InvalidTransition {
            kind,
            id: id.to_string(),
            from: current.as_str(),
            attempted,
        })
    }
}

/// Transitions every publication supports.
///
/// A publication is the only authority over its own state: callers request
/// transitions and receive the resulting lifecycle events through `sink`.
/// A failed transition leaves both the state and the sink untouched.
pub trait Publication {
    fn id(&self) -> &PublicationId;
    fn author_id(&self) -> &AuthorId;
    fn kind(&self) -> PublicationKind;
    fn state_name(&self) -> &'static str;

    fn moderate(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError>;
    fn accept(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError>;
    fn decline(
        &mut self,
        reasons: &[String],
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError>;
    fn remove(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError>;
}

/// A loaded publication of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicationRecord {
    Post(Post),
    Comment(Comment),
}

impl PublicationRecord {
    fn inner(&self) -> &dyn Publication {
        match self {
            PublicationRecord::Post(post) => post,
            PublicationRecord::Comment(comment) => comment,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Publication {
        match self {
            PublicationRecord::Post(post) => post,
            PublicationRecord::Comment(comment) => comment,
        }
    }
}

impl Publication for PublicationRecord {
    fn id(&self) -> &PublicationId {
        self.inner().id()
    }

    fn author_id(&self) -> &AuthorId {
        self.inner().author_id()
    }

    fn kind(&self) -> PublicationKind {
        self.inner().kind()
    }

    fn state_name(&self) -> &'static str {
        self.inner().state_name()
    }

    fn moderate(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.inner_mut().moderate(sink)
    }

    fn accept(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.inner_mut().accept(sink)
    }

    fn decline(
        &mut self,
        reasons: &[String],
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError> {
        self.inner_mut().decline(reasons, sink)
    }

    fn remove(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.inner_mut().remove(sink)
    }
}

impl From<Post> for PublicationRecord {
    fn from(post: Post) -> Self {
        PublicationRecord::Post(post)
    }
}

impl From<Comment> for PublicationRecord {
    fn from(comment: Comment) -> Self {
        PublicationRecord::Comment(comment)
    }
}
