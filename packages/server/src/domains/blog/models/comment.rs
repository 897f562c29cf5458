//! Comment lifecycle.
//!
//! Comments are corrected in place: a declined comment goes back to draft
//! instead of a terminal rejected state.
//!
//! ```text
//! draft ──moderate──► moderation ──accept──► published
//!   ▲                     │
//!   └──────decline────────┘
//!
//! remove: draft | published ──► deleted
//! ```

use chrono::{DateTime, Utc};
use relay::EventSink;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::publication::{guard, LifecycleState, Publication, PublicationKind};
use crate::common::{AuthorId, PublicationId};
use crate::domains::blog::errors::PublicationError;
use crate::domains::blog::events::{
    CommentDeleted, CommentModerationStarted, CommentPublished, CommentRejected,
};
use crate::messages::SystemMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentState {
    Draft,
    Moderation,
    Published,
    Deleted,
}

impl LifecycleState for CommentState {
    fn as_str(&self) -> &'static str {
        match self {
            CommentState::Draft => "draft",
            CommentState::Moderation => "moderation",
            CommentState::Published => "published",
            CommentState::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    id: PublicationId,
    post_id: PublicationId,
    author_id: AuthorId,
    state: CommentState,
    created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(id: PublicationId, post_id: PublicationId, author_id: AuthorId) -> Self {
        Self {
            id,
            post_id,
            author_id,
            state: CommentState::Draft,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> CommentState {
        self.state
    }

    pub fn post_id(&self) -> &PublicationId {
        &self.post_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn check(
        &self,
        allowed: &[CommentState],
        attempted: &'static str,
    ) -> Result<(), PublicationError> {
        guard(PublicationKind::Comment, &self.id, self.state, allowed, attempted)
    }

    fn enter(&mut self, to: CommentState) {
        info!(pub_id = %self.id, from = self.state.as_str(), to = to.as_str(), "comment transition");
        self.state = to;
    }
}

impl Publication for Comment {
    fn id(&self) -> &PublicationId {
        &self.id
    }

    fn author_id(&self) -> &AuthorId {
        &self.author_id
    }

    fn kind(&self) -> PublicationKind {
        PublicationKind::Comment
    }

    fn state_name(&self) -> &'static str {
        self.state.as_str()
    }

    fn moderate(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.check(&[CommentState::Draft], "moderate")?;
        self.enter(CommentState::Moderation);
        sink.push(CommentModerationStarted {
            pub_id: self.id.clone(),
            author_id: self.author_id.clone(),
        });
        Ok(())
    }

    fn accept(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.check(&[CommentState::Moderation], "accept")?;
        self.enter(CommentState::Published);
        sink.push(CommentPublished {
            pub_id: self.id.clone(),
            post_id: self.post_id.clone(),
            author_id: self.author_id.clone(),
        });
        Ok(())
    }

    fn decline(
        &mut self,
        reasons: &[String],
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError> {
        self.check(&[CommentState::Moderation], "decline")?;
        self.enter(CommentState::Draft);
        sink.push(CommentRejected {
            pub_id: self.id.clone(),
            author_id: self.author_id.clone(),
            reasons: reasons.to_vec(),
        });
        Ok(())
    }

    fn remove(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.check(&[CommentState::Draft, CommentState::Published], "remove")?;
        self.enter(CommentState::Deleted);
        sink.push(CommentDeleted {
            pub_id: self.id.clone(),
            post_id: self.post_id.clone(),
            author_id: self.author_id.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::SystemKind;
    use relay::Message;

    fn comment() -> Comment {
        Comment::new("c1".into(), "p1".into(), "a2".into())
    }

    #[test]
    fn test_decline_returns_to_draft() {
        let mut sink = EventSink::new();
        let mut comment = comment();

        comment.moderate(&mut sink).unwrap();
        comment.decline(&["spam".to_string()], &mut sink).unwrap();

        assert_eq!(comment.state(), CommentState::Draft);
        let kinds: Vec<_> = sink.iter().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            vec![SystemKind::CommentModerationStarted, SystemKind::CommentRejected]
        );

        // corrected and resubmitted
        comment.moderate(&mut sink).unwrap();
        comment.accept(&mut sink).unwrap();
        assert_eq!(comment.state(), CommentState::Published);
    }

    #[test]
    fn test_remove_from_draft_and_published_only() {
        let mut sink = EventSink::new();
        let mut comment = comment();
        comment.moderate(&mut sink).unwrap();
        sink.clear();

        let err = comment.remove(&mut sink).unwrap_err();
        assert!(err.to_string().contains("moderation"));
        assert_eq!(comment.state(), CommentState::Moderation);
        assert!(sink.is_empty());

        comment.accept(&mut sink).unwrap();
        comment.remove(&mut sink).unwrap();
        assert_eq!(comment.state(), CommentState::Deleted);
        assert!(comment.remove(&mut sink).is_err());
    }

    #[test]
    fn test_record_delegates_to_comment() {
        use crate::domains::blog::models::PublicationRecord;

        let mut record = PublicationRecord::from(comment());
        let mut sink = EventSink::new();

        record.moderate(&mut sink).unwrap();

        assert_eq!(record.kind(), PublicationKind::Comment);
        assert_eq!(record.state_name(), "moderation");
        assert_eq!(record.id().as_str(), "c1");
    }
}
