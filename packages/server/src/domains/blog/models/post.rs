//! Post lifecycle.
//!
//! ```text
//! init ──save_draft──► draft ──moderate──► moderation ──accept──► accepted ──activate──► published
//!                        ▲                     │                     │
//!                        │                  decline                  │
//!                        │                     ▼                     │
//!                        └──rollback_to_draft── rejected ◄───────────┘ (rollback_to_draft)
//!
//! remove: any state except moderation and deleted ──► deleted
//! ```

use chrono::{DateTime, Utc};
use relay::EventSink;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::publication::{guard, LifecycleState, Publication, PublicationKind};
use crate::common::{AuthorId, PublicationId};
use crate::domains::blog::errors::PublicationError;
use crate::domains::blog::events::{
    ActivateLater, ModerationStarted, PostAccepted, PostDeleted, PostDrafted, PostPublished,
    PostRejected, PostRolledToDraft,
};
use crate::messages::SystemMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostState {
    Init,
    Draft,
    Moderation,
    Accepted,
    Rejected,
    Published,
    Deleted,
}

impl LifecycleState for PostState {
    fn as_str(&self) -> &'static str {
        match self {
            PostState::Init => "init",
            PostState::Draft => "draft",
            PostState::Moderation => "moderation",
            PostState::Accepted => "accepted",
            PostState::Rejected => "rejected",
            PostState::Published => "published",
            PostState::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    id: PublicationId,
    author_id: AuthorId,
    title: String,
    state: PostState,
    activate_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Post {
    /// A new post starts in `init` until its content is saved.
    pub fn new(id: PublicationId, author_id: AuthorId, title: impl Into<String>) -> Self {
        Self {
            id,
            author_id,
            title: title.into(),
            state: PostState::Init,
            activate_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> PostState {
        self.state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Activation time requested when the post was submitted, if any.
    pub fn activate_at(&self) -> Option<DateTime<Utc>> {
        self.activate_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Remember when the author wants the post to go live.
    pub fn schedule(&mut self, activate_at: Option<DateTime<Utc>>) {
        self.activate_at = activate_at;
    }

    fn check(&self, allowed: &[PostState], attempted: &'static str) -> Result<(), PublicationError> {
        guard(PublicationKind::Post, &self.id, self.state, allowed, attempted)
    }

    fn enter(&mut self, to: PostState) {
        info!(pub_id = %self.id, from = self.state.as_str(), to = to.as_str(), "post transition");
        self.state = to;
    }

    pub fn save_draft(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.check(&[PostState::Init], "save draft")?;
        self.enter(PostState::Draft);
        sink.push(PostDrafted {
            pub_id: self.id.clone(),
            author_id: self.author_id.clone(),
        });
        Ok(())
    }

    /// Publish an accepted post. A future `at` makes it visible later and
    /// emits `ActivateLater` instead of `PostPublished`.
    pub fn activate(
        &mut self,
        now: DateTime<Utc>,
        at: Option<DateTime<Utc>>,
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError> {
        self.check(&[PostState::Accepted], "activate")?;
        self.enter(PostState::Published);

        match at.filter(|at| *at > now) {
            Some(at) => {
                self.activate_at = Some(at);
                sink.push(ActivateLater {
                    pub_id: self.id.clone(),
                    author_id: self.author_id.clone(),
                    activate_at: at,
                    delay_seconds: (at - now).num_seconds(),
                });
            }
            None => sink.push(PostPublished {
                pub_id: self.id.clone(),
                author_id: self.author_id.clone(),
            }),
        }
        Ok(())
    }

    pub fn rollback_to_draft(
        &mut self,
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError> {
        self.check(&[PostState::Accepted, PostState::Rejected], "roll back to draft")?;
        self.enter(PostState::Draft);
        sink.push(PostRolledToDraft {
            pub_id: self.id.clone(),
            author_id: self.author_id.clone(),
        });
        Ok(())
    }
}

impl Publication for Post {
    fn id(&self) -> &PublicationId {
        &self.id
    }

    fn author_id(&self) -> &AuthorId {
        &self.author_id
    }

    fn kind(&self) -> PublicationKind {
        PublicationKind::Post
    }

    fn state_name(&self) -> &'static str {
        self.state.as_str()
    }

    fn moderate(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.check(&[PostState::Draft], "moderate")?;
        self.enter(PostState::Moderation);
        sink.push(ModerationStarted {
            pub_id: self.id.clone(),
            author_id: self.author_id.clone(),
            pub_title: self.title.clone(),
        });
        Ok(())
    }

    fn accept(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.check(&[PostState::Moderation], "accept")?;
        self.enter(PostState::Accepted);
        sink.push(PostAccepted {
            pub_id: self.id.clone(),
            author_id: self.author_id.clone(),
        });
        Ok(())
    }

    fn decline(
        &mut self,
        reasons: &[String],
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError> {
        self.check(&[PostState::Moderation], "decline")?;
        self.enter(PostState::Rejected);
        sink.push(PostRejected {
            pub_id: self.id.clone(),
            author_id: self.author_id.clone(),
            reasons: reasons.to_vec(),
        });
        Ok(())
    }

    fn remove(&mut self, sink: &mut EventSink<SystemMessage>) -> Result<(), PublicationError> {
        self.check(
            &[
                PostState::Init,
                PostState::Draft,
                PostState::Accepted,
                PostState::Rejected,
                PostState::Published,
            ],
            "remove",
        )?;
        self.enter(PostState::Deleted);
        sink.push(PostDeleted {
            pub_id: self.id.clone(),
            author_id: self.author_id.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::SystemKind;
    use chrono::Duration;
    use relay::Message;

    fn post_in(state: PostState) -> Post {
        let mut post = Post::new("p1".into(), "a1".into(), "Hello");
        post.state = state;
        post
    }

    fn kinds(sink: &EventSink<SystemMessage>) -> Vec<SystemKind> {
        sink.iter().map(|m| m.kind()).collect()
    }

    #[test]
    fn test_happy_path() {
        let mut sink = EventSink::new();
        let mut post = Post::new("p1".into(), "a1".into(), "Hello");

        post.save_draft(&mut sink).unwrap();
        post.moderate(&mut sink).unwrap();
        post.accept(&mut sink).unwrap();
        post.activate(Utc::now(), None, &mut sink).unwrap();

        assert_eq!(post.state(), PostState::Published);
        assert_eq!(
            kinds(&sink),
            vec![
                SystemKind::PostDrafted,
                SystemKind::ModerationStarted,
                SystemKind::PostAccepted,
                SystemKind::PostPublished,
            ]
        );
    }

    #[test]
    fn test_moderation_started_carries_title() {
        let mut sink = EventSink::new();
        let mut post = post_in(PostState::Draft);

        post.moderate(&mut sink).unwrap();

        match sink.last() {
            Some(SystemMessage::ModerationStarted(event)) => {
                assert_eq!(event.pub_id.as_str(), "p1");
                assert_eq!(event.author_id.as_str(), "a1");
                assert_eq!(event.pub_title, "Hello");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_decline_rejects_with_reasons() {
        let mut sink = EventSink::new();
        let mut post = post_in(PostState::Moderation);

        post.decline(&["profanity".to_string()], &mut sink).unwrap();

        assert_eq!(post.state(), PostState::Rejected);
        match sink.last() {
            Some(SystemMessage::PostRejected(event)) => {
                assert_eq!(event.reasons, vec!["profanity".to_string()])
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_future_activation_emits_activate_later() {
        let mut sink = EventSink::new();
        let mut post = post_in(PostState::Accepted);
        let now = Utc::now();
        let at = now + Duration::hours(2);

        post.activate(now, Some(at), &mut sink).unwrap();

        assert_eq!(post.state(), PostState::Published);
        assert_eq!(post.activate_at(), Some(at));
        match sink.last() {
            Some(SystemMessage::ActivateLater(event)) => {
                assert_eq!(event.activate_at, at);
                assert_eq!(event.delay_seconds, 7200);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_past_activation_publishes_now() {
        let mut sink = EventSink::new();
        let mut post = post_in(PostState::Accepted);
        let now = Utc::now();

        post.activate(now, Some(now - Duration::minutes(5)), &mut sink)
            .unwrap();

        assert_eq!(kinds(&sink), vec![SystemKind::PostPublished]);
    }

    #[test]
    fn test_rollback_to_draft_from_accepted_and_rejected() {
        for state in [PostState::Accepted, PostState::Rejected] {
            let mut sink = EventSink::new();
            let mut post = post_in(state);

            post.rollback_to_draft(&mut sink).unwrap();

            assert_eq!(post.state(), PostState::Draft);
            assert_eq!(kinds(&sink), vec![SystemKind::PostRolledToDraft]);
        }
    }

    #[test]
    fn test_remove_allowed_states() {
        for state in [
            PostState::Init,
            PostState::Draft,
            PostState::Accepted,
            PostState::Rejected,
            PostState::Published,
        ] {
            let mut sink = EventSink::new();
            let mut post = post_in(state);
            post.remove(&mut sink).unwrap();
            assert_eq!(post.state(), PostState::Deleted);
            assert_eq!(kinds(&sink), vec![SystemKind::PostDeleted]);
        }
    }

    #[test]
    fn test_invalid_transitions_leave_state_and_sink_untouched() {
        type Attempt = fn(&mut Post, &mut EventSink<SystemMessage>) -> Result<(), PublicationError>;

        let attempts: Vec<(PostState, Attempt)> = vec![
            (PostState::Init, |p, s| p.moderate(s)),
            (PostState::Draft, |p, s| p.accept(s)),
            (PostState::Draft, |p, s| p.decline(&[], s)),
            (PostState::Moderation, |p, s| p.activate(Utc::now(), None, s)),
            (PostState::Moderation, |p, s| p.remove(s)),
            (PostState::Deleted, |p, s| p.remove(s)),
            (PostState::Draft, |p, s| p.rollback_to_draft(s)),
            (PostState::Moderation, |p, s| p.rollback_to_draft(s)),
            (PostState::Published, |p, s| p.rollback_to_draft(s)),
            (PostState::Accepted, |p, s| p.moderate(s)),
            (PostState::Draft, |p, s| p.save_draft(s)),
        ];

        for (state, attempt) in attempts {
            let mut sink = EventSink::new();
            let mut post = post_in(state);
            let before = post.clone();

            let err = attempt(&mut post, &mut sink).unwrap_err();

            assert_eq!(post, before, "state changed after {}", err);
            assert!(sink.is_empty());
            let PublicationError::InvalidTransition { from, .. } = err;
            assert_eq!(from, state.as_str());
        }
    }

    #[test]
    fn test_error_names_current_and_attempted() {
        let mut post = post_in(PostState::Draft);
        let err = post.accept(&mut EventSink::new()).unwrap_err();
        assert_eq!(err.to_string(), "cannot accept post p1: current state is draft");
    }
}
