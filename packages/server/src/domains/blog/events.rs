//! Blog domain events: immutable facts about publication lifecycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{AuthorId, PublicationId};

// =========================================================================
// Post lifecycle
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostCreated {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
    pub title: String,
}

/// All content was saved and the post left `init`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDrafted {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationStarted {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
    pub pub_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAccepted {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRejected {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPublished {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
}

/// The post is published but becomes visible only at `activate_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateLater {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
    pub activate_at: DateTime<Utc>,
    pub delay_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRolledToDraft {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDeleted {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
}

// =========================================================================
// Comment lifecycle
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentCreated {
    pub pub_id: PublicationId,
    pub post_id: PublicationId,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentModerationStarted {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentPublished {
    pub pub_id: PublicationId,
    pub post_id: PublicationId,
    pub author_id: AuthorId,
}

/// The comment went back to draft so the author can correct it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRejected {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentDeleted {
    pub pub_id: PublicationId,
    pub post_id: PublicationId,
    pub author_id: AuthorId,
}
