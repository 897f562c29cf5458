//! Blog domain commands: requests coming from the API layer or from other
//! handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::ContentType;
use crate::common::{AuthorId, ContentId, PublicationId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePost {
    pub pub_id: PublicationId,
    pub author_id: AuthorId,
    pub title: String,
}

/// Attach a header/body/media block to a post or comment that is still
/// being written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddContentBlock {
    pub pub_id: PublicationId,
    pub content_id: ContentId,
    pub kind: ContentType,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateContentBlock {
    pub content_id: ContentId,
    pub body: String,
}

/// Move a fully written post from `init` to `draft`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDraft {
    pub pub_id: PublicationId,
}

/// Publish an accepted post now, or at `activate_at` if it is in the future.
/// Without `activate_at` the time requested when moderation started is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishPost {
    pub pub_id: PublicationId,
    #[serde(default)]
    pub activate_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackPostToDraft {
    pub pub_id: PublicationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovePost {
    pub pub_id: PublicationId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateComment {
    pub pub_id: PublicationId,
    pub post_id: PublicationId,
    pub author_id: AuthorId,
    pub content_id: ContentId,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveComment {
    pub pub_id: PublicationId,
}

/// Lock the given blocks against author edits while they are reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockContent {
    pub pub_id: PublicationId,
    pub content_ids: Vec<ContentId>,
}

/// Release every lock held on a publication's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockContent {
    pub pub_id: PublicationId,
}
