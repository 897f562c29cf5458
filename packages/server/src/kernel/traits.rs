// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "is this moderation round finished") lives in the
// domains and uses these traits.
//
// Naming convention: Base* for trait names (e.g., BaseModerationCache)

use anyhow::Result;
use async_trait::async_trait;
use relay::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::common::{AuthorId, ContentId, PublicationId};
use crate::domains::blog::models::{Comment, ContentRecord, Post, PublicationKind, PublicationRecord};
use crate::domains::moderation::models::ModerationCode;

// =============================================================================
// Storage (Infrastructure - transactional persistence)
// =============================================================================

/// One storage transaction. Writes become visible to other sessions only
/// after `commit`.
#[async_trait]
pub trait StorageSession: Session {
    async fn load_post(&mut self, id: &PublicationId) -> Result<Option<Post>>;
    async fn save_post(&mut self, post: &Post) -> Result<()>;

    async fn load_comment(&mut self, id: &PublicationId) -> Result<Option<Comment>>;
    async fn save_comment(&mut self, comment: &Comment) -> Result<()>;

    async fn load_content(&mut self, id: &ContentId) -> Result<Option<ContentRecord>>;
    async fn save_content(&mut self, record: &ContentRecord) -> Result<()>;

    /// Every content block of a publication.
    async fn content_for(&mut self, pub_id: &PublicationId) -> Result<Vec<ContentRecord>>;

    /// Set or clear the moderation lock on the given blocks (all blocks of
    /// the publication when `content_ids` is `None`). Returns how many
    /// blocks changed.
    async fn set_content_lock(
        &mut self,
        pub_id: &PublicationId,
        content_ids: Option<&[ContentId]>,
        locked: bool,
    ) -> Result<usize>;

    async fn load_publication(
        &mut self,
        kind: PublicationKind,
        id: &PublicationId,
    ) -> Result<Option<PublicationRecord>> {
        Ok(match kind {
            PublicationKind::Post => self.load_post(id).await?.map(PublicationRecord::Post),
            PublicationKind::Comment => self.load_comment(id).await?.map(PublicationRecord::Comment),
        })
    }

    async fn save_publication(&mut self, publication: &PublicationRecord) -> Result<()> {
        match publication {
            PublicationRecord::Post(post) => self.save_post(post).await,
            PublicationRecord::Comment(comment) => self.save_comment(comment).await,
        }
    }
}

/// The session type handlers work with.
pub type BlogSession = Box<dyn StorageSession>;

// =============================================================================
// Cache (Infrastructure - key/value store with hashes and TTLs)
// =============================================================================

/// Outcome of [`BaseModerationCache::hash_set_nx`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWrite {
    Written,
    /// The field already held a value; nothing changed.
    Occupied,
    /// The hash is gone (never created, dropped or expired).
    MissingKey,
}

/// Key/value cache. A missing key is `Ok(None)`, never an error.
#[async_trait]
pub trait BaseModerationCache: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Set `key` only if it does not exist yet. Returns whether it was written.
    async fn set_nx(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<bool>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// Set `field` of an existing hash only if the field does not exist yet.
    /// Atomic per field. Never creates `key`.
    async fn hash_set_nx(&self, key: &str, field: &str, value: &str) -> Result<FieldWrite>;

    async fn hash_get_all(&self, key: &str) -> Result<Option<HashMap<String, String>>>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Returns whether the key existed.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
}

// =============================================================================
// External Moderation API (Infrastructure - fire-and-forget submission)
// =============================================================================

/// What the external reviewer receives for one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub pub_id: PublicationId,
    pub content_id: ContentId,
    pub moderation_code: ModerationCode,
    pub payload: String,
}

/// Submits blocks for review. The verdict comes back later as a separate
/// `SetModerationResult` call; `submit` must not wait for it.
#[async_trait]
pub trait BaseModerationApi: Send + Sync {
    async fn submit(&self, request: ReviewRequest) -> Result<()>;
}

// =============================================================================
// Notifications (Infrastructure - outbound author messages)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub sender: String,
    pub recipient: AuthorId,
    pub pub_id: PublicationId,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<()>;
}
