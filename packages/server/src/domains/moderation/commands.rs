//! Moderation commands.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use super::models::{ModerationCode, ModerationControlRecord, Verdict};
use crate::common::{AuthorId, ContentId, PublicationId};
use crate::domains::blog::models::{ContentType, PublicationKind};

/// Submit a publication's blocks for review.
///
/// ```ignore
/// let cmd = StartModeration::builder()
///     .pub_id("p1")
///     .author_id("a1")
///     .blocks(IndexMap::from([("h1".into(), ContentType::Text), ("b1".into(), ContentType::Text)]))
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct StartModeration {
    #[builder(setter(into))]
    pub pub_id: PublicationId,
    #[builder(setter(into))]
    pub author_id: AuthorId,
    /// When the author wants the publication to go live.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub act_dt: Option<DateTime<Utc>>,
    pub blocks: IndexMap<ContentId, ContentType>,
    #[builder(default)]
    #[serde(default)]
    pub kind: PublicationKind,
}

/// Verdict callback from the external reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetModerationResult {
    pub mcr_id: PublicationId,
    /// Moderation code of the judged block.
    pub block_id: ModerationCode,
    pub state: Verdict,
    #[serde(default)]
    pub report: String,
}

/// Ask the external reviewer to judge one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerateContent {
    pub content_id: ContentId,
    pub moderation_code: ModerationCode,
    pub pub_id: PublicationId,
}

/// Store a freshly built record in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterModerationRecord {
    pub record: ModerationControlRecord,
}

/// Remove a finished record from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropModerationRecord {
    pub pub_id: PublicationId,
}
