//! Moderation events.

use serde::{Deserialize, Serialize};

use super::models::ModerationControlRecord;
use crate::common::PublicationId;
use crate::domains::blog::models::PublicationKind;

/// A verdict arrived but blocks are still outstanding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationProgressed {
    pub pub_id: PublicationId,
    pub resolved: usize,
    pub total: usize,
    pub record: ModerationControlRecord,
}

/// Every block was accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationDoneSuccess {
    pub pub_id: PublicationId,
    #[serde(default)]
    pub kind: PublicationKind,
}

/// At least one block was declined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationFailed {
    pub pub_id: PublicationId,
    #[serde(default)]
    pub kind: PublicationKind,
    pub reasons: Vec<String>,
}
