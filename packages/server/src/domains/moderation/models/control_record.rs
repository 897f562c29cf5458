//! The moderation control record (MCR): aggregation state for one
//! publication's moderation round.
//!
//! Invariants:
//! - `reports.len()` equals the number of blocks whose verdict is set
//! - `finished()` iff every registered block has a verdict
//! - `done_success()` iff finished and every verdict is `accepted`

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::code::ModerationCode;
use super::content_block::ContentBlock;
use super::verdict::Verdict;
use crate::common::{ContentId, PublicationId, SerializationError};
use crate::domains::blog::models::PublicationKind;
use crate::domains::moderation::errors::ModerationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub content_id: ContentId,
    pub verdict: Verdict,
}

/// Free-text note attached to a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub moderation_code: ModerationCode,
    pub verdict: Verdict,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationControlRecord {
    pub_id: PublicationId,
    #[serde(default)]
    kind: PublicationKind,
    activation_time: DateTime<Utc>,
    expiry_seconds: u64,
    blocks: IndexMap<ModerationCode, BlockEntry>,
    reports: Vec<Report>,
}

impl ModerationControlRecord {
    pub fn new(
        pub_id: PublicationId,
        kind: PublicationKind,
        activation_time: DateTime<Utc>,
        expiry_seconds: u64,
    ) -> Self {
        Self {
            pub_id,
            kind,
            activation_time,
            expiry_seconds,
            blocks: IndexMap::new(),
            reports: Vec::new(),
        }
    }

    pub fn pub_id(&self) -> &PublicationId {
        &self.pub_id
    }

    pub fn kind(&self) -> PublicationKind {
        self.kind
    }

    pub fn activation_time(&self) -> DateTime<Utc> {
        self.activation_time
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Track `block` as outstanding. Registering the same code twice is a
    /// no-op.
    pub fn register(&mut self, block: &ContentBlock) {
        self.blocks
            .entry(block.moderation_code.clone())
            .or_insert_with(|| BlockEntry {
                content_id: block.uid.clone(),
                verdict: Verdict::NotSet,
            });
    }

    /// Apply one verdict.
    ///
    /// Fails for codes that were never registered, for `not_set`, and for a
    /// block that already has a verdict.
    pub fn set(
        &mut self,
        code: &ModerationCode,
        verdict: Verdict,
        report: impl Into<String>,
    ) -> Result<(), ModerationError> {
        if !verdict.is_set() {
            return Err(ModerationError::InvalidVerdict {
                code: code.to_string(),
                verdict: verdict.to_string(),
            });
        }

        let entry = self
            .blocks
            .get_mut(code)
            .ok_or_else(|| ModerationError::UnknownBlock {
                pub_id: self.pub_id.to_string(),
                code: code.to_string(),
            })?;

        if entry.verdict.is_set() {
            return Err(ModerationError::VerdictAlreadySet {
                pub_id: self.pub_id.to_string(),
                code: code.to_string(),
            });
        }

        entry.verdict = verdict;
        self.reports.push(Report {
            moderation_code: code.clone(),
            verdict,
            text: report.into(),
        });
        Ok(())
    }

    pub fn verdict(&self, code: &ModerationCode) -> Option<Verdict> {
        self.blocks.get(code).map(|entry| entry.verdict)
    }

    pub fn contains(&self, code: &ModerationCode) -> bool {
        self.blocks.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn resolved(&self) -> usize {
        self.reports.len()
    }

    pub fn finished(&self) -> bool {
        self.reports.len() == self.blocks.len()
    }

    pub fn done_success(&self) -> bool {
        self.finished()
            && self
                .blocks
                .values()
                .all(|entry| entry.verdict == Verdict::Accepted)
    }

    /// Non-empty reports of declined blocks, in arrival order.
    pub fn rejection_reasons(&self) -> Vec<String> {
        self.reports
            .iter()
            .filter(|report| report.verdict == Verdict::Declined && !report.text.is_empty())
            .map(|report| report.text.clone())
            .collect()
    }

    /// Registered codes in registration order.
    pub fn codes(&self) -> impl Iterator<Item = &ModerationCode> {
        self.blocks.keys()
    }

    pub fn content_ids(&self) -> impl Iterator<Item = &ContentId> {
        self.blocks.values().map(|entry| &entry.content_id)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        let seconds = i64::try_from(self.expiry_seconds).unwrap_or(i64::MAX);
        Duration::try_seconds(seconds)
            .and_then(|ttl| self.activation_time.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }

    pub fn to_json(&self) -> Result<String, SerializationError> {
        serde_json::to_string(self).map_err(|source| SerializationError::Encode {
            what: "moderation record",
            source,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, SerializationError> {
        serde_json::from_str(raw).map_err(|source| SerializationError::Decode {
            what: "moderation record",
            source,
        })
    }
}
