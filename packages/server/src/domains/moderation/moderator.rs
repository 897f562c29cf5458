//! Moderator service: builds content blocks and moderation records, applies
//! verdicts, and drives publications through the moderation transitions.
//!
//! The service is stateless apart from its settings. Every operation writes
//! the events it produces into the caller's [`EventSink`]; the handler owning
//! the unit of work decides when they reach the bus.
//!
//! ```text
//! StartModeration
//!   build_content_blocks ──► ModerateContent × n
//!   make_mcr             ──► RegisterModerationRecord, LockContent
//!   set_on_moderation    ──► ModerationStarted | CommentModerationStarted
//!
//! SetModerationResult
//!   set_moderation_result ─┬─► ModerationProgressed            (blocks left)
//!                          └─► ModerationDoneSuccess | ModerationFailed,
//!                              DropModerationRecord            (finished)
//! ```

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use relay::EventSink;
use tracing::{debug, info};

use super::commands::{DropModerationRecord, ModerateContent, RegisterModerationRecord};
use super::errors::ModerationError;
use super::events::{ModerationDoneSuccess, ModerationFailed, ModerationProgressed};
use super::models::{
    generate_mcode, ContentBlock, McodeSize, ModerationCode, ModerationControlRecord, Verdict,
};
use crate::common::{ContentId, PublicationId};
use crate::config::Config;
use crate::domains::blog::commands::LockContent;
use crate::domains::blog::errors::PublicationError;
use crate::domains::blog::models::{ContentRecord, ContentType, Publication, PublicationKind};
use crate::messages::SystemMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeratorService {
    code_length: usize,
    expiry_seconds: u64,
}

impl ModeratorService {
    pub fn new(code_length: usize, expiry_seconds: u64) -> Self {
        Self {
            code_length,
            expiry_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.moderation_code_length, config.record_ttl.as_secs())
    }

    pub fn code_length(&self) -> usize {
        self.code_length
    }

    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }

    /// Mint one block per reviewable entry of `blocks` and request a review
    /// for each of them.
    ///
    /// Only text is reviewable; other content types are skipped. Payloads
    /// come from `contents`, which must all belong to `pub_id`.
    pub fn build_content_blocks(
        &self,
        pub_id: &PublicationId,
        blocks: &IndexMap<ContentId, ContentType>,
        contents: &[ContentRecord],
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<Vec<ContentBlock>, ModerationError> {
        let mut built = Vec::with_capacity(blocks.len());

        for (content_id, content_type) in blocks {
            if !content_type.is_reviewable() {
                debug!(%pub_id, %content_id, %content_type, "content type not reviewable, skipped");
                continue;
            }

            let payload = match contents.iter().find(|c| &c.content_id == content_id) {
                Some(record) if &record.publication_id != pub_id => {
                    return Err(ModerationError::ForeignContent {
                        content_id: content_id.to_string(),
                        pub_id: pub_id.to_string(),
                    });
                }
                Some(record) => record.body.clone(),
                None => {
                    return Err(ModerationError::MissingContent {
                        content_id: content_id.to_string(),
                        pub_id: pub_id.to_string(),
                    });
                }
            };

            let block = ContentBlock::new(
                content_id.clone(),
                pub_id.clone(),
                payload,
                generate_mcode(McodeSize::fitting(self.code_length).len()),
            );
            sink.push(ModerateContent {
                content_id: block.uid.clone(),
                moderation_code: block.moderation_code.clone(),
                pub_id: pub_id.clone(),
            });
            built.push(block);
        }

        Ok(built)
    }

    /// Build the control record for `blocks`, register it and lock the
    /// blocks' content.
    pub fn make_mcr(
        &self,
        pub_id: &PublicationId,
        kind: PublicationKind,
        blocks: &[ContentBlock],
        now: DateTime<Utc>,
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<ModerationControlRecord, ModerationError> {
        if blocks.is_empty() {
            return Err(ModerationError::NoReviewableBlocks {
                pub_id: pub_id.to_string(),
            });
        }

        let mut record =
            ModerationControlRecord::new(pub_id.clone(), kind, now, self.expiry_seconds);
        for block in blocks {
            record.register(block);
        }

        sink.push(RegisterModerationRecord {
            record: record.clone(),
        });
        sink.push(LockContent {
            pub_id: pub_id.clone(),
            content_ids: record.content_ids().cloned().collect(),
        });

        info!(%pub_id, %kind, blocks = record.len(), "moderation record built");
        Ok(record)
    }

    /// Apply one verdict to `record` and emit what follows from it.
    pub fn set_moderation_result(
        &self,
        code: &ModerationCode,
        verdict: Verdict,
        report: &str,
        record: &mut ModerationControlRecord,
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), ModerationError> {
        record.set(code, verdict, report)?;
        info!(
            pub_id = %record.pub_id(),
            %code,
            %verdict,
            resolved = record.resolved(),
            total = record.len(),
            "verdict applied"
        );
        self.collate(record, sink);
        Ok(())
    }

    /// Emit the outcome of `record` as it stands: progress while blocks are
    /// outstanding, the final verdict plus record removal once finished.
    pub fn collate(&self, record: &ModerationControlRecord, sink: &mut EventSink<SystemMessage>) {
        let pub_id = record.pub_id().clone();

        if !record.finished() {
            sink.push(ModerationProgressed {
                pub_id,
                resolved: record.resolved(),
                total: record.len(),
                record: record.clone(),
            });
            return;
        }

        if record.done_success() {
            sink.push(ModerationDoneSuccess {
                pub_id: pub_id.clone(),
                kind: record.kind(),
            });
        } else {
            sink.push(ModerationFailed {
                pub_id: pub_id.clone(),
                kind: record.kind(),
                reasons: record.rejection_reasons(),
            });
        }
        sink.push(DropModerationRecord { pub_id });
    }

    pub fn set_on_moderation<P: Publication + ?Sized>(
        &self,
        publication: &mut P,
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError> {
        publication.moderate(sink)
    }

    pub fn accept_publication<P: Publication + ?Sized>(
        &self,
        publication: &mut P,
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError> {
        publication.accept(sink)
    }

    pub fn reject_publication<P: Publication + ?Sized>(
        &self,
        publication: &mut P,
        reasons: &[String],
        sink: &mut EventSink<SystemMessage>,
    ) -> Result<(), PublicationError> {
        publication.decline(reasons, sink)
    }
}

impl Default for ModeratorService {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
