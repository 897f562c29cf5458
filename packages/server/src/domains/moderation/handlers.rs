//! Moderation handlers.
//!
//! `StartModeration`, `ModerationDoneSuccess` and `ModerationFailed` change
//! publications and run in a unit of work. The verdict callback and the
//! record bookkeeping only touch the cache and go straight to the
//! [`ModerationRecordStore`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use relay::EventSink;
use tracing::{info, warn};

use super::commands::{
    DropModerationRecord, ModerateContent, RegisterModerationRecord, SetModerationResult,
    StartModeration,
};
use super::errors::ModerationError;
use super::events::{ModerationDoneSuccess, ModerationFailed, ModerationProgressed};
use super::moderator::ModeratorService;
use crate::common::{PublicationId, RepositoryError};
use crate::domains::blog::commands::UnlockContent;
use crate::domains::blog::models::{Publication, PublicationKind, PublicationRecord};
use crate::kernel::{
    settle, BlogSession, FieldWrite, MessageHandler, ReviewRequest, ServerDeps,
};
use crate::messages::SystemMessage;

type Sink = EventSink<SystemMessage>;

#[derive(Clone)]
pub struct ModerationHandlers {
    deps: ServerDeps,
}

impl ModerationHandlers {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }
}

fn kind_label(kind: PublicationKind) -> &'static str {
    match kind {
        PublicationKind::Post => "post",
        PublicationKind::Comment => "comment",
    }
}

async fn load_publication(
    session: &mut BlogSession,
    kind: PublicationKind,
    pub_id: &PublicationId,
) -> Result<PublicationRecord> {
    session
        .load_publication(kind, pub_id)
        .await?
        .ok_or_else(|| RepositoryError::not_found(kind_label(kind), pub_id).into())
}

// ============================================================================
// Starting a round
// ============================================================================

#[async_trait]
impl MessageHandler<StartModeration> for ModerationHandlers {
    fn name(&self) -> &'static str {
        "start_moderation"
    }

    async fn handle(&self, command: StartModeration) -> Result<Vec<SystemMessage>> {
        let mut uow = self.deps.unit_of_work();
        uow.enter().await?;
        let mut sink = EventSink::new();
        let result =
            start_moderation(uow.session()?, &self.deps.moderator, command, &mut sink).await;
        settle(uow, sink, result).await
    }
}

/// Emits, in order: record registration, content lock, the publication's
/// moderation-started event, then one review request per block.
async fn start_moderation(
    session: &mut BlogSession,
    moderator: &ModeratorService,
    cmd: StartModeration,
    sink: &mut Sink,
) -> Result<()> {
    let mut publication = load_publication(session, cmd.kind, &cmd.pub_id).await?;

    let mut contents = Vec::with_capacity(cmd.blocks.len());
    for content_id in cmd.blocks.keys() {
        let record = session
            .load_content(content_id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("content", content_id))?;
        contents.push(record);
    }

    let mut review_requests = EventSink::new();
    let blocks =
        moderator.build_content_blocks(&cmd.pub_id, &cmd.blocks, &contents, &mut review_requests)?;
    moderator.make_mcr(&cmd.pub_id, cmd.kind, &blocks, Utc::now(), sink)?;
    moderator.set_on_moderation(&mut publication, sink)?;

    if let PublicationRecord::Post(post) = &mut publication {
        post.schedule(cmd.act_dt);
    }
    session.save_publication(&publication).await?;

    sink.extend(review_requests);
    Ok(())
}

// ============================================================================
// Verdicts
// ============================================================================

#[async_trait]
impl MessageHandler<SetModerationResult> for ModerationHandlers {
    fn name(&self) -> &'static str {
        "set_moderation_result"
    }

    async fn handle(&self, cmd: SetModerationResult) -> Result<Vec<SystemMessage>> {
        let store = self.deps.record_store();
        let now = Utc::now();

        let Some(mut record) = store.load(&cmd.mcr_id).await? else {
            warn!(pub_id = %cmd.mcr_id, code = %cmd.block_id, "verdict for unknown or expired moderation record ignored");
            return Ok(vec![]);
        };
        if record.is_expired(now) {
            warn!(pub_id = %cmd.mcr_id, code = %cmd.block_id, expired_at = %record.expires_at(), "verdict arrived after the record expired");
            return Ok(vec![]);
        }

        let mut sink = EventSink::new();
        self.deps.moderator.set_moderation_result(
            &cmd.block_id,
            cmd.state,
            &cmd.report,
            &mut record,
            &mut sink,
        )?;

        // another callback may have written the same field since the load
        match store
            .record_verdict(&cmd.mcr_id, &cmd.block_id, cmd.state, &cmd.report)
            .await?
        {
            FieldWrite::Written => {}
            FieldWrite::Occupied => {
                return Err(ModerationError::VerdictAlreadySet {
                    pub_id: cmd.mcr_id.to_string(),
                    code: cmd.block_id.to_string(),
                }
                .into());
            }
            FieldWrite::MissingKey => {
                warn!(pub_id = %cmd.mcr_id, code = %cmd.block_id, "moderation record dropped before the verdict was stored");
                return Ok(vec![]);
            }
        }

        if !record.finished() {
            let Some(fresh) = store.load(&cmd.mcr_id).await? else {
                info!(pub_id = %cmd.mcr_id, "moderation round closed by a concurrent verdict");
                return Ok(vec![]);
            };
            sink.clear();
            self.deps.moderator.collate(&fresh, &mut sink);
            record = fresh;
        }

        if record.finished() && !store.claim_finalization(&record).await? {
            info!(pub_id = %cmd.mcr_id, "outcome already emitted by a concurrent verdict");
            return Ok(vec![]);
        }

        Ok(sink.into_vec())
    }
}

#[async_trait]
impl MessageHandler<ModerationProgressed> for ModerationHandlers {
    fn name(&self) -> &'static str {
        "report_moderation_progress"
    }

    /// Verdicts are already persisted per block; progress is only reported.
    async fn handle(&self, event: ModerationProgressed) -> Result<Vec<SystemMessage>> {
        info!(
            pub_id = %event.pub_id,
            resolved = event.resolved,
            total = event.total,
            "moderation in progress"
        );
        Ok(vec![])
    }
}

// ============================================================================
// Record bookkeeping
// ============================================================================

#[async_trait]
impl MessageHandler<RegisterModerationRecord> for ModerationHandlers {
    fn name(&self) -> &'static str {
        "register_moderation_record"
    }

    async fn handle(&self, cmd: RegisterModerationRecord) -> Result<Vec<SystemMessage>> {
        self.deps.record_store().register(&cmd.record).await?;
        Ok(vec![])
    }
}

#[async_trait]
impl MessageHandler<DropModerationRecord> for ModerationHandlers {
    fn name(&self) -> &'static str {
        "drop_moderation_record"
    }

    async fn handle(&self, cmd: DropModerationRecord) -> Result<Vec<SystemMessage>> {
        if !self.deps.record_store().drop_record(&cmd.pub_id).await? {
            warn!(pub_id = %cmd.pub_id, "moderation record was already gone");
        }
        Ok(vec![])
    }
}

#[async_trait]
impl MessageHandler<ModerateContent> for ModerationHandlers {
    fn name(&self) -> &'static str {
        "moderate_content"
    }

    async fn handle(&self, cmd: ModerateContent) -> Result<Vec<SystemMessage>> {
        let payload = {
            let mut uow = self.deps.unit_of_work();
            uow.enter().await?;
            let loaded = match uow.session() {
                Ok(session) => session.load_content(&cmd.content_id).await,
                Err(err) => Err(err.into()),
            };
            uow.exit().await?;
            loaded?
                .map(|record| record.body)
                .ok_or_else(|| RepositoryError::not_found("content", &cmd.content_id))?
        };

        self.deps
            .moderation_api
            .submit(ReviewRequest {
                pub_id: cmd.pub_id,
                content_id: cmd.content_id,
                moderation_code: cmd.moderation_code,
                payload,
            })
            .await?;
        Ok(vec![])
    }
}

// ============================================================================
// Outcome
// ============================================================================

#[async_trait]
impl MessageHandler<ModerationDoneSuccess> for ModerationHandlers {
    fn name(&self) -> &'static str {
        "accept_publication"
    }

    async fn handle(&self, event: ModerationDoneSuccess) -> Result<Vec<SystemMessage>> {
        let mut uow = self.deps.unit_of_work();
        uow.enter().await?;
        let mut sink = EventSink::new();
        let result = accept(uow.session()?, &self.deps.moderator, event, &mut sink).await;
        settle(uow, sink, result).await
    }
}

#[async_trait]
impl MessageHandler<ModerationFailed> for ModerationHandlers {
    fn name(&self) -> &'static str {
        "reject_publication"
    }

    async fn handle(&self, event: ModerationFailed) -> Result<Vec<SystemMessage>> {
        let mut uow = self.deps.unit_of_work();
        uow.enter().await?;
        let mut sink = EventSink::new();
        let result = reject(uow.session()?, &self.deps.moderator, event, &mut sink).await;
        settle(uow, sink, result).await
    }
}

async fn accept(
    session: &mut BlogSession,
    moderator: &ModeratorService,
    event: ModerationDoneSuccess,
    sink: &mut Sink,
) -> Result<()> {
    let mut publication = load_publication(session, event.kind, &event.pub_id).await?;
    moderator.accept_publication(&mut publication, sink)?;
    session.save_publication(&publication).await
}

async fn reject(
    session: &mut BlogSession,
    moderator: &ModeratorService,
    event: ModerationFailed,
    sink: &mut Sink,
) -> Result<()> {
    let mut publication = load_publication(session, event.kind, &event.pub_id).await?;
    moderator.reject_publication(&mut publication, &event.reasons, sink)?;
    session.save_publication(&publication).await?;

    // a declined comment goes back to draft and must be editable again
    if publication.kind() == PublicationKind::Comment {
        sink.push(UnlockContent {
            pub_id: event.pub_id,
        });
    }
    Ok(())
}
