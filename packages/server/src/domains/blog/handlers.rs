//! Blog command handlers.
//!
//! Each handler opens a unit of work, drives the publication state machine
//! through a plain action function, and lets [`settle`] commit or roll back.
//! Action functions only see the session and the sink, which keeps them free
//! of bus and transaction concerns.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use relay::EventSink;
use tracing::{debug, info};

use super::commands::{
    AddContentBlock, CreateComment, CreatePost, LockContent, PublishPost, RemoveComment,
    RemovePost, RollbackPostToDraft, SaveDraft, UnlockContent, UpdateContentBlock,
};
use super::events::{CommentCreated, PostCreated};
use super::models::{Comment, ContentRecord, ContentType, Post, Publication};
use crate::common::{PublicationId, RepositoryError};
use crate::kernel::{settle, BlogSession, MessageHandler, ServerDeps};
use crate::messages::SystemMessage;

type Sink = EventSink<SystemMessage>;

/// Handles every blog command. One instance is subscribed per command kind.
#[derive(Clone)]
pub struct BlogHandlers {
    deps: ServerDeps,
}

impl BlogHandlers {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }
}

macro_rules! blog_handler {
    ($command:ident, $name:literal, $action:ident) => {
        #[async_trait]
        impl MessageHandler<$command> for BlogHandlers {
            fn name(&self) -> &'static str {
                $name
            }

            async fn handle(&self, command: $command) -> Result<Vec<SystemMessage>> {
                let mut uow = self.deps.unit_of_work();
                uow.enter().await?;
                let mut sink = EventSink::new();
                let result = $action(uow.session()?, command, &mut sink).await;
                settle(uow, sink, result).await
            }
        }
    };
}

blog_handler!(CreatePost, "create_post", create_post);
blog_handler!(AddContentBlock, "add_content_block", add_content_block);
blog_handler!(UpdateContentBlock, "update_content_block", update_content_block);
blog_handler!(SaveDraft, "save_draft", save_draft);
blog_handler!(PublishPost, "publish_post", publish_post);
blog_handler!(RollbackPostToDraft, "rollback_post_to_draft", rollback_post_to_draft);
blog_handler!(RemovePost, "remove_post", remove_post);
blog_handler!(CreateComment, "create_comment", create_comment);
blog_handler!(RemoveComment, "remove_comment", remove_comment);
blog_handler!(LockContent, "lock_content", lock_content);
blog_handler!(UnlockContent, "unlock_content", unlock_content);

// ============================================================================
// Actions
// ============================================================================

async fn load_post(session: &mut BlogSession, pub_id: &PublicationId) -> Result<Post> {
    session
        .load_post(pub_id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("post", pub_id).into())
}

async fn load_comment(session: &mut BlogSession, pub_id: &PublicationId) -> Result<Comment> {
    session
        .load_comment(pub_id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("comment", pub_id).into())
}

async fn create_post(session: &mut BlogSession, cmd: CreatePost, sink: &mut Sink) -> Result<()> {
    if session.load_post(&cmd.pub_id).await?.is_some() {
        return Err(RepositoryError::AlreadyExists {
            entity: "post",
            id: cmd.pub_id.to_string(),
        }
        .into());
    }

    let post = Post::new(cmd.pub_id.clone(), cmd.author_id.clone(), cmd.title.clone());
    session.save_post(&post).await?;
    sink.push(PostCreated {
        pub_id: cmd.pub_id,
        author_id: cmd.author_id,
        title: cmd.title,
    });
    Ok(())
}

async fn add_content_block(
    session: &mut BlogSession,
    cmd: AddContentBlock,
    _sink: &mut Sink,
) -> Result<()> {
    let has_post = session.load_post(&cmd.pub_id).await?.is_some();
    if !has_post && session.load_comment(&cmd.pub_id).await?.is_none() {
        return Err(RepositoryError::not_found("publication", &cmd.pub_id).into());
    }
    if session.load_content(&cmd.content_id).await?.is_some() {
        return Err(RepositoryError::AlreadyExists {
            entity: "content",
            id: cmd.content_id.to_string(),
        }
        .into());
    }
    // adding a block to content under review would slip it past moderation
    if session
        .content_for(&cmd.pub_id)
        .await?
        .iter()
        .any(|c| c.locked)
    {
        return Err(RepositoryError::ContentLocked {
            content_id: cmd.content_id.to_string(),
        }
        .into());
    }

    let record = ContentRecord::new(cmd.content_id, cmd.pub_id, cmd.kind, cmd.body);
    debug!(content_id = %record.content_id, kind = %record.kind, "content block added");
    session.save_content(&record).await
}

async fn update_content_block(
    session: &mut BlogSession,
    cmd: UpdateContentBlock,
    _sink: &mut Sink,
) -> Result<()> {
    let mut record = session
        .load_content(&cmd.content_id)
        .await?
        .ok_or_else(|| RepositoryError::not_found("content", &cmd.content_id))?;

    record.update_body(cmd.body)?;
    session.save_content(&record).await
}

async fn save_draft(session: &mut BlogSession, cmd: SaveDraft, sink: &mut Sink) -> Result<()> {
    let mut post = load_post(session, &cmd.pub_id).await?;
    post.save_draft(sink)?;
    session.save_post(&post).await
}

async fn publish_post(session: &mut BlogSession, cmd: PublishPost, sink: &mut Sink) -> Result<()> {
    let mut post = load_post(session, &cmd.pub_id).await?;
    let activate_at = cmd.activate_at.or(post.activate_at());
    post.activate(Utc::now(), activate_at, sink)?;
    session.save_post(&post).await
}

async fn rollback_post_to_draft(
    session: &mut BlogSession,
    cmd: RollbackPostToDraft,
    sink: &mut Sink,
) -> Result<()> {
    let mut post = load_post(session, &cmd.pub_id).await?;
    post.rollback_to_draft(sink)?;
    session.save_post(&post).await?;
    sink.push(UnlockContent { pub_id: cmd.pub_id });
    Ok(())
}

async fn remove_post(session: &mut BlogSession, cmd: RemovePost, sink: &mut Sink) -> Result<()> {
    let mut post = load_post(session, &cmd.pub_id).await?;
    post.remove(sink)?;
    session.save_post(&post).await
}

async fn create_comment(
    session: &mut BlogSession,
    cmd: CreateComment,
    sink: &mut Sink,
) -> Result<()> {
    load_post(session, &cmd.post_id).await?;
    if session.load_comment(&cmd.pub_id).await?.is_some() {
        return Err(RepositoryError::AlreadyExists {
            entity: "comment",
            id: cmd.pub_id.to_string(),
        }
        .into());
    }

    let comment = Comment::new(cmd.pub_id.clone(), cmd.post_id.clone(), cmd.author_id.clone());
    session.save_comment(&comment).await?;
    session
        .save_content(&ContentRecord::new(
            cmd.content_id,
            cmd.pub_id.clone(),
            ContentType::Text,
            cmd.body,
        ))
        .await?;

    sink.push(CommentCreated {
        pub_id: cmd.pub_id,
        post_id: cmd.post_id,
        author_id: comment.author_id().clone(),
    });
    Ok(())
}

async fn remove_comment(
    session: &mut BlogSession,
    cmd: RemoveComment,
    sink: &mut Sink,
) -> Result<()> {
    let mut comment = load_comment(session, &cmd.pub_id).await?;
    comment.remove(sink)?;
    session.save_comment(&comment).await
}

async fn lock_content(session: &mut BlogSession, cmd: LockContent, _sink: &mut Sink) -> Result<()> {
    let changed = session
        .set_content_lock(&cmd.pub_id, Some(&cmd.content_ids), true)
        .await?;
    info!(pub_id = %cmd.pub_id, changed, "content locked for moderation");
    Ok(())
}

async fn unlock_content(
    session: &mut BlogSession,
    cmd: UnlockContent,
    _sink: &mut Sink,
) -> Result<()> {
    let changed = session.set_content_lock(&cmd.pub_id, None, false).await?;
    info!(pub_id = %cmd.pub_id, changed, "content unlocked");
    Ok(())
}
