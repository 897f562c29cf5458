// ServerKernel - core infrastructure with all dependencies
//
// The ServerKernel holds the dependencies and the message bus built from
// them. Every handler is registered once, here, at startup.

use relay::{handler_fn, BusError, Dispatch, Handler, MessageBus};
use std::sync::Arc;
use tracing::{debug, info};

use super::{ServerDeps, TypedHandler};
use crate::domains::blog::commands::{
    AddContentBlock, CreateComment, CreatePost, LockContent, PublishPost, RemoveComment,
    RemovePost, RollbackPostToDraft, SaveDraft, UnlockContent, UpdateContentBlock,
};
use crate::domains::blog::BlogHandlers;
use crate::domains::moderation::commands::{
    DropModerationRecord, ModerateContent, RegisterModerationRecord, SetModerationResult,
    StartModeration,
};
use crate::domains::moderation::events::{
    ModerationDoneSuccess, ModerationFailed, ModerationProgressed,
};
use crate::domains::moderation::ModerationHandlers;
use crate::domains::notifications::{NotificationHandler, NOTIFIED_KINDS};
use crate::messages::{SystemKind, SystemMessage};

/// Creation events nobody acts on yet; they are only traced.
const AUDITED_KINDS: &[SystemKind] = &[
    SystemKind::PostCreated,
    SystemKind::PostDrafted,
    SystemKind::CommentCreated,
];

/// ServerKernel holds all server dependencies
pub struct ServerKernel {
    pub deps: Arc<ServerDeps>,
    pub bus: Arc<MessageBus<SystemMessage>>,
}

impl ServerKernel {
    /// Creates a new ServerKernel and registers every handler
    pub fn new(deps: ServerDeps) -> Self {
        let bus = build_bus(&deps);
        info!(handlers = bus.handler_count(), "message bus ready");
        Self {
            deps: Arc::new(deps),
            bus: Arc::new(bus),
        }
    }

    /// Run `message` and everything it cascades into.
    pub async fn handle(
        &self,
        message: impl Into<SystemMessage>,
    ) -> Result<Dispatch<SystemKind>, BusError> {
        self.bus.handle(message.into()).await
    }
}

/// Build the bus with one handler per message kind.
pub fn build_bus(deps: &ServerDeps) -> MessageBus<SystemMessage> {
    let blog = BlogHandlers::new(deps.clone());
    let moderation = ModerationHandlers::new(deps.clone());

    let mut bus = MessageBus::new()
        // blog commands
        .with_handler(SystemKind::CreatePost, TypedHandler::<CreatePost, _>::shared(blog.clone()))
        .with_handler(
            SystemKind::AddContentBlock,
            TypedHandler::<AddContentBlock, _>::shared(blog.clone()),
        )
        .with_handler(
            SystemKind::UpdateContentBlock,
            TypedHandler::<UpdateContentBlock, _>::shared(blog.clone()),
        )
        .with_handler(SystemKind::SaveDraft, TypedHandler::<SaveDraft, _>::shared(blog.clone()))
        .with_handler(
            SystemKind::PublishPost,
            TypedHandler::<PublishPost, _>::shared(blog.clone()),
        )
        .with_handler(
            SystemKind::RollbackPostToDraft,
            TypedHandler::<RollbackPostToDraft, _>::shared(blog.clone()),
        )
        .with_handler(SystemKind::RemovePost, TypedHandler::<RemovePost, _>::shared(blog.clone()))
        .with_handler(
            SystemKind::CreateComment,
            TypedHandler::<CreateComment, _>::shared(blog.clone()),
        )
        .with_handler(
            SystemKind::RemoveComment,
            TypedHandler::<RemoveComment, _>::shared(blog.clone()),
        )
        .with_handler(
            SystemKind::LockContent,
            TypedHandler::<LockContent, _>::shared(blog.clone()),
        )
        .with_handler(
            SystemKind::UnlockContent,
            TypedHandler::<UnlockContent, _>::shared(blog),
        )
        // moderation commands
        .with_handler(
            SystemKind::StartModeration,
            TypedHandler::<StartModeration, _>::shared(moderation.clone()),
        )
        .with_handler(
            SystemKind::SetModerationResult,
            TypedHandler::<SetModerationResult, _>::shared(moderation.clone()),
        )
        .with_handler(
            SystemKind::ModerateContent,
            TypedHandler::<ModerateContent, _>::shared(moderation.clone()),
        )
        .with_handler(
            SystemKind::RegisterModerationRecord,
            TypedHandler::<RegisterModerationRecord, _>::shared(moderation.clone()),
        )
        .with_handler(
            SystemKind::DropModerationRecord,
            TypedHandler::<DropModerationRecord, _>::shared(moderation.clone()),
        )
        // moderation events
        .with_handler(
            SystemKind::ModerationProgressed,
            TypedHandler::<ModerationProgressed, _>::shared(moderation.clone()),
        )
        .with_handler(
            SystemKind::ModerationDoneSuccess,
            TypedHandler::<ModerationDoneSuccess, _>::shared(moderation.clone()),
        )
        .with_handler(
            SystemKind::ModerationFailed,
            TypedHandler::<ModerationFailed, _>::shared(moderation),
        );

    let notifier: Arc<dyn Handler<SystemMessage>> = Arc::new(NotificationHandler::new(
        deps.notifier.clone(),
        deps.config.notification_sender.clone(),
    ));
    for kind in NOTIFIED_KINDS {
        bus.subscribe(*kind, notifier.clone());
    }

    let audit: Arc<dyn Handler<SystemMessage>> =
        Arc::new(handler_fn("audit", |message: SystemMessage| async move {
            debug!(?message, "recorded");
            Ok(vec![])
        }));
    for kind in AUDITED_KINDS {
        bus.subscribe(*kind, audit.clone());
    }

    bus
}
