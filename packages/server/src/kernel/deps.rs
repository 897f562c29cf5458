//! Server dependencies for handlers (using traits for testability)
//!
//! This module provides the central dependency container used by every
//! command and event handler. All external collaborators use trait
//! abstractions so tests can swap in recording fakes.

use anyhow::Result;
use relay::{EventSink, SessionFactory, UnitOfWork};
use std::sync::Arc;

use crate::config::Config;
use crate::domains::moderation::{ModerationRecordStore, ModeratorService};
use crate::kernel::{BaseModerationApi, BaseModerationCache, BaseNotifier, BlogSession};
use crate::messages::SystemMessage;

/// The unit of work every handler runs its writes in.
pub type BlogUnitOfWork = UnitOfWork<BlogSession, SystemMessage>;

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to handlers (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    /// Opens storage sessions for units of work
    pub storage: Arc<dyn SessionFactory<BlogSession>>,
    /// Key/value cache holding moderation records
    pub cache: Arc<dyn BaseModerationCache>,
    /// External reviewer, fire-and-forget
    pub moderation_api: Arc<dyn BaseModerationApi>,
    pub notifier: Arc<dyn BaseNotifier>,
    pub moderator: ModeratorService,
    pub config: Config,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        storage: Arc<dyn SessionFactory<BlogSession>>,
        cache: Arc<dyn BaseModerationCache>,
        moderation_api: Arc<dyn BaseModerationApi>,
        notifier: Arc<dyn BaseNotifier>,
        config: Config,
    ) -> Self {
        Self {
            storage,
            cache,
            moderation_api,
            notifier,
            moderator: ModeratorService::from_config(&config),
            config,
        }
    }

    /// A fresh unit of work over the shared storage.
    pub fn unit_of_work(&self) -> BlogUnitOfWork {
        UnitOfWork::new(self.storage.clone())
    }

    pub fn record_store(&self) -> ModerationRecordStore {
        ModerationRecordStore::new(self.cache.clone(), self.config.report_ttl)
    }
}

/// Hand `sink` to the unit of work, commit or roll back according to
/// `result`, and return the events that survived.
///
/// A failed `result` wins over any cleanup error; its events are discarded
/// together with the transaction.
pub async fn settle(
    mut uow: BlogUnitOfWork,
    sink: EventSink<SystemMessage>,
    result: Result<()>,
) -> Result<Vec<SystemMessage>> {
    uow.collect(sink);
    uow.finish(result).await?;
    Ok(uow.get_events().collect())
}
