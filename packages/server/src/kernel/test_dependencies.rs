// TestDependencies - recording implementations for testing
//
// Provides in-memory storage and cache plus recording fakes for the
// external reviewer and the notifier, ready to be turned into a ServerKernel.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    BaseModerationApi, BaseNotifier, MemoryCache, MemoryStorage, Notification, ReviewRequest,
    ServerDeps, ServerKernel,
};
use crate::common::PublicationId;
use crate::config::Config;

// =============================================================================
// Recording Moderation API
// =============================================================================

/// Remembers every review request instead of sending it anywhere.
#[derive(Default)]
pub struct RecordingModerationApi {
    requests: Arc<Mutex<Vec<ReviewRequest>>>,
    unavailable: AtomicBool,
}

impl RecordingModerationApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all review requests that were submitted
    pub fn requests(&self) -> Vec<ReviewRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, pub_id: &PublicationId) -> Vec<ReviewRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.pub_id == pub_id)
            .cloned()
            .collect()
    }

    /// Make every following submission fail.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl BaseModerationApi for RecordingModerationApi {
    async fn submit(&self, request: ReviewRequest) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("moderation service unavailable");
        }
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

// =============================================================================
// Recording Notifier
// =============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all notifications that were sent
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Check if a notification was sent with the given subject
    pub fn was_sent_with_subject(&self, subject: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.subject == subject)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl BaseNotifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("mail relay refused the message");
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub storage: MemoryStorage,
    pub cache: Arc<MemoryCache>,
    pub moderation_api: Arc<RecordingModerationApi>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: Config,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            storage: MemoryStorage::new(),
            cache: Arc::new(MemoryCache::new()),
            moderation_api: Arc::new(RecordingModerationApi::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            config: Config::default(),
        }
    }

    /// Use a custom configuration
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// The dependency container handlers receive; shares every fake with `self`.
    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            Arc::new(self.storage.clone()),
            self.cache.clone(),
            self.moderation_api.clone(),
            self.notifier.clone(),
            self.config.clone(),
        )
    }

    /// Build a ServerKernel for testing; the fakes stay inspectable through `self`.
    pub fn kernel(&self) -> Arc<ServerKernel> {
        Arc::new(ServerKernel::new(self.server_deps()))
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
