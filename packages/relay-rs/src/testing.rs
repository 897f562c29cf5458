//! Testing utilities for relay buses.
//!
//! # Feature Flag
//!
//! This module is only available with the `testing` feature:
//!
//! ```toml
//! [dev-dependencies]
//! relay = { path = "../relay-rs", features = ["testing"] }
//! ```
//!
//! # Recording what a cascade produced
//!
//! ```ignore
//! use relay::testing::RecordingHandler;
//!
//! let spy = RecordingHandler::new("spy");
//! bus.subscribe(SystemKind::ModerationDoneSuccess, spy.clone());
//!
//! bus.handle(command).await?;
//!
//! assert_eq!(spy.calls(), 1);
//! assert!(matches!(spy.last(), Some(SystemMessage::ModerationDoneSuccess(_))));
//! ```
//!
//! # Watching a real handler
//!
//! [`RecordingHandler::wrapping`] records what reaches an existing handler
//! and then lets it run:
//!
//! ```ignore
//! if let Some(inner) = bus.unsubscribe(SystemKind::ModerationFailed) {
//!     let tap = RecordingHandler::wrapping(inner);
//!     bus.subscribe(SystemKind::ModerationFailed, tap.clone());
//! }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::Message;
use crate::error::HandlerError;
use crate::handler::Handler;

/// Spy handler: records every message it receives and replies with a fixed
/// list of follow-ups, or with whatever the wrapped handler returns.
pub struct RecordingHandler<M: Message> {
    name: &'static str,
    received: Mutex<Vec<M>>,
    follow_ups: Vec<M>,
    inner: Option<Arc<dyn Handler<M>>>,
}

impl<M: Message> RecordingHandler<M> {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            received: Mutex::new(Vec::new()),
            follow_ups: Vec::new(),
            inner: None,
        })
    }

    /// Spy that answers every message with `follow_ups`.
    pub fn emitting(name: &'static str, follow_ups: Vec<M>) -> Arc<Self> {
        Arc::new(Self {
            name,
            received: Mutex::new(Vec::new()),
            follow_ups,
            inner: None,
        })
    }

    /// Spy in front of `inner`, keeping its name, replies and errors.
    pub fn wrapping(inner: Arc<dyn Handler<M>>) -> Arc<Self> {
        Arc::new(Self {
            name: inner.name(),
            received: Mutex::new(Vec::new()),
            follow_ups: Vec::new(),
            inner: Some(inner),
        })
    }

    pub fn received(&self) -> Vec<M> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.received().len()
    }

    pub fn last(&self) -> Option<M> {
        self.received().pop()
    }
}

#[async_trait]
impl<M: Message> Handler<M> for RecordingHandler<M> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, message: M) -> Result<Vec<M>, HandlerError> {
        self.received
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.clone());
        match &self.inner {
            Some(inner) => inner.handle(message).await,
            None => Ok(self.follow_ups.clone()),
        }
    }
}
