//! Unit of work: one storage session plus one event outbox.
//!
//! ```text
//!            enter()                commit()
//!   Ready ─────────────► Transaction ─────────► Committed ──┐
//!     ▲                      │                              │
//!     │                      │ rollback() / failed work     │ exit()
//!     │                      ▼                              │
//!     └──────────────── RolledBack ◄────────────────────────┘
//!             exit()
//! ```
//!
//! Rules:
//! - `enter()` is only legal from `Ready`; anything else is a programmer
//!   error and fails fast.
//! - `commit()` / `rollback()` act only while in `Transaction`, otherwise they
//!   are no-ops.
//! - Rolling back discards the outbox together with the transaction, so
//!   events describing work that never landed are never published.
//! - `exit()` always closes the session and returns to `Ready`; a transaction
//!   still open at that point is rolled back.
//!
//! # Example
//!
//! ```ignore
//! let mut uow = deps.unit_of_work();
//! uow.enter().await?;
//! let result = async {
//!     let session = uow.session()?;
//!     let mut post = session.load_post(&pub_id).await?;
//!     post.accept(&mut sink)?;
//!     session.save_post(&post).await?;
//!     uow.collect(sink);
//!     Ok(())
//! }.await;
//! uow.finish(result).await?;
//! let events: Vec<_> = uow.get_events().collect();
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::UowError;
use crate::sink::EventSink;

// =============================================================================
// Session Traits
// =============================================================================

/// A storage session with transaction control.
#[async_trait]
pub trait Session: Send {
    async fn commit(&mut self) -> anyhow::Result<()>;

    async fn rollback(&mut self) -> anyhow::Result<()>;

    /// Release the session. Called exactly once per `enter()`.
    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S: Session + ?Sized> Session for Box<S> {
    async fn commit(&mut self) -> anyhow::Result<()> {
        (**self).commit().await
    }

    async fn rollback(&mut self) -> anyhow::Result<()> {
        (**self).rollback().await
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        (**self).close().await
    }
}

/// Opens storage sessions.
#[async_trait]
pub trait SessionFactory<S>: Send + Sync {
    async fn open(&self) -> anyhow::Result<S>;
}

// =============================================================================
// Unit of Work
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UowState {
    Ready,
    Transaction,
    Committed,
    RolledBack,
}

impl fmt::Display for UowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UowState::Ready => write!(f, "ready"),
            UowState::Transaction => write!(f, "transaction"),
            UowState::Committed => write!(f, "committed"),
            UowState::RolledBack => write!(f, "rolledback"),
        }
    }
}

/// Scoped owner of one storage session and one FIFO event outbox.
pub struct UnitOfWork<S, M> {
    factory: Arc<dyn SessionFactory<S>>,
    session: Option<S>,
    state: UowState,
    outbox: VecDeque<M>,
}

impl<S: Session, M: Send> UnitOfWork<S, M> {
    pub fn new(factory: Arc<dyn SessionFactory<S>>) -> Self {
        Self {
            factory,
            session: None,
            state: UowState::Ready,
            outbox: VecDeque::new(),
        }
    }

    pub fn state(&self) -> UowState {
        self.state
    }

    /// Open a session and start a transaction.
    pub async fn enter(&mut self) -> Result<(), UowError> {
        if self.state != UowState::Ready {
            return Err(UowError::AlreadyActive { state: self.state });
        }

        let session = self.factory.open().await.map_err(UowError::Session)?;
        self.session = Some(session);
        self.state = UowState::Transaction;
        Ok(())
    }

    /// The session bound to the current transaction.
    pub fn session(&mut self) -> Result<&mut S, UowError> {
        match (self.state, self.session.as_mut()) {
            (UowState::Transaction, Some(session)) => Ok(session),
            _ => Err(UowError::NotActive),
        }
    }

    pub async fn commit(&mut self) -> Result<(), UowError> {
        if self.state != UowState::Transaction {
            debug!(state = %self.state, "commit outside transaction ignored");
            return Ok(());
        }

        let session = self.session.as_mut().ok_or(UowError::NotActive)?;
        // state stays Transaction on failure so exit() rolls back
        session.commit().await.map_err(UowError::Session)?;
        self.state = UowState::Committed;
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), UowError> {
        if self.state != UowState::Transaction {
            debug!(state = %self.state, "rollback outside transaction ignored");
            return Ok(());
        }

        let discarded = self.outbox.len();
        self.outbox.clear();
        self.state = UowState::RolledBack;
        if discarded > 0 {
            debug!(discarded, "outbox discarded with rolled back transaction");
        }

        match self.session.as_mut() {
            Some(session) => session.rollback().await.map_err(UowError::Session),
            None => Ok(()),
        }
    }

    /// Leave the scope: roll back anything uncommitted, close the session and
    /// return to `Ready`. Always releases the session, even on error.
    pub async fn exit(&mut self) -> Result<(), UowError> {
        let rolled_back = self.rollback().await;

        let closed = match self.session.take() {
            Some(mut session) => session.close().await.map_err(UowError::Session),
            None => Ok(()),
        };

        self.state = UowState::Ready;
        rolled_back.and(closed)
    }

    /// Commit on `Ok`, roll back on `Err`, then exit.
    ///
    /// The work's own error wins over any cleanup error, which is only
    /// logged in that case.
    pub async fn finish<T, E>(&mut self, result: Result<T, E>) -> Result<T, E>
    where
        E: From<UowError>,
    {
        match result {
            Ok(value) => {
                if let Err(err) = self.commit().await {
                    if let Err(exit_err) = self.exit().await {
                        warn!(error = %exit_err, "exit after failed commit also failed");
                    }
                    return Err(err.into());
                }
                self.exit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(exit_err) = self.exit().await {
                    warn!(error = %exit_err, "exit after failed work also failed");
                }
                Err(err)
            }
        }
    }

    /// Queue an event for the bus.
    pub fn fetch_event(&mut self, event: impl Into<M>) {
        self.outbox.push_back(event.into());
    }

    /// Queue every event of `sink`, preserving order.
    pub fn collect(&mut self, sink: EventSink<M>) {
        self.outbox.extend(sink);
    }

    /// Drain the outbox. Each event is yielded once.
    pub fn get_events(&mut self) -> impl Iterator<Item = M> + '_ {
        self.outbox.drain(..)
    }

    pub fn pending_events(&self) -> usize {
        self.outbox.len()
    }
}

impl<S, M> fmt::Debug for UnitOfWork<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("state", &self.state)
            .field("has_session", &self.session.is_some())
            .field("pending_events", &self.outbox.len())
            .finish()
    }
}
