//! Structured error types for relay.
//!
//! - [`BusError`] is what [`MessageBus::handle`](crate::MessageBus::handle)
//!   returns: either the message was unroutable or a handler failed.
//! - [`HandlerError`] is the only error a handler may return. It always wraps
//!   a root cause, which callers recover with [`HandlerError::downcast_ref`].
//! - [`UowError`] covers misuse of a [`UnitOfWork`](crate::UnitOfWork) and
//!   failures of the underlying storage session.
//!
//! # The Error Boundary Rule
//!
//! > **Callers match on kinds, never on message text.**
//!
//! Domain errors implement [`Categorizable`] so an outer layer can turn any
//! handler failure into a client-safe [`SafeErrorCategory`].
//!
//! ```ignore
//! match bus.handle(msg).await {
//!     Ok(dispatch) => info!(handled = dispatch.len(), "done"),
//!     Err(BusError::NoHandler { kind }) => warn!(%kind, "unroutable"),
//!     Err(BusError::Handler(e)) => {
//!         if let Some(err) = e.downcast_ref::<PublicationError>() {
//!             // 409-class response
//!         }
//!     }
//! }
//! ```

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::uow::UowState;

// =============================================================================
// Safe Categories
// =============================================================================

/// Error category for sanitized, client-facing failures.
///
/// # Security Rules
///
/// - `Validation`: Safe to expose details (bad input)
/// - `NotFound`: Safe to expose (resource not found)
/// - `Conflict`: Safe to expose (state does not allow the request)
/// - `Unavailable`: NEVER expose details (backing service down)
/// - `InternalError`: NEVER expose details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Unavailable,
    InternalError,
}

impl SafeErrorCategory {
    /// Whether the error's own message may be shown to a client.
    pub fn exposes_details(&self) -> bool {
        matches!(
            self,
            SafeErrorCategory::Validation | SafeErrorCategory::NotFound | SafeErrorCategory::Conflict
        )
    }
}

impl fmt::Display for SafeErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafeErrorCategory::Validation => write!(f, "validation_error"),
            SafeErrorCategory::NotFound => write!(f, "not_found"),
            SafeErrorCategory::Conflict => write!(f, "conflict"),
            SafeErrorCategory::Unavailable => write!(f, "unavailable"),
            SafeErrorCategory::InternalError => write!(f, "internal_error"),
        }
    }
}

/// Trait for errors that can be categorized for safe external exposure.
///
/// # Safe Message Contract
///
/// - `Validation`, `NotFound` and `Conflict` MAY return their Display string
/// - `Unavailable` and `InternalError` MUST return generic messages
pub trait Categorizable: std::error::Error {
    fn category(&self) -> SafeErrorCategory;

    fn safe_message(&self) -> Cow<'static, str> {
        if self.category().exposes_details() {
            self.to_string().into()
        } else {
            "The service is temporarily unable to process the request".into()
        }
    }
}

// =============================================================================
// Handler Error
// =============================================================================

/// A handler failure. Always carries the failing handler's name and the
/// root cause.
#[derive(Debug, Error)]
#[error("handler `{handler}` failed: {source}")]
pub struct HandlerError {
    handler: &'static str,
    #[source]
    source: anyhow::Error,
}

impl HandlerError {
    pub fn new(handler: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self {
            handler,
            source: source.into(),
        }
    }

    /// Name of the handler that failed.
    pub fn handler(&self) -> &'static str {
        self.handler
    }

    /// Recover the typed root cause, if it is an `E`.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.source.downcast_ref::<E>()
    }

    pub fn is<E>(&self) -> bool
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.source.is::<E>()
    }

    pub fn cause(&self) -> &anyhow::Error {
        &self.source
    }

    pub fn into_cause(self) -> anyhow::Error {
        self.source
    }
}

// =============================================================================
// Bus Error
// =============================================================================

/// Errors returned by [`MessageBus::handle`](crate::MessageBus::handle).
///
/// Either variant aborts the current cascade. Messages processed before the
/// failure are not undone.
#[derive(Debug, Error)]
pub enum BusError {
    /// No handler is subscribed to the message kind.
    #[error("no handler registered for message kind {kind}")]
    NoHandler { kind: String },

    /// A handler returned an error.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl BusError {
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            BusError::Handler(err) => Some(err),
            BusError::NoHandler { .. } => None,
        }
    }
}

// =============================================================================
// Unit of Work Error
// =============================================================================

#[derive(Debug, Error)]
pub enum UowError {
    /// `enter()` was called while a previous scope has not finished.
    #[error("unit of work cannot be entered from state {state}")]
    AlreadyActive { state: UowState },

    /// The session was requested outside a transaction.
    #[error("unit of work has no transaction in progress")]
    NotActive,

    /// The storage session failed to open, commit, roll back or close.
    #[error("storage session failed: {0}")]
    Session(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("publication p1 cannot be accepted")]
    struct Illegal;

    impl Categorizable for Illegal {
        fn category(&self) -> SafeErrorCategory {
            SafeErrorCategory::Conflict
        }
    }

    #[derive(Debug, Error)]
    #[error("connection refused to 10.0.0.3")]
    struct Down;

    impl Categorizable for Down {
        fn category(&self) -> SafeErrorCategory {
            SafeErrorCategory::Unavailable
        }
    }

    #[test]
    fn test_handler_error_keeps_root_cause() {
        let err = HandlerError::new("accept_post", Illegal);

        assert_eq!(err.handler(), "accept_post");
        assert!(err.is::<Illegal>());
        assert!(err.downcast_ref::<Illegal>().is_some());
        assert!(err.downcast_ref::<Down>().is_none());
        assert!(err.to_string().contains("accept_post"));
        assert!(err.to_string().contains("cannot be accepted"));
    }

    #[test]
    fn test_bus_error_transparent() {
        let err: BusError = HandlerError::new("h", Illegal).into();
        assert!(err.handler_error().is_some());
        assert!(err.to_string().contains("cannot be accepted"));

        let err = BusError::NoHandler {
            kind: "Unknown".to_string(),
        };
        assert!(err.handler_error().is_none());
        assert!(err.to_string().contains("Unknown"));
    }

    #[test]
    fn test_safe_message_hides_internal_details() {
        assert_eq!(Illegal.safe_message(), "publication p1 cannot be accepted");
        assert!(!Down.safe_message().contains("10.0.0.3"));
        assert_eq!(Down.category().to_string(), "unavailable");
    }

    #[test]
    fn test_uow_error_display() {
        let err = UowError::AlreadyActive {
            state: UowState::Transaction,
        };
        assert!(err.to_string().contains("transaction"));
    }
}
