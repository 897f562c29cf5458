//! # Relay
//!
//! A deterministic message bus where one handler owns each message kind,
//! cascades drain in order, and units of work define authority.
//!
//! ## Core Concepts
//!
//! Relay routes a closed set of **messages**:
//! - commands = intent (`StartModeration`)
//! - events = facts (`PostAccepted`)
//!
//! Both go through the same [`MessageBus`]; the difference is naming only.
//!
//! ## Architecture
//!
//! ```text
//! Edge (API / callback)
//!     │
//!     ▼ handle(msg)
//! MessageBus ── queue: [msg] ──────────────────────┐
//!     │                                            │
//!     ▼ pop front                                  │
//! Handler.handle(msg)                              │
//!     │                                            │
//!     ├─► UnitOfWork.enter()                       │
//!     ├─► domain call (state machine, sink) ──┐    │
//!     ├─► UnitOfWork.collect(sink)  ◄─────────┘    │
//!     ├─► UnitOfWork.finish(result)                │
//!     │                                            │
//!     └─► Ok(uow.get_events()) ── push back ───────┘
//!
//! loop until the queue is empty
//! ```
//!
//! ## Key Invariants
//!
//! 1. **One handler per kind** - re-subscription keeps the first handler
//! 2. **Sequential cascade** - handlers are awaited one at a time, follow-ups
//!    go to the tail of the queue
//! 3. **Explicit sinks** - domain code pushes events into an [`EventSink`]
//!    passed in by the caller and never owns a pending-event queue
//! 4. **Rollback discards events** - a rolled back [`UnitOfWork`] clears its
//!    outbox
//! 5. **No shared queue** - the bus owns only its routing table, every
//!    `handle()` call has its own queue
//!
//! ## Example
//!
//! ```ignore
//! use relay::{Handler, HandlerError, Message, MessageBus};
//!
//! let bus = MessageBus::new()
//!     .with_handler(SystemKind::StartModeration, Arc::new(StartModerationHandler::new(deps.clone())))
//!     .with_handler(SystemKind::ModerationStarted, notifications.clone());
//!
//! let dispatch = bus.handle(SystemMessage::from(start_moderation)).await?;
//! ```

mod bus;
mod core;
mod error;
mod handler;
mod sink;
mod uow;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::bus::{Dispatch, MessageBus};
pub use crate::core::{CorrelationId, Message, MessageRole};
pub use crate::error::{BusError, Categorizable, HandlerError, SafeErrorCategory, UowError};
pub use crate::handler::{handler_fn, FnHandler, Handler};
pub use crate::sink::EventSink;
pub use crate::uow::{Session, SessionFactory, UnitOfWork, UowState};
