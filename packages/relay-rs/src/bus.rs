//! The message bus.
//!
//! # Guarantees
//!
//! - **Exactly one handler per kind**: re-subscribing keeps the first handler
//! - **Sequential**: each handler is awaited before the next message is popped
//! - **Breadth-first cascade**: follow-ups go to the tail of the queue and the
//!   loop runs until the queue is empty, so one `handle()` call drains the
//!   whole cascade it triggered
//! - **Fail fast**: an unroutable message or a handler error aborts the
//!   cascade; work already done is not undone
//!
//! The bus holds nothing but the routing table. Each `handle()` call owns its
//! own queue, so independent top-level calls (e.g. two moderation callbacks)
//! never share state through the bus.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info_span, warn, Instrument};

use crate::core::{CorrelationId, Message};
use crate::error::BusError;
use crate::handler::Handler;

/// Routes messages to their single registered handler.
///
/// Built once at startup and shared by reference (`Arc<MessageBus<M>>`).
///
/// # Example
///
/// ```ignore
/// let bus = MessageBus::new()
///     .with_handler(AppKind::Greet, Arc::new(GreetHandler))
///     .with_handler(AppKind::Greeted, Arc::new(AuditHandler));
///
/// let dispatch = bus.handle(AppMessage::Greet(Greet { name: "ada".into() })).await?;
/// assert_eq!(dispatch.handled(), &[AppKind::Greet, AppKind::Greeted]);
/// ```
pub struct MessageBus<M: Message> {
    handlers: HashMap<M::Kind, Arc<dyn Handler<M>>>,
}

impl<M: Message> MessageBus<M> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `kind`.
    ///
    /// Returns `false` and keeps the existing handler if `kind` is already
    /// taken.
    pub fn subscribe(&mut self, kind: M::Kind, handler: Arc<dyn Handler<M>>) -> bool {
        if let Some(existing) = self.handlers.get(&kind) {
            debug!(
                ?kind,
                kept = existing.name(),
                ignored = handler.name(),
                "handler already registered"
            );
            return false;
        }
        self.handlers.insert(kind, handler);
        true
    }

    /// Builder form of [`subscribe`](Self::subscribe).
    pub fn with_handler(mut self, kind: M::Kind, handler: Arc<dyn Handler<M>>) -> Self {
        self.subscribe(kind, handler);
        self
    }

    pub fn unsubscribe(&mut self, kind: M::Kind) -> Option<Arc<dyn Handler<M>>> {
        self.handlers.remove(&kind)
    }

    pub fn is_subscribed(&self, kind: M::Kind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Handle `message` and every follow-up it produces.
    pub async fn handle(&self, message: M) -> Result<Dispatch<M::Kind>, BusError> {
        let correlation_id = CorrelationId::new();
        let span = info_span!("dispatch", cid = %correlation_id, root = ?message.kind());
        self.drain(message, correlation_id).instrument(span).await
    }

    async fn drain(
        &self,
        message: M,
        correlation_id: CorrelationId,
    ) -> Result<Dispatch<M::Kind>, BusError> {
        let mut queue = VecDeque::from([message]);
        let mut handled = Vec::new();

        while let Some(message) = queue.pop_front() {
            let kind = message.kind();
            let Some(handler) = self.handlers.get(&kind).cloned() else {
                warn!(?kind, "no handler registered, aborting cascade");
                return Err(BusError::NoHandler {
                    kind: format!("{:?}", kind),
                });
            };

            debug!(?kind, role = %message.role(), handler = handler.name(), "handling message");

            let follow_ups = handler.handle(message).await.map_err(|err| {
                error!(?kind, handler = handler.name(), error = %err, "handler failed");
                err
            })?;

            handled.push(kind);
            queue.extend(follow_ups);
        }

        Ok(Dispatch {
            correlation_id,
            handled,
        })
    }
}

impl<M: Message> Default for MessageBus<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Message> fmt::Debug for MessageBus<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBus")
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// What one `handle()` call processed, in order.
#[derive(Debug, Clone)]
pub struct Dispatch<K> {
    correlation_id: CorrelationId,
    handled: Vec<K>,
}

impl<K: PartialEq> Dispatch<K> {
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn handled(&self) -> &[K] {
        &self.handled
    }

    /// How many messages of `kind` were handled.
    pub fn count(&self, kind: K) -> usize {
        self.handled.iter().filter(|k| **k == kind).count()
    }

    pub fn len(&self) -> usize {
        self.handled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MessageRole;
    use crate::error::HandlerError;
    use crate::handler::handler_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum TestMessage {
        Start(u32),
        Step(u32),
        Done,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        Start,
        Step,
        Done,
    }

    impl Message for TestMessage {
        type Kind = TestKind;

        fn kind(&self) -> TestKind {
            match self {
                TestMessage::Start(_) => TestKind::Start,
                TestMessage::Step(_) => TestKind::Step,
                TestMessage::Done => TestKind::Done,
            }
        }

        fn role(&self) -> MessageRole {
            match self {
                TestMessage::Start(_) => MessageRole::Command,
                _ => MessageRole::Event,
            }
        }
    }

    fn noop(name: &'static str) -> Arc<dyn Handler<TestMessage>> {
        Arc::new(handler_fn(name, |_msg: TestMessage| async { Ok(vec![]) }))
    }

    #[tokio::test]
    async fn test_handle_invokes_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let bus = MessageBus::<TestMessage>::new().with_handler(
            TestKind::Done,
            Arc::new(handler_fn("done", move |_msg: TestMessage| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![])
                }
            })),
        );

        let dispatch = bus.handle(TestMessage::Done).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatch.handled(), &[TestKind::Done]);
        assert!(!dispatch.correlation_id().is_none());
    }

    #[tokio::test]
    async fn test_subscribe_keeps_first_handler() {
        let mut bus = MessageBus::<TestMessage>::new();
        assert!(bus.subscribe(TestKind::Done, noop("first")));
        assert!(!bus.subscribe(TestKind::Done, noop("second")));

        assert_eq!(bus.handler_count(), 1);
        let kept = bus.unsubscribe(TestKind::Done).unwrap();
        assert_eq!(kept.name(), "first");
        assert!(!bus.is_subscribed(TestKind::Done));
    }

    #[tokio::test]
    async fn test_unknown_kind_is_routing_error() {
        let bus = MessageBus::<TestMessage>::new().with_handler(TestKind::Done, noop("done"));

        let err = bus.handle(TestMessage::Step(1)).await.unwrap_err();

        assert!(matches!(err, BusError::NoHandler { ref kind } if kind == "Step"));
        // the bus is still usable
        assert!(bus.handle(TestMessage::Done).await.is_ok());
    }

    #[tokio::test]
    async fn test_cascade_is_breadth_first() {
        let seen = Arc::new(Mutex::new(Vec::new()));

        let start_seen = seen.clone();
        let step_seen = seen.clone();
        let done_seen = seen.clone();

        let bus = MessageBus::<TestMessage>::new()
            .with_handler(
                TestKind::Start,
                Arc::new(handler_fn("start", move |msg: TestMessage| {
                    start_seen.lock().unwrap().push(msg);
                    async { Ok(vec![TestMessage::Step(1), TestMessage::Step(2)]) }
                })),
            )
            .with_handler(
                TestKind::Step,
                Arc::new(handler_fn("step", move |msg: TestMessage| {
                    step_seen.lock().unwrap().push(msg.clone());
                    async move {
                        match msg {
                            TestMessage::Step(1) => Ok(vec![TestMessage::Done]),
                            _ => Ok(vec![]),
                        }
                    }
                })),
            )
            .with_handler(
                TestKind::Done,
                Arc::new(handler_fn("done", move |msg: TestMessage| {
                    done_seen.lock().unwrap().push(msg);
                    async { Ok(vec![]) }
                })),
            );

        let dispatch = bus.handle(TestMessage::Start(0)).await.unwrap();

        // Step(2) was queued before Done, so it runs first
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                TestMessage::Start(0),
                TestMessage::Step(1),
                TestMessage::Step(2),
                TestMessage::Done,
            ]
        );
        assert_eq!(dispatch.len(), 4);
        assert_eq!(dispatch.count(TestKind::Step), 2);
    }

    #[tokio::test]
    async fn test_handler_error_aborts_cascade() {
        let done_calls = Arc::new(AtomicUsize::new(0));
        let counter = done_calls.clone();

        let bus = MessageBus::<TestMessage>::new()
            .with_handler(
                TestKind::Start,
                Arc::new(handler_fn("start", |_msg: TestMessage| async {
                    Ok(vec![TestMessage::Step(1), TestMessage::Done])
                })),
            )
            .with_handler(
                TestKind::Step,
                Arc::new(handler_fn("step", |_msg: TestMessage| async {
                    Err(HandlerError::new("step", anyhow::anyhow!("storage offline")))
                })),
            )
            .with_handler(
                TestKind::Done,
                Arc::new(handler_fn("done", move |_msg: TestMessage| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(vec![])
                    }
                })),
            );

        let err = bus.handle(TestMessage::Start(0)).await.unwrap_err();

        assert_eq!(err.handler_error().map(|e| e.handler()), Some("step"));
        assert_eq!(done_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_handles_do_not_share_queue() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let bus = Arc::new(
            MessageBus::<TestMessage>::new()
                .with_handler(
                    TestKind::Start,
                    Arc::new(handler_fn("start", |msg: TestMessage| async move {
                        match msg {
                            TestMessage::Start(n) => Ok(vec![TestMessage::Step(n)]),
                            _ => Ok(vec![]),
                        }
                    })),
                )
                .with_handler(
                    TestKind::Step,
                    Arc::new(handler_fn("step", move |_msg: TestMessage| {
                        let counter = counter.clone();
                        async move {
                            tokio::task::yield_now().await;
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(vec![])
                        }
                    })),
                ),
        );

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let bus = bus.clone();
                tokio::spawn(async move { bus.handle(TestMessage::Start(n)).await })
            })
            .collect();

        for handle in handles {
            let dispatch = handle.await.unwrap().unwrap();
            assert_eq!(dispatch.handled(), &[TestKind::Start, TestKind::Step]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }
}
