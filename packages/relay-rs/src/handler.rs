//! The handler capability.

use std::future::Future;

use async_trait::async_trait;

use crate::core::Message;
use crate::error::HandlerError;

/// Handles one message and returns the follow-up messages it produced.
///
/// Returned messages are appended to the tail of the current cascade, so
/// they are processed after everything already queued.
///
/// # Example
///
/// ```ignore
/// struct AcceptPostHandler { deps: Arc<ServerDeps> }
///
/// #[async_trait]
/// impl Handler<SystemMessage> for AcceptPostHandler {
///     fn name(&self) -> &'static str { "accept_post" }
///
///     async fn handle(&self, message: SystemMessage) -> Result<Vec<SystemMessage>, HandlerError> {
///         // open a unit of work, drive the state machine, collect events
///         Ok(events)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<M: Message>: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn handle(&self, message: M) -> Result<Vec<M>, HandlerError>;
}

/// Adapter turning an async closure into a [`Handler`].
///
/// ```ignore
/// let audit = handler_fn("audit", |msg: AppMessage| async move {
///     info!(?msg, "seen");
///     Ok(vec![])
/// });
/// bus.subscribe(AppKind::Greeted, Arc::new(audit));
/// ```
pub fn handler_fn<M, F, Fut>(name: &'static str, f: F) -> FnHandler<F>
where
    M: Message,
    F: Fn(M) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<M>, HandlerError>> + Send,
{
    FnHandler { name, f }
}

/// See [`handler_fn`].
pub struct FnHandler<F> {
    name: &'static str,
    f: F,
}

#[async_trait]
impl<M, F, Fut> Handler<M> for FnHandler<F>
where
    M: Message,
    F: Fn(M) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<M>, HandlerError>> + Send,
{
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, message: M) -> Result<Vec<M>, HandlerError> {
        (self.f)(message).await
    }
}
