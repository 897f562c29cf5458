// Typed handler adapter
//
// Domain handlers work on one payload type (`SaveDraft`, `ModerationFailed`)
// and return anyhow errors. `TypedHandler` unwraps the `SystemMessage`,
// calls the domain handler and turns failures into `HandlerError` tagged
// with the handler's name, which is what the bus expects.

use anyhow::Result;
use async_trait::async_trait;
use relay::{Handler, HandlerError};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::messages::{SystemMessage, UnexpectedMessage};

/// Handles one payload type of the system message set.
#[async_trait]
pub trait MessageHandler<T>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, message: T) -> Result<Vec<SystemMessage>>;
}

pub struct TypedHandler<T, H> {
    inner: H,
    _payload: PhantomData<fn(T)>,
}

impl<T, H> TypedHandler<T, H>
where
    T: TryFrom<SystemMessage, Error = UnexpectedMessage> + Send + 'static,
    H: MessageHandler<T> + 'static,
{
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _payload: PhantomData,
        }
    }

    /// Ready to subscribe on the bus.
    pub fn shared(inner: H) -> Arc<dyn Handler<SystemMessage>> {
        Arc::new(Self::new(inner))
    }
}

#[async_trait]
impl<T, H> Handler<SystemMessage> for TypedHandler<T, H>
where
    T: TryFrom<SystemMessage, Error = UnexpectedMessage> + Send + 'static,
    H: MessageHandler<T> + 'static,
{
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn handle(&self, message: SystemMessage) -> Result<Vec<SystemMessage>, HandlerError> {
        let name = self.inner.name();
        let payload = T::try_from(message).map_err(|err| HandlerError::new(name, err))?;
        self.inner
            .handle(payload)
            .await
            .map_err(|err| HandlerError::new(name, err))
    }
}
