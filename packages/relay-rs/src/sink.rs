//! Explicit event sink.
//!
//! Domain code never owns an ambient queue of pending events. Every call that
//! can produce events takes `&mut EventSink<M>` and pushes into it; the caller
//! decides what happens to them (usually hands them to a unit of work).

use std::collections::VecDeque;

/// FIFO buffer of messages produced by domain logic.
#[derive(Debug, Clone)]
pub struct EventSink<M> {
    queue: VecDeque<M>,
}

impl<M> EventSink<M> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn push(&mut self, message: impl Into<M>) {
        self.queue.push_back(message.into());
    }

    /// Append every message of `other`, preserving its order.
    pub fn extend(&mut self, other: EventSink<M>) {
        self.queue.extend(other.queue);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &M> {
        self.queue.iter()
    }

    pub fn last(&self) -> Option<&M> {
        self.queue.back()
    }

    /// Remove and yield messages in emission order.
    pub fn drain(&mut self) -> impl Iterator<Item = M> + '_ {
        self.queue.drain(..)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn into_vec(self) -> Vec<M> {
        self.queue.into()
    }
}

impl<M> Default for EventSink<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> IntoIterator for EventSink<M> {
    type Item = M;
    type IntoIter = std::collections::vec_deque::IntoIter<M>;

    fn into_iter(self) -> Self::IntoIter {
        self.queue.into_iter()
    }
}
