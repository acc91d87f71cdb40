//! Types shared by every topic manager.

use crate::error::FeedError;
use crate::types::SubscriptionId;
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// What a manager emits downstream.
#[derive(Clone, Debug, PartialEq)]
pub enum SubscribableContent<T> {
    /// Upstream accepted the topic.
    Connected(SubscriptionId),
    /// A freshly built value.
    ContentUpdate(T),
    /// Upstream closed the topic. The stream ends after this.
    Disconnected,
}

impl<T> SubscribableContent<T> {
    /// The carried value, if this is a content update.
    pub fn into_content(self) -> Option<T> {
        match self {
            SubscribableContent::ContentUpdate(value) => Some(value),
            _ => None,
        }
    }
}

/// One stream item. An `Err` is a transport failure and is always the last item.
pub type ContentItem<T> = Result<SubscribableContent<T>, FeedError>;

/// Lifecycle of a manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerState {
    Idle,
    /// Topic requested, waiting for upstream to accept.
    Connecting,
    /// Accepted, waiting for the snapshot.
    ReceivingInitial,
    ReceivingUpdates,
    /// Upstream closed the topic. Call `subscribe` again to recover.
    Disconnected,
    /// Transport failure. Call `subscribe` again to recover.
    Failed,
}

/// Downstream end of a manager's output channel.
///
/// Ends when the manager unsubscribes, is dropped, fails, or upstream
/// disconnects.
pub struct ContentStream<T> {
    receiver: Receiver<ContentItem<T>>,
}

impl<T> ContentStream<T> {
    pub(crate) fn new(receiver: Receiver<ContentItem<T>>) -> Self {
        Self { receiver }
    }

    /// Receive the next item (blocking).
    pub fn recv(&self) -> Result<ContentItem<T>, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an item (non-blocking).
    pub fn try_recv(&self) -> Result<ContentItem<T>, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ContentItem<T>, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Blocking iterator over items until the stream ends.
    pub fn iter(&self) -> impl Iterator<Item = ContentItem<T>> + '_ {
        self.receiver.iter()
    }

    /// Underlying receiver, for use with `crossbeam_channel::select!`.
    pub fn receiver(&self) -> &Receiver<ContentItem<T>> {
        &self.receiver
    }
}
