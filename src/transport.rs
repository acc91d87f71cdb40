//! Upstream transport seam.
//!
//! The core never opens sockets. It asks a [`FeedTransport`] for a topic and
//! reads [`TransportEvent`]s off the returned [`FeedLink`], in order. Each
//! subscription yields connect, then a snapshot, then zero or more updates,
//! then optionally a disconnect.
//!
//! The link handle is known as soon as `subscribe` returns, so a link torn
//! down before upstream accepts it can still be released.

use crate::error::{FeedError, Result};
use crate::records::AggregatorResponse;
use crate::router::Topic;
use crate::types::UpstreamHandle;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, trace};

/// One frame from the upstream feed.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedFrame {
    /// Upstream accepted the topic.
    Connected(UpstreamHandle),
    Message(AggregatorResponse),
    /// Upstream closed the topic. Terminal.
    Disconnected,
}

/// A frame or a transport failure.
pub type TransportEvent = std::result::Result<FeedFrame, FeedError>;

/// One opened subscription.
#[derive(Debug)]
pub struct FeedLink {
    /// Handle to pass to [`FeedTransport::unsubscribe`], valid before and
    /// after upstream accepts the topic.
    pub handle: UpstreamHandle,
    /// Frames in arrival order.
    pub frames: Receiver<TransportEvent>,
}

/// Topic-addressed pub/sub feed.
pub trait FeedTransport: Send + Sync {
    /// Open a subscription. Frames arrive on the link's channel in order.
    fn subscribe(&self, topic: &Topic) -> Result<FeedLink>;

    /// Release a subscription, accepted or not. Must be idempotent.
    fn unsubscribe(&self, handle: UpstreamHandle);
}

struct Link {
    handle: UpstreamHandle,
    sender: Sender<TransportEvent>,
}

struct InMemoryInner {
    next_handle: u64,
    /// Live links by topic path.
    links: HashMap<String, Vec<Link>>,
    subscribed: Vec<Topic>,
    unsubscribed: Vec<UpstreamHandle>,
    fail_next: Option<FeedError>,
    auto_connect: bool,
}

/// Channel-backed transport for tests and demos.
///
/// Frames are published by topic to every live link on it. Every call to
/// `subscribe` and `unsubscribe` is recorded for inspection.
pub struct InMemoryTransport {
    inner: Mutex<InMemoryInner>,
}

impl InMemoryTransport {
    /// Create a transport that sends `Connected` as soon as a topic is opened.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(InMemoryInner {
                next_handle: 1,
                links: HashMap::new(),
                subscribed: Vec::new(),
                unsubscribed: Vec::new(),
                fail_next: None,
                auto_connect: true,
            }),
        }
    }

    /// Create a transport that leaves connecting to [`connect`](Self::connect).
    pub fn manual_connect() -> Self {
        let transport = Self::new();
        transport.inner.lock().auto_connect = false;
        transport
    }

    /// Make the next `subscribe` call fail with `error`.
    pub fn fail_next_subscribe(&self, error: FeedError) {
        self.inner.lock().fail_next = Some(error);
    }

    // --- Publishing ---

    /// Send `Connected` on every live link of `topic`.
    pub fn connect(&self, topic: &Topic) -> usize {
        self.send_each(topic, |link| Ok(FeedFrame::Connected(link.handle)))
    }

    /// Send a message to every live link of `topic`. Returns how many got it.
    pub fn publish(&self, topic: &Topic, response: AggregatorResponse) -> usize {
        self.send_each(topic, |_| Ok(FeedFrame::Message(response.clone())))
    }

    /// Send a failure to every live link of `topic`.
    pub fn fail(&self, topic: &Topic, error: FeedError) -> usize {
        self.send_each(topic, |_| Err(error.clone()))
    }

    /// Send `Disconnected` to every live link of `topic`.
    pub fn disconnect(&self, topic: &Topic) -> usize {
        self.send_each(topic, |_| Ok(FeedFrame::Disconnected))
    }

    fn send_each<F>(&self, topic: &Topic, frame: F) -> usize
    where
        F: Fn(&Link) -> TransportEvent,
    {
        let mut inner = self.inner.lock();
        let Some(links) = inner.links.get_mut(topic.path()) else {
            trace!(topic = %topic, "no live links");
            return 0;
        };
        links.retain(|link| link.sender.send(frame(link)).is_ok());
        links.len()
    }

    // --- Inspection ---

    /// Every topic ever subscribed, in call order.
    pub fn subscribed_topics(&self) -> Vec<Topic> {
        self.inner.lock().subscribed.clone()
    }

    pub fn subscribe_count(&self) -> usize {
        self.inner.lock().subscribed.len()
    }

    /// Most recently subscribed topic.
    pub fn last_topic(&self) -> Option<Topic> {
        self.inner.lock().subscribed.last().cloned()
    }

    pub fn unsubscribed_handles(&self) -> Vec<UpstreamHandle> {
        self.inner.lock().unsubscribed.clone()
    }

    /// Number of live links on `topic`.
    pub fn live_links(&self, topic: &Topic) -> usize {
        self.inner.lock().links.get(topic.path()).map_or(0, Vec::len)
    }

    /// Number of live links across all topics.
    pub fn total_live_links(&self) -> usize {
        self.inner.lock().links.values().map(Vec::len).sum()
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedTransport for InMemoryTransport {
    fn subscribe(&self, topic: &Topic) -> Result<FeedLink> {
        let mut inner = self.inner.lock();
        inner.subscribed.push(topic.clone());

        if let Some(error) = inner.fail_next.take() {
            debug!(topic = %topic, error = %error, "refusing subscription");
            return Err(error);
        }

        let handle = UpstreamHandle(inner.next_handle);
        inner.next_handle += 1;

        let (sender, receiver) = unbounded();
        if inner.auto_connect {
            let _ = sender.send(Ok(FeedFrame::Connected(handle)));
        }
        inner
            .links
            .entry(topic.path().to_string())
            .or_default()
            .push(Link { handle, sender });

        debug!(topic = %topic, handle = handle.0, "link opened");
        Ok(FeedLink {
            handle,
            frames: receiver,
        })
    }

    fn unsubscribe(&self, handle: UpstreamHandle) {
        let mut inner = self.inner.lock();
        inner.unsubscribed.push(handle);
        for links in inner.links.values_mut() {
            links.retain(|link| link.handle != handle);
        }
        inner.links.retain(|_, links| !links.is_empty());
        debug!(handle = handle.0, "link closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn topic(path: &str) -> Topic {
        Topic::new(path)
    }

    #[test]
    fn test_subscribe_connects_and_routes_by_topic() {
        let transport = InMemoryTransport::new();
        let rx_a = transport.subscribe(&topic("/a")).unwrap().frames;
        let rx_b = transport.subscribe(&topic("/b")).unwrap().frames;

        let connected = rx_a.recv_timeout(Duration::from_millis(100)).unwrap().unwrap();
        assert!(matches!(connected, FeedFrame::Connected(_)));
        rx_b.recv_timeout(Duration::from_millis(100)).unwrap().unwrap();

        assert_eq!(transport.publish(&topic("/a"), AggregatorResponse::initial(vec![])), 1);
        let frame = rx_a.recv_timeout(Duration::from_millis(100)).unwrap().unwrap();
        assert!(matches!(frame, FeedFrame::Message(_)));
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe_removes_link() {
        let transport = InMemoryTransport::new();
        let link = transport.subscribe(&topic("/a")).unwrap();
        let rx = link.frames;
        let handle = match rx.recv().unwrap().unwrap() {
            FeedFrame::Connected(handle) => handle,
            other => panic!("Expected Connected, got {:?}", other),
        };
        assert_eq!(handle, link.handle);

        transport.unsubscribe(handle);
        transport.unsubscribe(handle);
        assert_eq!(transport.live_links(&topic("/a")), 0);
        assert_eq!(transport.unsubscribed_handles(), vec![handle, handle]);
        assert!(rx.recv().is_err());
    }

    #[test]
    fn test_fail_next_subscribe() {
        let transport = InMemoryTransport::new();
        transport.fail_next_subscribe(FeedError::Transport("refused".to_string()));

        assert!(transport.subscribe(&topic("/a")).is_err());
        assert!(transport.subscribe(&topic("/a")).is_ok());
        assert_eq!(transport.subscribe_count(), 2);
    }

    #[test]
    fn test_manual_connect() {
        let transport = InMemoryTransport::manual_connect();
        let rx = transport.subscribe(&topic("/a")).unwrap().frames;
        assert!(rx.try_recv().is_err());

        transport.connect(&topic("/a"));
        let frame = rx.recv_timeout(Duration::from_millis(100)).unwrap().unwrap();
        assert!(matches!(frame, FeedFrame::Connected(_)));
    }

    #[test]
    fn test_unsubscribe_before_connect() {
        let transport = InMemoryTransport::manual_connect();
        let link = transport.subscribe(&topic("/a")).unwrap();
        assert_eq!(transport.live_links(&topic("/a")), 1);

        transport.unsubscribe(link.handle);
        assert_eq!(transport.live_links(&topic("/a")), 0);
        assert_eq!(transport.connect(&topic("/a")), 0);
        assert!(link.frames.recv().is_err());
    }
}
