//! Growing-window pagination over list topics.
//!
//! List topics encode the requested item count in the topic itself, so the
//! next page is fetched by reopening the link with a larger count. The
//! caller's stream stays the same across pages; only the upstream link is
//! replaced.

use crate::config::PaginationConfig;
use crate::error::{FeedError, Result};
use crate::records::EntityRecord;
use crate::router::Topic;
use crate::subscriptions::{ContentStream, ManagerState, SubscriptionManager, TopicHandler};
use crate::transport::FeedTransport;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A list topic whose size is set by a requested count.
pub trait PagedTopic: TopicHandler {
    fn requested_count(&self) -> usize;

    /// Takes effect on the next link.
    fn set_requested_count(&mut self, count: usize);

    /// Items currently held in the scope.
    fn loaded_count(&self) -> usize;
}

// --- Page state ---

struct PageState {
    requested: usize,
    loaded: usize,
    has_more: bool,
    in_flight: bool,
    pending: Option<Sender<Result<bool>>>,
}

impl PageState {
    fn new(requested: usize) -> Self {
        Self {
            requested,
            loaded: 0,
            has_more: true,
            in_flight: false,
            pending: None,
        }
    }

    fn resolve(&mut self, outcome: Result<bool>) {
        self.in_flight = false;
        if let Some(pending) = self.pending.take() {
            // The caller may have dropped its request.
            let _ = pending.send(outcome);
        }
    }
}

/// Wraps a [`PagedTopic`] and tracks end-of-data.
pub struct Paged<H> {
    inner: H,
    page: Arc<Mutex<PageState>>,
    max_items: usize,
}

impl<H: PagedTopic> TopicHandler for Paged<H> {
    type Output = H::Output;

    fn topic(&self) -> Topic {
        self.inner.topic()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<H::Output> {
        let output = self.inner.on_initial(records);
        let loaded = self.inner.loaded_count();

        let mut page = self.page.lock();
        page.loaded = loaded;
        if loaded < page.requested {
            info!(loaded, requested = page.requested, "end of data reached");
            page.has_more = false;
        } else if page.requested >= self.max_items {
            debug!(max_items = self.max_items, "page limit reached");
            page.has_more = false;
        }
        let has_more = page.has_more;
        page.resolve(Ok(has_more));
        output
    }

    fn on_update(&mut self, records: &[EntityRecord]) -> Option<H::Output> {
        let output = self.inner.on_update(records);
        self.page.lock().loaded = self.inner.loaded_count();
        output
    }

    fn on_failure(&mut self, error: &FeedError) {
        self.inner.on_failure(error);
        self.page.lock().resolve(Err(error.clone()));
    }

    fn on_disconnect(&mut self) {
        self.inner.on_disconnect();
        self.page.lock().resolve(Err(FeedError::ChannelClosed));
    }

    fn on_unsubscribe(&mut self) {
        self.inner.on_unsubscribe();
        self.page.lock().resolve(Err(FeedError::Cancelled));
    }
}

/// Pending answer to [`PaginationController::load_next_page`].
///
/// Resolves to whether more pages remain once the next snapshot lands.
pub struct PageRequest {
    receiver: Receiver<Result<bool>>,
}

impl PageRequest {
    fn ready(outcome: Result<bool>) -> Self {
        let (sender, receiver) = bounded(1);
        let _ = sender.send(outcome);
        Self { receiver }
    }

    /// Block until resolved.
    pub fn wait(&self) -> Result<bool> {
        self.receiver.recv().map_err(FeedError::from)?
    }

    /// Block up to `timeout`. `None` if still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<bool>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(FeedError::ChannelClosed)),
        }
    }

    /// Non-blocking check. `None` if still pending.
    pub fn try_result(&self) -> Option<Result<bool>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(FeedError::ChannelClosed)),
        }
    }
}

/// Drives a list topic page by page on one output stream.
pub struct PaginationController<H: PagedTopic> {
    manager: SubscriptionManager<Paged<H>>,
    page: Arc<Mutex<PageState>>,
    config: PaginationConfig,
}

impl<H: PagedTopic> PaginationController<H> {
    pub fn new(mut handler: H, transport: Arc<dyn FeedTransport>, config: PaginationConfig) -> Self {
        let initial = config.initial_items.min(config.max_items);
        handler.set_requested_count(initial);
        let page = Arc::new(Mutex::new(PageState::new(initial)));
        let paged = Paged {
            inner: handler,
            page: page.clone(),
            max_items: config.max_items,
        };
        Self {
            manager: SubscriptionManager::new(paged, transport),
            page,
            config,
        }
    }

    /// Open the first page. Paging state starts over.
    pub fn subscribe(&self) -> ContentStream<H::Output> {
        let initial = self.config.initial_items.min(self.config.max_items);
        let page = self.page.clone();
        self.manager.subscribe_with(move |paged| {
            paged.inner.set_requested_count(initial);
            let mut page = page.lock();
            page.resolve(Err(FeedError::Cancelled));
            *page = PageState::new(initial);
        })
    }

    /// Ask for `page_step` more items.
    ///
    /// Resolves `false` right away, without touching the link, when data is
    /// exhausted, the cap is reached or another request is in flight.
    pub fn load_next_page(&self) -> PageRequest {
        let next = {
            let mut page = self.page.lock();
            if page.in_flight {
                debug!("page request already in flight");
                return PageRequest::ready(Ok(false));
            }
            if page.requested >= self.config.max_items {
                page.has_more = false;
            }
            if !page.has_more {
                return PageRequest::ready(Ok(false));
            }
            page.in_flight = true;
            (page.requested + self.config.page_step).min(self.config.max_items)
        };

        let (sender, receiver) = bounded(1);
        let page = self.page.clone();
        let restarted = self.manager.restart_with(move |paged| {
            paged.inner.set_requested_count(next);
            let mut page = page.lock();
            page.requested = next;
            page.pending = Some(sender);
        });

        if !restarted {
            // Either nothing was reopened, or the new link failed and the
            // failure is already waiting on the receiver.
            let outcome = receiver.try_recv().unwrap_or(Err(FeedError::ChannelClosed));
            self.page.lock().in_flight = false;
            return PageRequest::ready(outcome);
        }
        debug!(requested = next, "next page requested");
        PageRequest { receiver }
    }

    /// Reopen the link at the current page size on the same stream.
    ///
    /// The scope starts over from a fresh snapshot and a pending page request
    /// resolves to `Cancelled`. Returns false when there is no live stream.
    pub fn refresh(&self) -> bool {
        let page = self.page.clone();
        let refreshed = self.manager.restart_with(move |paged| {
            let mut page = page.lock();
            let requested = page.requested;
            paged.inner.set_requested_count(requested);
            page.resolve(Err(FeedError::Cancelled));
            *page = PageState::new(requested);
        });
        if refreshed {
            debug!(requested = self.requested_count(), "page refreshed");
        }
        refreshed
    }

    /// Release the link and clear the scope. A pending page request
    /// resolves to `Cancelled`.
    pub fn unsubscribe(&self) {
        self.manager.unsubscribe();
        self.page.lock().resolve(Err(FeedError::Cancelled));
    }

    pub fn can_load_more(&self) -> bool {
        let page = self.page.lock();
        page.has_more && !page.in_flight && page.requested < self.config.max_items
    }

    pub fn requested_count(&self) -> usize {
        self.page.lock().requested
    }

    /// Items held after the latest frame.
    pub fn current_count(&self) -> usize {
        self.page.lock().loaded
    }

    pub fn state(&self) -> ManagerState {
        self.manager.state()
    }

    /// Run `f` against the wrapped handler.
    pub fn with_handler<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        self.manager.with_handler(|paged| f(&mut paged.inner))
    }
}
