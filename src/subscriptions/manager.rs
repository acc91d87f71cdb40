//! Generic subscription state machine.
//!
//! A [`SubscriptionManager`] holds at most one live upstream link. Each link
//! has one worker thread that reads frames in arrival order, classifies them
//! and hands the rows to a [`TopicHandler`], which owns the store scopes and
//! decides what to emit.
//!
//! Tearing a link down bumps a generation counter under the core lock before
//! anything else happens, so a worker that races with teardown drops its frame
//! instead of writing into a scope that is being cleared. Workers are joined
//! with the core lock released.

use super::types::{ContentItem, ContentStream, ManagerState, SubscribableContent};
use crate::error::FeedError;
use crate::records::{AggregatorResponse, EntityRecord, MessageType};
use crate::router::Topic;
use crate::transport::{FeedFrame, FeedTransport, TransportEvent};
use crate::types::{SubscriptionId, UpstreamHandle};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Topic-specific behavior plugged into a [`SubscriptionManager`].
///
/// All callbacks run on the link worker, one frame at a time.
pub trait TopicHandler: Send + 'static {
    type Output: Send + 'static;

    /// Topic to open on the next link.
    fn topic(&self) -> Topic;

    /// Clear every store scope this handler owns.
    fn reset(&mut self);

    /// Snapshot rows. Returns the value to emit, if any.
    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<Self::Output>;

    /// Incremental rows and changes. Returns the value to emit, if any.
    fn on_update(&mut self, records: &[EntityRecord]) -> Option<Self::Output>;

    fn on_failure(&mut self, _error: &FeedError) {}

    fn on_disconnect(&mut self) {}

    /// Called once by `unsubscribe`, before the scopes are cleared.
    fn on_unsubscribe(&mut self) {}
}

struct LinkWorker {
    cancel: Sender<()>,
    thread: JoinHandle<()>,
}

/// A link taken out of the core, shut down once the core lock is released.
struct DetachedLink {
    worker: Option<LinkWorker>,
    upstream: Option<UpstreamHandle>,
}

impl DetachedLink {
    fn shutdown(self, transport: &dyn FeedTransport) {
        if let Some(worker) = self.worker {
            drop(worker.cancel);
            if worker.thread.thread().id() != thread::current().id()
                && worker.thread.join().is_err()
            {
                warn!("link worker panicked");
            }
        }
        if let Some(handle) = self.upstream {
            transport.unsubscribe(handle);
        }
    }
}

struct Core<H: TopicHandler> {
    handler: H,
    transport: Arc<dyn FeedTransport>,
    state: ManagerState,
    generation: u64,
    subscription_id: Option<SubscriptionId>,
    output: Option<Sender<ContentItem<H::Output>>>,
    /// `Connected` was already emitted on the current output.
    announced: bool,
    received_initial: bool,
    /// Handle of the current link, held from `subscribe` until teardown so
    /// a link that never got `Connected` is still released.
    upstream: Option<UpstreamHandle>,
    worker: Option<LinkWorker>,
}

impl<H: TopicHandler> Core<H> {
    fn detach(&mut self) -> DetachedLink {
        self.generation += 1;
        DetachedLink {
            worker: self.worker.take(),
            upstream: self.upstream.take(),
        }
    }

    fn emit(&self, item: ContentItem<H::Output>) {
        if let Some(output) = &self.output {
            if output.send(item).is_err() {
                trace!("content stream receiver dropped");
            }
        }
    }

    /// Returns false once the link is finished.
    fn handle_event(&mut self, event: TransportEvent) -> bool {
        match event {
            Ok(FeedFrame::Connected(handle)) => {
                if self.upstream != Some(handle) {
                    warn!(handle = handle.0, "connected frame for a different link");
                }
                self.state = ManagerState::ReceivingInitial;
                if !self.announced {
                    self.announced = true;
                    if let Some(id) = self.subscription_id {
                        self.emit(Ok(SubscribableContent::Connected(id)));
                    }
                }
                debug!(topic = %self.handler.topic(), handle = handle.0, "upstream connected");
                true
            }
            Ok(FeedFrame::Message(response)) => {
                self.handle_message(response);
                true
            }
            Ok(FeedFrame::Disconnected) => {
                info!(topic = %self.handler.topic(), "upstream disconnected");
                self.upstream = None;
                self.state = ManagerState::Disconnected;
                self.handler.on_disconnect();
                self.emit(Ok(SubscribableContent::Disconnected));
                self.output = None;
                false
            }
            Err(error) => {
                self.fail(error);
                false
            }
        }
    }

    fn handle_message(&mut self, response: AggregatorResponse) {
        let initial =
            !self.received_initial || response.message_type == MessageType::InitialDump;

        let output = if initial {
            if self.received_initial {
                debug!(topic = %self.handler.topic(), "fresh snapshot, resetting scope");
                self.handler.reset();
            }
            self.received_initial = true;
            trace!(records = response.records.len(), "snapshot");
            self.handler.on_initial(&response.records)
        } else {
            trace!(records = response.records.len(), "update");
            self.handler.on_update(&response.records)
        };

        self.state = ManagerState::ReceivingUpdates;
        if let Some(value) = output {
            self.emit(Ok(SubscribableContent::ContentUpdate(value)));
        }
    }

    fn fail(&mut self, error: FeedError) {
        warn!(topic = %self.handler.topic(), error = %error, "subscription failed");
        self.state = ManagerState::Failed;
        self.handler.on_failure(&error);
        if let Some(handle) = self.upstream.take() {
            self.transport.unsubscribe(handle);
        }
        self.emit(Err(error));
        self.output = None;
    }
}

/// Owns one topic subscription and the handler that interprets it.
pub struct SubscriptionManager<H: TopicHandler> {
    core: Arc<Mutex<Core<H>>>,
    transport: Arc<dyn FeedTransport>,
    /// Serializes subscribe / restart / unsubscribe.
    lifecycle: Mutex<()>,
}

impl<H: TopicHandler> SubscriptionManager<H> {
    pub fn new(handler: H, transport: Arc<dyn FeedTransport>) -> Self {
        let core = Core {
            handler,
            transport: transport.clone(),
            state: ManagerState::Idle,
            generation: 0,
            subscription_id: None,
            output: None,
            announced: false,
            received_initial: false,
            upstream: None,
            worker: None,
        };
        Self {
            core: Arc::new(Mutex::new(core)),
            transport,
            lifecycle: Mutex::new(()),
        }
    }

    /// Open the topic and return a fresh stream.
    ///
    /// Any previous link is torn down and the scopes cleared first; the
    /// previous stream ends.
    pub fn subscribe(&self) -> ContentStream<H::Output> {
        self.subscribe_with(|_| {})
    }

    /// Like [`subscribe`](Self::subscribe), running `prepare` on the handler
    /// after the scopes are cleared and before the new link can deliver.
    pub fn subscribe_with(&self, prepare: impl FnOnce(&mut H)) -> ContentStream<H::Output> {
        let _lifecycle = self.lifecycle.lock();
        self.teardown();

        let (sender, receiver) = unbounded();
        let mut core = self.core.lock();
        core.handler.reset();
        prepare(&mut core.handler);
        core.subscription_id = Some(SubscriptionId(
            NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::SeqCst),
        ));
        core.output = Some(sender);
        core.announced = false;
        self.open_link(&mut core);

        ContentStream::new(receiver)
    }

    /// Reopen the topic on the current output channel, running `prepare` on
    /// the handler before the new link can deliver.
    ///
    /// Returns false without calling `prepare` if there is no live output to
    /// keep (never subscribed, unsubscribed, disconnected or failed).
    pub(crate) fn restart_with(&self, prepare: impl FnOnce(&mut H)) -> bool {
        let _lifecycle = self.lifecycle.lock();
        if self.core.lock().output.is_none() {
            return false;
        }
        self.teardown();

        let mut core = self.core.lock();
        if core.output.is_none() {
            return false;
        }
        core.handler.reset();
        prepare(&mut core.handler);
        self.open_link(&mut core);
        core.output.is_some()
    }

    /// Release the upstream link, clear the scopes and end the stream.
    /// Idempotent.
    pub fn unsubscribe(&self) {
        let _lifecycle = self.lifecycle.lock();
        self.teardown();

        let mut core = self.core.lock();
        if core.state == ManagerState::Idle && core.output.is_none() {
            return;
        }
        core.handler.on_unsubscribe();
        core.handler.reset();
        core.output = None;
        core.state = ManagerState::Idle;
        debug!(topic = %core.handler.topic(), "unsubscribed");
    }

    pub fn state(&self) -> ManagerState {
        self.core.lock().state
    }

    /// Id emitted in the last `Connected` signal.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.core.lock().subscription_id
    }

    /// Run `f` against the handler with the core locked.
    pub fn with_handler<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.core.lock().handler)
    }

    fn teardown(&self) {
        let detached = self.core.lock().detach();
        detached.shutdown(&*self.transport);
    }

    fn open_link(&self, core: &mut MutexGuard<'_, Core<H>>) {
        let topic = core.handler.topic();
        core.state = ManagerState::Connecting;
        core.received_initial = false;

        let link = match self.transport.subscribe(&topic) {
            Ok(link) => link,
            Err(error) => {
                core.fail(error);
                return;
            }
        };
        core.upstream = Some(link.handle);
        let frames = link.frames;

        let (cancel, cancelled) = bounded(1);
        let generation = core.generation;
        let shared = self.core.clone();
        let spawned = thread::Builder::new()
            .name(format!("feed-link-{}", generation))
            .spawn(move || run_link(shared, generation, frames, cancelled));

        match spawned {
            Ok(thread) => {
                core.worker = Some(LinkWorker { cancel, thread });
                debug!(topic = %topic, generation, "link opened");
            }
            Err(e) => core.fail(FeedError::Transport(format!("failed to spawn link worker: {}", e))),
        }
    }
}

impl<H: TopicHandler> Drop for SubscriptionManager<H> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn run_link<H: TopicHandler>(
    core: Arc<Mutex<Core<H>>>,
    generation: u64,
    frames: Receiver<TransportEvent>,
    cancelled: Receiver<()>,
) {
    loop {
        select! {
            recv(cancelled) -> _ => break,
            recv(frames) -> event => {
                let event = event.unwrap_or(Err(FeedError::ChannelClosed));
                let mut core = core.lock();
                if core.generation != generation {
                    trace!(generation, "dropping frame from stale link");
                    break;
                }
                if !core.handle_event(event) {
                    break;
                }
            }
        }
    }
    trace!(generation, "link worker finished");
}
