//! One match: aggregator, market-group index and per-group markets.
//!
//! Each topic has its own scope. Group details get one isolated scope per
//! group key, so two groups that share a market never see each other's rows.

use super::ChangePolicy;
use crate::builders::{
    HierarchicalBuilder, MarketBuilder, MarketGroupBuilder, MatchBuilder, OutcomeBuilder,
};
use crate::config::StoreConfig;
use crate::entities::{MarketDto, OutcomeDto};
use crate::model::{EventLiveData, Market, MarketGroup, Match, Outcome};
use crate::records::EntityRecord;
use crate::router::{Topic, TopicRequest, TopicRouter};
use crate::store::{EntityStore, EntityWatch, EventInfoWatch, StoreReader};
use crate::subscriptions::{ContentStream, SubscriptionManager, TopicHandler};
use crate::transport::FeedTransport;
use crate::types::EntityKind;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

// --- Handlers ---

/// The match row with its catalog context and live data.
pub struct MatchAggregatorHandler {
    match_id: String,
    topic: Topic,
    store: Arc<EntityStore>,
    policy: ChangePolicy,
}

impl MatchAggregatorHandler {
    pub fn new(router: &TopicRouter, store: &StoreConfig, match_id: impl Into<String>) -> Self {
        let match_id = match_id.into();
        Self {
            topic: router.topic(&TopicRequest::MatchDetails {
                match_id: match_id.clone(),
            }),
            match_id,
            store: Arc::new(EntityStore::with_config(store.clone())),
            policy: ChangePolicy::match_aggregator(),
        }
    }

    pub fn reader(&self) -> StoreReader {
        StoreReader::new(self.store.clone())
    }

    fn apply(&self, records: &[EntityRecord]) -> Option<Match> {
        self.policy.apply(&self.store, records);
        let built = MatchBuilder::build(&self.store, &self.match_id);
        if built.is_none() {
            trace!(match_id = %self.match_id, "match row not in scope yet");
        }
        built
    }
}

impl TopicHandler for MatchAggregatorHandler {
    type Output = Match;

    fn topic(&self) -> Topic {
        self.topic.clone()
    }

    fn reset(&mut self) {
        self.store.clear();
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<Match> {
        self.apply(records)
    }

    fn on_update(&mut self, records: &[EntityRecord]) -> Option<Match> {
        self.apply(records)
    }
}

/// Market-group index of a match, sorted by position.
pub struct MarketGroupsHandler {
    topic: Topic,
    store: Arc<EntityStore>,
    policy: ChangePolicy,
    cached: Option<Vec<MarketGroup>>,
}

impl MarketGroupsHandler {
    pub fn new(router: &TopicRouter, store: &StoreConfig, match_id: impl Into<String>) -> Self {
        Self {
            topic: router.topic(&TopicRequest::MarketGroups {
                match_id: match_id.into(),
            }),
            store: Arc::new(EntityStore::with_config(store.clone())),
            policy: ChangePolicy::accept(&[EntityKind::MarketGroup]),
            cached: None,
        }
    }

    /// Groups from the last frame, `None` until the first one lands.
    pub fn cached(&self) -> Option<&[MarketGroup]> {
        self.cached.as_deref()
    }

    fn apply(&mut self, records: &[EntityRecord]) -> Option<Vec<MarketGroup>> {
        self.policy.apply(&self.store, records);
        let groups = MarketGroupBuilder::build_all(&self.store);
        self.cached = Some(groups.clone());
        Some(groups)
    }
}

impl TopicHandler for MarketGroupsHandler {
    type Output = Vec<MarketGroup>;

    fn topic(&self) -> Topic {
        self.topic.clone()
    }

    fn reset(&mut self) {
        self.store.clear();
        self.cached = None;
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<Vec<MarketGroup>> {
        self.apply(records)
    }

    fn on_update(&mut self, records: &[EntityRecord]) -> Option<Vec<MarketGroup>> {
        self.apply(records)
    }
}

/// Markets of one group. Accepts every kind.
pub struct MarketGroupDetailsHandler {
    group_key: String,
    topic: Topic,
    store: Arc<EntityStore>,
    policy: ChangePolicy,
}

impl MarketGroupDetailsHandler {
    pub fn new(
        router: &TopicRouter,
        store: &StoreConfig,
        match_id: impl Into<String>,
        group_key: impl Into<String>,
    ) -> Self {
        let group_key = group_key.into();
        Self {
            topic: router.topic(&TopicRequest::MarketGroupDetails {
                match_id: match_id.into(),
                group_key: group_key.clone(),
            }),
            group_key,
            store: Arc::new(EntityStore::with_config(store.clone())),
            policy: ChangePolicy::accept_all(),
        }
    }

    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    pub fn reader(&self) -> StoreReader {
        StoreReader::new(self.store.clone())
    }

    fn apply(&self, records: &[EntityRecord]) -> Option<Vec<Market>> {
        self.policy.apply(&self.store, records);
        let markets = MarketBuilder::build_all(&self.store);
        trace!(group = %self.group_key, markets = markets.len(), "group markets built");
        Some(markets)
    }
}

impl TopicHandler for MarketGroupDetailsHandler {
    type Output = Vec<Market>;

    fn topic(&self) -> Topic {
        self.topic.clone()
    }

    fn reset(&mut self) {
        self.store.clear();
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<Vec<Market>> {
        self.apply(records)
    }

    fn on_update(&mut self, records: &[EntityRecord]) -> Option<Vec<Market>> {
        self.apply(records)
    }
}

// --- Composite manager ---

/// Every subscription about one match, with lookups across all scopes.
pub struct MatchDetailsManager {
    match_id: String,
    router: TopicRouter,
    store_config: StoreConfig,
    transport: Arc<dyn FeedTransport>,
    aggregator: SubscriptionManager<MatchAggregatorHandler>,
    groups: SubscriptionManager<MarketGroupsHandler>,
    group_details: Mutex<HashMap<String, SubscriptionManager<MarketGroupDetailsHandler>>>,
}

impl MatchDetailsManager {
    pub fn new(
        router: &TopicRouter,
        store_config: &StoreConfig,
        transport: Arc<dyn FeedTransport>,
        match_id: impl Into<String>,
    ) -> Self {
        let match_id = match_id.into();
        let aggregator = SubscriptionManager::new(
            MatchAggregatorHandler::new(router, store_config, match_id.clone()),
            transport.clone(),
        );
        let groups = SubscriptionManager::new(
            MarketGroupsHandler::new(router, store_config, match_id.clone()),
            transport.clone(),
        );
        Self {
            match_id,
            router: router.clone(),
            store_config: store_config.clone(),
            transport,
            aggregator,
            groups,
            group_details: Mutex::new(HashMap::new()),
        }
    }

    pub fn match_id(&self) -> &str {
        &self.match_id
    }

    /// The match, re-emitted on every frame once its row is present.
    pub fn subscribe_event_details(&self) -> ContentStream<Match> {
        self.aggregator.subscribe()
    }

    pub fn subscribe_market_groups(&self) -> ContentStream<Vec<MarketGroup>> {
        self.groups.subscribe()
    }

    /// Markets of one group in their own scope. Subscribing the same key
    /// again replaces its link and clears its scope.
    pub fn subscribe_market_group_details(&self, group_key: &str) -> ContentStream<Vec<Market>> {
        let mut details = self.group_details.lock();
        let manager = details.entry(group_key.to_string()).or_insert_with(|| {
            debug!(match_id = %self.match_id, group = %group_key, "opening group scope");
            SubscriptionManager::new(
                MarketGroupDetailsHandler::new(
                    &self.router,
                    &self.store_config,
                    self.match_id.clone(),
                    group_key,
                ),
                self.transport.clone(),
            )
        });
        manager.subscribe()
    }

    /// Release one group's link and drop its scope.
    pub fn unsubscribe_market_group_details(&self, group_key: &str) {
        let removed = self.group_details.lock().remove(group_key);
        if let Some(manager) = removed {
            manager.unsubscribe();
        }
    }

    /// Release every link and clear every scope. Idempotent.
    pub fn unsubscribe(&self) {
        self.aggregator.unsubscribe();
        self.groups.unsubscribe();
        let details: Vec<_> = self.group_details.lock().drain().collect();
        for (_, manager) in details {
            manager.unsubscribe();
        }
    }

    // --- Lookups ---

    /// Market groups from the last frame. Empty until loaded.
    pub fn market_groups(&self) -> Vec<MarketGroup> {
        self.groups
            .with_handler(|handler| handler.cached().map(<[MarketGroup]>::to_vec))
            .unwrap_or_default()
    }

    pub fn market_groups_loaded(&self) -> bool {
        self.groups.with_handler(|handler| handler.cached().is_some())
    }

    /// Open group keys.
    pub fn open_groups(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.group_details.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Aggregator scope first, then every group scope.
    fn readers(&self) -> Vec<StoreReader> {
        let mut readers = vec![self.aggregator.with_handler(|handler| handler.reader())];
        let details = self.group_details.lock();
        let mut keys: Vec<&String> = details.keys().collect();
        keys.sort();
        for key in keys {
            if let Some(manager) = details.get(key) {
                readers.push(manager.with_handler(|handler| handler.reader()));
            }
        }
        readers
    }

    fn reader_holding(&self, kind: EntityKind, id: &str) -> Option<StoreReader> {
        self.readers()
            .into_iter()
            .find(|reader| reader.contains(kind, id))
    }

    pub fn market_exists(&self, id: &str) -> bool {
        self.reader_holding(EntityKind::Market, id).is_some()
    }

    pub fn outcome_exists(&self, id: &str) -> bool {
        self.reader_holding(EntityKind::Outcome, id).is_some()
    }

    pub fn betting_offer_exists(&self, id: &str) -> bool {
        self.reader_holding(EntityKind::BettingOffer, id).is_some()
    }

    /// Scope that serves observers of `(kind, id)`.
    ///
    /// The first scope holding the row wins. A row not loaded yet is watched
    /// in the first open group scope, where odds rows arrive, or in the
    /// aggregator scope when no group is open.
    fn observed_scope(&self, kind: EntityKind, id: &str) -> StoreReader {
        let mut readers = self.readers();
        if let Some(index) = readers.iter().position(|reader| reader.contains(kind, id)) {
            return readers.swap_remove(index);
        }
        debug!(kind = %kind, id = %id, "row not loaded, watching default scope");
        let fallback = usize::from(readers.len() > 1);
        readers.swap_remove(fallback)
    }

    /// Observe a market. The watch ends when its scope is cleared.
    pub fn observe_market(&self, id: &str) -> EntityWatch<Market> {
        self.observed_scope(EntityKind::Market, id)
            .observe_built::<MarketDto, MarketBuilder>(id)
    }

    pub fn observe_outcome(&self, id: &str) -> EntityWatch<Outcome> {
        self.observed_scope(EntityKind::Outcome, id)
            .observe_built::<OutcomeDto, OutcomeBuilder>(id)
    }

    /// Follow one offer's price as its parent outcome, resolved in the same
    /// scope as the offer.
    pub fn observe_betting_offer_as_outcome(&self, betting_offer_id: &str) -> EntityWatch<Outcome> {
        self.observed_scope(EntityKind::BettingOffer, betting_offer_id)
            .observe_offer_as_outcome(betting_offer_id)
    }

    /// Live data of this match from the aggregator scope.
    pub fn observe_live_data(&self) -> EventInfoWatch<EventLiveData> {
        self.aggregator
            .with_handler(|handler| handler.reader())
            .observe_live_data(&self.match_id)
    }
}

impl Drop for MatchDetailsManager {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
