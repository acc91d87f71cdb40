//! Live and pre-live match lists.
//!
//! The list scope holds every row the topic sends. A second, focused scope
//! mirrors only Match and EventInfo rows so live-data observers never contend
//! with the much larger odds traffic.

use super::{apply_tracking_membership, ChangePolicy};
use crate::builders::{MainMarketBuilder, MarketBuilder, MatchBuilder, OutcomeBuilder};
use crate::config::StoreConfig;
use crate::entities::{MarketDto, OutcomeDto};
use crate::model::{EventLiveData, Market, MatchList, Outcome};
use crate::pagination::{PagedTopic, PaginationController};
use crate::records::EntityRecord;
use crate::router::{Topic, TopicRequest, TopicRouter};
use crate::store::{EntityStore, EntityWatch, EventInfoWatch, StoreReader};
use crate::subscriptions::TopicHandler;
use crate::types::EntityKind;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchListKind {
    Live,
    PreLive,
}

pub struct MatchListHandler {
    kind: MatchListKind,
    sport_id: String,
    requested: usize,
    router: TopicRouter,
    store: Arc<EntityStore>,
    live_store: Arc<EntityStore>,
    policy: ChangePolicy,
    live_policy: ChangePolicy,
}

impl MatchListHandler {
    pub fn new(
        router: &TopicRouter,
        store: &StoreConfig,
        kind: MatchListKind,
        sport_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            sport_id: sport_id.into(),
            requested: 0,
            router: router.clone(),
            store: Arc::new(EntityStore::with_config(store.clone())),
            live_store: Arc::new(EntityStore::with_config(store.clone())),
            policy: ChangePolicy::match_list(),
            live_policy: ChangePolicy::accept(&[EntityKind::Match, EntityKind::EventInfo]),
        }
    }

    pub fn kind(&self) -> MatchListKind {
        self.kind
    }

    pub fn sport_id(&self) -> &str {
        &self.sport_id
    }

    /// Read-only view of the list scope.
    pub fn reader(&self) -> StoreReader {
        StoreReader::new(self.store.clone())
    }

    /// Read-only view of the Match / EventInfo mirror.
    pub fn live_reader(&self) -> StoreReader {
        StoreReader::new(self.live_store.clone())
    }

    fn build(&self) -> MatchList {
        MatchList {
            matches: MatchBuilder::build_all(&self.store),
            main_markets: MainMarketBuilder::build_for_sport(&self.store, &self.sport_id),
        }
    }
}

impl TopicHandler for MatchListHandler {
    type Output = MatchList;

    fn topic(&self) -> Topic {
        let sport_id = self.sport_id.clone();
        let count = self.requested;
        let request = match self.kind {
            MatchListKind::Live => TopicRequest::LiveMatches { sport_id, count },
            MatchListKind::PreLive => TopicRequest::PreLiveMatches { sport_id, count },
        };
        self.router.topic(&request)
    }

    fn reset(&mut self) {
        self.store.clear();
        self.live_store.clear();
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<MatchList> {
        self.policy.apply(&self.store, records);
        self.live_policy.apply(&self.live_store, records);
        Some(self.build())
    }

    fn on_update(&mut self, records: &[EntityRecord]) -> Option<MatchList> {
        self.live_policy.apply(&self.live_store, records);
        if !apply_tracking_membership(&self.policy, &self.store, EntityKind::Match, records) {
            return None;
        }
        debug!(
            sport_id = %self.sport_id,
            matches = self.store.count(EntityKind::Match),
            "match list membership changed"
        );
        Some(self.build())
    }
}

impl PagedTopic for MatchListHandler {
    fn requested_count(&self) -> usize {
        self.requested
    }

    fn set_requested_count(&mut self, count: usize) {
        self.requested = count;
    }

    fn loaded_count(&self) -> usize {
        self.store.count(EntityKind::Match)
    }
}

/// A paged match list with per-entity lookups.
pub type MatchListManager = PaginationController<MatchListHandler>;

impl PaginationController<MatchListHandler> {
    fn list_reader(&self) -> StoreReader {
        self.with_handler(|handler| handler.reader())
    }

    pub fn market_exists(&self, id: &str) -> bool {
        self.list_reader().contains(EntityKind::Market, id)
    }

    pub fn outcome_exists(&self, id: &str) -> bool {
        self.list_reader().contains(EntityKind::Outcome, id)
    }

    pub fn betting_offer_exists(&self, id: &str) -> bool {
        self.list_reader().contains(EntityKind::BettingOffer, id)
    }

    /// Rebuilt on every write to the market row.
    pub fn observe_market(&self, id: &str) -> EntityWatch<Market> {
        self.list_reader().observe_built::<MarketDto, MarketBuilder>(id)
    }

    /// Rebuilt on every write to the outcome row. Odds live on offers; use
    /// [`observe_betting_offer_as_outcome`](Self::observe_betting_offer_as_outcome)
    /// to follow a price.
    pub fn observe_outcome(&self, id: &str) -> EntityWatch<Outcome> {
        self.list_reader().observe_built::<OutcomeDto, OutcomeBuilder>(id)
    }

    pub fn observe_betting_offer_as_outcome(&self, betting_offer_id: &str) -> EntityWatch<Outcome> {
        self.list_reader().observe_offer_as_outcome(betting_offer_id)
    }

    /// Score, status and clock of one listed match.
    pub fn observe_live_data(&self, match_id: &str) -> EventInfoWatch<EventLiveData> {
        self.with_handler(|handler| handler.live_reader())
            .observe_live_data(match_id)
    }
}
