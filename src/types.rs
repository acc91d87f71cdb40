//! Core identifier and kind types shared across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of normalized row types carried by the feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Sport,
    Location,
    Tournament,
    EventCategory,
    Match,
    Market,
    Outcome,
    BettingOffer,
    MarketOutcomeRelation,
    MainMarket,
    MarketInfo,
    MarketGroup,
    EventInfo,
    NextMatchesNumber,
}

impl EntityKind {
    /// Every known kind, in a stable order.
    pub const ALL: [EntityKind; 14] = [
        EntityKind::Sport,
        EntityKind::Location,
        EntityKind::Tournament,
        EntityKind::EventCategory,
        EntityKind::Match,
        EntityKind::Market,
        EntityKind::Outcome,
        EntityKind::BettingOffer,
        EntityKind::MarketOutcomeRelation,
        EntityKind::MainMarket,
        EntityKind::MarketInfo,
        EntityKind::MarketGroup,
        EntityKind::EventInfo,
        EntityKind::NextMatchesNumber,
    ];

    /// Name used in the `_type` / `entityType` fields on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            EntityKind::Sport => "SPORT",
            EntityKind::Location => "LOCATION",
            EntityKind::Tournament => "TOURNAMENT",
            EntityKind::EventCategory => "EVENT_CATEGORY",
            EntityKind::Match => "MATCH",
            EntityKind::Market => "MARKET",
            EntityKind::Outcome => "OUTCOME",
            EntityKind::BettingOffer => "BETTING_OFFER",
            EntityKind::MarketOutcomeRelation => "MARKET_OUTCOME_RELATION",
            EntityKind::MainMarket => "MAIN_MARKET",
            EntityKind::MarketInfo => "MARKET_INFO",
            EntityKind::MarketGroup => "MARKET_GROUP",
            EntityKind::EventInfo => "EVENT_INFO",
            EntityKind::NextMatchesNumber => "NEXT_MATCHES_NUMBER",
        }
    }

    /// Parse a wire name. Returns `None` for kinds this crate doesn't know.
    pub fn from_wire(name: &str) -> Option<Self> {
        EntityKind::ALL.into_iter().find(|k| k.wire_name() == name)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Identifier handed to downstream consumers in the `Connected` signal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle for one accepted upstream topic subscription.
///
/// Assigned by the transport in its connect frame and handed back to
/// [`FeedTransport::unsubscribe`](crate::transport::FeedTransport::unsubscribe).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpstreamHandle(pub u64);

impl fmt::Debug for UpstreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UpstreamHandle({})", self.0)
    }
}
