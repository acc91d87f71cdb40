//! Hierarchical values assembled by the builders.
//!
//! These are plain owned snapshots. They hold no reference back to the store
//! and go stale as soon as the store changes.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sport {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub is_virtual: bool,
    pub is_top_sport: bool,
    pub number_of_events: u32,
    pub number_of_live_events: u32,
    pub number_of_upcoming_matches: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub code: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventCategory {
    pub id: String,
    pub sport_id: String,
    pub name: String,
    pub short_name: String,
    pub number_of_events: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub number_of_events: u32,
    pub number_of_live_events: u32,
    pub sport: Option<Sport>,
    pub location: Option<Location>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BettingOffer {
    pub id: String,
    pub outcome_id: String,
    pub provider_id: String,
    pub odds: f64,
    pub is_live: bool,
    pub is_available: bool,
    pub status_id: String,
    pub last_changed_time: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outcome {
    pub id: String,
    pub code: String,
    pub name: String,
    pub short_name: String,
    pub header_name: Option<String>,
    pub param: Option<f64>,
    pub betting_offers: Vec<BettingOffer>,
}

impl Outcome {
    /// Odds of the first available offer.
    pub fn odds(&self) -> Option<f64> {
        self.betting_offers
            .iter()
            .find(|offer| offer.is_available)
            .or_else(|| self.betting_offers.first())
            .map(|offer| offer.odds)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Market {
    pub id: String,
    pub match_id: String,
    pub name: String,
    pub short_name: String,
    pub betting_type_id: String,
    pub betting_type_name: String,
    pub event_part_id: String,
    pub is_available: bool,
    pub main_line: bool,
    pub param: Option<f64>,
    pub outcomes: Vec<Outcome>,
}

/// Headline market type shown next to each match in a list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MainMarket {
    pub id: String,
    pub sport_id: String,
    pub betting_type_id: String,
    pub betting_type_name: String,
    pub event_part_id: String,
    pub event_part_name: String,
    pub number_of_outcomes: Option<u32>,
    pub live_market: bool,
    pub outright: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub short_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Match {
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub start_time: i64,
    pub status_id: String,
    pub status_name: String,
    pub allows_live_odds: bool,
    pub number_of_markets: u32,
    pub home: Participant,
    pub away: Participant,
    pub tournament_id: String,
    pub tournament_name: String,
    pub sport: Option<Sport>,
    pub venue: Option<Location>,
    pub category: Option<EventCategory>,
    pub markets: Vec<Market>,
    pub live_data: Option<EventLiveData>,
}

/// One page of a match list.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MatchList {
    /// Upstream order.
    pub matches: Vec<Match>,
    /// Main markets of the listed sport, upstream order.
    pub main_markets: Vec<MainMarket>,
}

impl MatchList {
    pub fn ids(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.id.as_str()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarketGroup {
    pub id: String,
    pub key: String,
    pub name: String,
    pub position: Option<i32>,
    pub is_default: bool,
    pub number_of_markets: u32,
    pub is_bet_builder: bool,
    pub is_fast: bool,
    pub is_outright: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum EventStatus {
    NotStarted,
    /// Carries the current part name, e.g. "2nd Half".
    InProgress(String),
    Ended(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Side {
    Home,
    Away,
}

/// Home / away counts. Either side may be unknown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SidePair {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

impl SidePair {
    pub fn is_empty(&self) -> bool {
        self.home.is_none() && self.away.is_none()
    }
}

/// Live state of a match folded from its EventInfo rows.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EventLiveData {
    pub match_id: String,
    pub score: SidePair,
    pub status: Option<EventStatus>,
    /// Minutes elapsed.
    pub match_time: Option<u32>,
    pub serving: Option<Side>,
    pub yellow_cards: Option<SidePair>,
    pub yellow_red_cards: Option<SidePair>,
    pub red_cards: Option<SidePair>,
}

impl EventLiveData {
    /// "67'" style label for the match clock.
    pub fn match_time_label(&self) -> Option<String> {
        self.match_time.map(|minutes| format!("{}'", minutes))
    }
}
