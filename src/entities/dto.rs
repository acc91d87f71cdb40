//! Flat, normalized rows as they arrive on the wire.
//!
//! Every row carries a stable `id` unique within its kind. Fields are
//! camelCase on the wire; anything missing decodes to its default so that a
//! sparse row still lands in the store.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SportDto {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub is_virtual: bool,
    pub number_of_events: u32,
    pub number_of_live_events: u32,
    pub number_of_upcoming_matches: u32,
    pub show_event_category: bool,
    pub is_top_sport: bool,
    pub has_matches: bool,
    pub parent_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationDto {
    pub id: String,
    pub type_id: String,
    pub name: String,
    pub short_name: String,
    pub code: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TournamentDto {
    pub id: String,
    pub type_id: String,
    pub name: String,
    pub short_name: String,
    pub sport_id: String,
    /// Location the tournament is played in.
    pub venue_id: String,
    pub number_of_events: u32,
    pub number_of_live_events: u32,
    pub number_of_upcoming_matches: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventCategoryDto {
    pub id: String,
    pub sport_id: String,
    pub sport_name: String,
    pub name: String,
    pub short_name: String,
    pub number_of_events: u32,
    pub number_of_live_events: u32,
    pub number_of_upcoming_matches: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchDto {
    pub id: String,
    pub type_id: String,
    pub sport_id: String,
    /// Tournament this match belongs to.
    pub parent_id: String,
    pub name: String,
    pub short_name: String,
    /// Milliseconds since the Unix epoch.
    pub start_time: i64,
    pub venue_id: String,
    pub status_id: String,
    pub status_name: String,
    pub allows_live_odds: bool,
    pub number_of_markets: u32,
    pub number_of_betting_offers: u32,
    pub sport_name: String,
    pub parent_name: String,
    pub venue_name: String,
    pub home_participant_id: String,
    pub home_participant_name: String,
    pub home_short_participant_name: String,
    pub away_participant_id: String,
    pub away_participant_name: String,
    pub away_short_participant_name: String,
    pub category_id: String,
    pub category_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketDto {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub display_name: String,
    /// Match this market belongs to.
    pub event_id: String,
    pub event_part_id: String,
    pub betting_type_id: String,
    pub betting_type_name: String,
    pub short_betting_type_name: String,
    pub number_of_outcomes: u32,
    pub is_complete: bool,
    pub is_closed: bool,
    pub is_available: bool,
    pub main_line: bool,
    pub param_float1: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutcomeDto {
    pub id: String,
    pub type_id: String,
    pub status_id: String,
    pub event_id: String,
    pub event_part_id: String,
    pub code: String,
    pub translated_name: String,
    pub short_translated_name: String,
    pub param_float1: Option<f64>,
    pub header_name: Option<String>,
    pub header_name_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BettingOfferDto {
    pub id: String,
    pub provider_id: String,
    pub outcome_id: String,
    pub betting_type_id: String,
    pub status_id: String,
    pub is_live: bool,
    pub odds: f64,
    /// Milliseconds since the Unix epoch.
    pub last_changed_time: i64,
    pub is_available: bool,
}

/// Join row linking a market to one of its outcomes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketOutcomeRelationDto {
    pub id: String,
    pub market_id: String,
    pub outcome_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MainMarketDto {
    pub id: String,
    pub betting_type_id: String,
    pub event_part_id: String,
    pub sport_id: String,
    pub betting_type_name: String,
    pub event_part_name: String,
    pub number_of_outcomes: Option<u32>,
    pub live_market: bool,
    pub outright: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketInfoDto {
    pub id: String,
    pub market_info: String,
    pub display_key: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketGroupDto {
    pub id: String,
    pub event_id: String,
    pub group_key: Option<String>,
    pub translated_name: String,
    pub position: Option<i32>,
    pub is_default: bool,
    pub number_of_markets: u32,
    pub is_bet_builder: bool,
    pub is_fast: bool,
    pub is_outright: bool,
}

/// Live data point for a match (score, cards, serve, status or time).
///
/// `type_id` selects the meaning: `1` score, `2` yellow cards, `3`
/// yellow-red cards, `4` red cards, `37` serve, `92` event status, `95`
/// match time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventInfoDto {
    pub id: String,
    pub event_id: String,
    pub type_id: String,
    pub status_id: String,
    pub event_part_name: Option<String>,
    pub param_float1: Option<f64>,
    pub param_float2: Option<f64>,
    pub param_participant_id1: Option<String>,
    pub param_participant_id2: Option<String>,
    pub param_event_status_name1: Option<String>,
    pub param_event_part_name1: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NextMatchesNumberDto {
    pub id: String,
    pub number_of_next_events: u32,
}
