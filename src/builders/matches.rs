//! Match and market-group builders.

use super::catalog::{EventCategoryBuilder, LocationBuilder, SportBuilder};
use super::live_data::EventLiveDataBuilder;
use super::odds::MarketBuilder;
use super::HierarchicalBuilder;
use crate::entities::{MarketGroupDto, MatchDto};
use crate::model::{Match, MarketGroup, Participant};
use crate::store::EntityStore;

/// Match with sport, venue, category, markets and live data resolved.
pub struct MatchBuilder;

impl MatchBuilder {
    pub fn from_dto(dto: &MatchDto, store: &EntityStore) -> Match {
        let infos = store.event_infos(&dto.id);
        let live_data = if infos.is_empty() {
            None
        } else {
            Some(EventLiveDataBuilder::from_infos(&dto.id, &infos, Some(dto)))
        };

        Match {
            id: dto.id.clone(),
            name: dto.name.clone(),
            start_time: dto.start_time,
            status_id: dto.status_id.clone(),
            status_name: dto.status_name.clone(),
            allows_live_odds: dto.allows_live_odds,
            number_of_markets: dto.number_of_markets,
            home: Participant {
                id: dto.home_participant_id.clone(),
                name: dto.home_participant_name.clone(),
                short_name: dto.home_short_participant_name.clone(),
            },
            away: Participant {
                id: dto.away_participant_id.clone(),
                name: dto.away_participant_name.clone(),
                short_name: dto.away_short_participant_name.clone(),
            },
            tournament_id: dto.parent_id.clone(),
            tournament_name: dto.parent_name.clone(),
            sport: SportBuilder::build(store, &dto.sport_id),
            venue: LocationBuilder::build(store, &dto.venue_id),
            category: EventCategoryBuilder::build(store, &dto.category_id),
            markets: MarketBuilder::build_for_match(store, &dto.id),
            live_data,
        }
    }

    /// Every match, in upstream order.
    pub fn build_all(store: &EntityStore) -> Vec<Match> {
        store
            .get_all_in_order::<MatchDto>()
            .iter()
            .map(|dto| Self::from_dto(dto, store))
            .collect()
    }
}

impl HierarchicalBuilder for MatchBuilder {
    type Output = Match;

    fn build(store: &EntityStore, id: &str) -> Option<Match> {
        store.get::<MatchDto>(id).map(|dto| Self::from_dto(&dto, store))
    }
}

pub struct MarketGroupBuilder;

impl MarketGroupBuilder {
    pub fn from_dto(dto: &MarketGroupDto) -> MarketGroup {
        MarketGroup {
            id: dto.id.clone(),
            key: dto.group_key.clone().unwrap_or_else(|| dto.id.clone()),
            name: dto.translated_name.clone(),
            position: dto.position,
            is_default: dto.is_default,
            number_of_markets: dto.number_of_markets,
            is_bet_builder: dto.is_bet_builder,
            is_fast: dto.is_fast,
            is_outright: dto.is_outright,
        }
    }

    /// Every group sorted by position. Groups without a position go last,
    /// in upstream order.
    pub fn build_all(store: &EntityStore) -> Vec<MarketGroup> {
        let mut groups: Vec<MarketGroup> = store
            .get_all_in_order::<MarketGroupDto>()
            .iter()
            .map(Self::from_dto)
            .collect();
        groups.sort_by_key(|group| group.position.unwrap_or(i32::MAX));
        groups
    }
}

impl HierarchicalBuilder for MarketGroupBuilder {
    type Output = MarketGroup;

    fn build(store: &EntityStore, id: &str) -> Option<MarketGroup> {
        store.get::<MarketGroupDto>(id).map(|dto| Self::from_dto(&dto))
    }
}
