//! Builders for the navigation catalog: sports, locations, categories and
//! tournaments.

use super::HierarchicalBuilder;
use crate::entities::{EventCategoryDto, LocationDto, SportDto, TournamentDto};
use crate::model::{EventCategory, Location, Sport, Tournament};
use crate::store::EntityStore;

pub struct SportBuilder;

impl SportBuilder {
    pub fn from_dto(dto: &SportDto) -> Sport {
        Sport {
            id: dto.id.clone(),
            name: dto.name.clone(),
            short_name: dto.short_name.clone(),
            is_virtual: dto.is_virtual,
            is_top_sport: dto.is_top_sport,
            number_of_events: dto.number_of_events,
            number_of_live_events: dto.number_of_live_events,
            number_of_upcoming_matches: dto.number_of_upcoming_matches,
        }
    }

    /// Every sport, in upstream order.
    pub fn build_all(store: &EntityStore) -> Vec<Sport> {
        store
            .get_all_in_order::<SportDto>()
            .iter()
            .map(Self::from_dto)
            .collect()
    }
}

impl HierarchicalBuilder for SportBuilder {
    type Output = Sport;

    fn build(store: &EntityStore, id: &str) -> Option<Sport> {
        store.get::<SportDto>(id).map(|dto| Self::from_dto(&dto))
    }
}

pub struct LocationBuilder;

impl LocationBuilder {
    pub fn from_dto(dto: &LocationDto) -> Location {
        Location {
            id: dto.id.clone(),
            name: dto.name.clone(),
            short_name: dto.short_name.clone(),
            code: dto.code.clone(),
        }
    }

    pub fn build_all(store: &EntityStore) -> Vec<Location> {
        store
            .get_all_in_order::<LocationDto>()
            .iter()
            .map(Self::from_dto)
            .collect()
    }
}

impl HierarchicalBuilder for LocationBuilder {
    type Output = Location;

    fn build(store: &EntityStore, id: &str) -> Option<Location> {
        store.get::<LocationDto>(id).map(|dto| Self::from_dto(&dto))
    }
}

pub struct EventCategoryBuilder;

impl EventCategoryBuilder {
    pub fn from_dto(dto: &EventCategoryDto) -> EventCategory {
        EventCategory {
            id: dto.id.clone(),
            sport_id: dto.sport_id.clone(),
            name: dto.name.clone(),
            short_name: dto.short_name.clone(),
            number_of_events: dto.number_of_events,
        }
    }
}

impl HierarchicalBuilder for EventCategoryBuilder {
    type Output = EventCategory;

    fn build(store: &EntityStore, id: &str) -> Option<EventCategory> {
        store.get::<EventCategoryDto>(id).map(|dto| Self::from_dto(&dto))
    }
}

/// Tournament with its sport and location resolved.
pub struct TournamentBuilder;

impl TournamentBuilder {
    pub fn from_dto(dto: &TournamentDto, store: &EntityStore) -> Tournament {
        Tournament {
            id: dto.id.clone(),
            name: dto.name.clone(),
            short_name: dto.short_name.clone(),
            number_of_events: dto.number_of_events,
            number_of_live_events: dto.number_of_live_events,
            sport: SportBuilder::build(store, &dto.sport_id),
            location: LocationBuilder::build(store, &dto.venue_id),
        }
    }

    /// Every tournament, in upstream order.
    pub fn build_all(store: &EntityStore) -> Vec<Tournament> {
        store
            .get_all_in_order::<TournamentDto>()
            .iter()
            .map(|dto| Self::from_dto(dto, store))
            .collect()
    }
}

impl HierarchicalBuilder for TournamentBuilder {
    type Output = Tournament;

    fn build(store: &EntityStore, id: &str) -> Option<Tournament> {
        store
            .get::<TournamentDto>(id)
            .map(|dto| Self::from_dto(&dto, store))
    }
}
