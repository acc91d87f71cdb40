//! Market → outcome → betting offer joins.

use super::HierarchicalBuilder;
use crate::entities::{
    BettingOfferDto, MainMarketDto, MarketDto, MarketOutcomeRelationDto, OutcomeDto,
};
use crate::model::{BettingOffer, MainMarket, Market, Outcome};
use crate::store::EntityStore;

pub struct BettingOfferBuilder;

impl BettingOfferBuilder {
    pub fn from_dto(dto: &BettingOfferDto) -> BettingOffer {
        BettingOffer {
            id: dto.id.clone(),
            outcome_id: dto.outcome_id.clone(),
            provider_id: dto.provider_id.clone(),
            odds: dto.odds,
            is_live: dto.is_live,
            is_available: dto.is_available,
            status_id: dto.status_id.clone(),
            last_changed_time: dto.last_changed_time,
        }
    }
}

impl HierarchicalBuilder for BettingOfferBuilder {
    type Output = BettingOffer;

    fn build(store: &EntityStore, id: &str) -> Option<BettingOffer> {
        store.get::<BettingOfferDto>(id).map(|dto| Self::from_dto(&dto))
    }
}

/// Outcome with the offers that reference it.
pub struct OutcomeBuilder;

impl OutcomeBuilder {
    pub fn from_dto(dto: &OutcomeDto, store: &EntityStore) -> Outcome {
        let betting_offers = store
            .get_all_in_order::<BettingOfferDto>()
            .iter()
            .filter(|offer| offer.outcome_id == dto.id)
            .map(BettingOfferBuilder::from_dto)
            .collect();

        Outcome {
            id: dto.id.clone(),
            code: dto.code.clone(),
            name: dto.translated_name.clone(),
            short_name: dto.short_translated_name.clone(),
            header_name: dto.header_name.clone(),
            param: dto.param_float1,
            betting_offers,
        }
    }
}

impl HierarchicalBuilder for OutcomeBuilder {
    type Output = Outcome;

    fn build(store: &EntityStore, id: &str) -> Option<Outcome> {
        store.get::<OutcomeDto>(id).map(|dto| Self::from_dto(&dto, store))
    }
}

/// Market with its outcomes, resolved through relation rows.
pub struct MarketBuilder;

impl MarketBuilder {
    pub fn from_dto(dto: &MarketDto, store: &EntityStore) -> Market {
        let outcomes = store
            .get_all_in_order::<MarketOutcomeRelationDto>()
            .iter()
            .filter(|relation| relation.market_id == dto.id)
            .filter_map(|relation| OutcomeBuilder::build(store, &relation.outcome_id))
            .collect();

        Market {
            id: dto.id.clone(),
            match_id: dto.event_id.clone(),
            name: dto.name.clone(),
            short_name: dto.short_name.clone(),
            betting_type_id: dto.betting_type_id.clone(),
            betting_type_name: dto.betting_type_name.clone(),
            event_part_id: dto.event_part_id.clone(),
            is_available: dto.is_available,
            main_line: dto.main_line,
            param: dto.param_float1,
            outcomes,
        }
    }

    /// Every market of one match, in upstream order.
    pub fn build_for_match(store: &EntityStore, match_id: &str) -> Vec<Market> {
        store
            .get_all_in_order::<MarketDto>()
            .iter()
            .filter(|market| market.event_id == match_id)
            .map(|market| Self::from_dto(market, store))
            .collect()
    }

    /// Every market in the store, in upstream order.
    pub fn build_all(store: &EntityStore) -> Vec<Market> {
        store
            .get_all_in_order::<MarketDto>()
            .iter()
            .map(|market| Self::from_dto(market, store))
            .collect()
    }
}

impl HierarchicalBuilder for MarketBuilder {
    type Output = Market;

    fn build(store: &EntityStore, id: &str) -> Option<Market> {
        store.get::<MarketDto>(id).map(|dto| Self::from_dto(&dto, store))
    }
}

pub struct MainMarketBuilder;

impl MainMarketBuilder {
    pub fn from_dto(dto: &MainMarketDto) -> MainMarket {
        MainMarket {
            id: dto.id.clone(),
            sport_id: dto.sport_id.clone(),
            betting_type_id: dto.betting_type_id.clone(),
            betting_type_name: dto.betting_type_name.clone(),
            event_part_id: dto.event_part_id.clone(),
            event_part_name: dto.event_part_name.clone(),
            number_of_outcomes: dto.number_of_outcomes,
            live_market: dto.live_market,
            outright: dto.outright,
        }
    }

    /// Main markets of one sport, in upstream order.
    pub fn build_for_sport(store: &EntityStore, sport_id: &str) -> Vec<MainMarket> {
        store
            .get_all_in_order::<MainMarketDto>()
            .iter()
            .filter(|main| main.sport_id == sport_id)
            .map(Self::from_dto)
            .collect()
    }
}

impl HierarchicalBuilder for MainMarketBuilder {
    type Output = MainMarket;

    fn build(store: &EntityStore, id: &str) -> Option<MainMarket> {
        store.get::<MainMarketDto>(id).map(|dto| Self::from_dto(&dto))
    }
}
