//! Flat entity rows and the typed dispatch over them.
//!
//! [`EntityData`] is the closed sum of every row kind the feed carries, plus
//! an `Unknown` arm for kinds this crate doesn't recognize. The [`Entity`]
//! trait lets the store hand out typed rows without callers matching on
//! `EntityData` themselves.

mod dto;

pub use dto::*;

use crate::error::Result;
use crate::types::EntityKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A flat row type that lives in one collection of the store.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The collection this row type belongs to.
    const KIND: EntityKind;

    /// Identifier, unique within `KIND`.
    fn id(&self) -> &str;

    fn into_data(self) -> EntityData;

    /// Borrow the typed row back out of `data` when the kinds match.
    fn from_data(data: &EntityData) -> Option<&Self>;
}

/// One decoded row of the feed.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityData {
    Sport(SportDto),
    Location(LocationDto),
    Tournament(TournamentDto),
    EventCategory(EventCategoryDto),
    Match(MatchDto),
    Market(MarketDto),
    Outcome(OutcomeDto),
    BettingOffer(BettingOfferDto),
    MarketOutcomeRelation(MarketOutcomeRelationDto),
    MainMarket(MainMarketDto),
    MarketInfo(MarketInfoDto),
    MarketGroup(MarketGroupDto),
    EventInfo(EventInfoDto),
    NextMatchesNumber(NextMatchesNumberDto),
    /// Row with a `_type` this crate doesn't know, or one that failed to decode.
    Unknown(Value),
}

macro_rules! impl_entity {
    ($($dto:ident => $variant:ident),+ $(,)?) => {
        $(
            impl Entity for $dto {
                const KIND: EntityKind = EntityKind::$variant;

                fn id(&self) -> &str {
                    &self.id
                }

                fn into_data(self) -> EntityData {
                    EntityData::$variant(self)
                }

                fn from_data(data: &EntityData) -> Option<&Self> {
                    match data {
                        EntityData::$variant(row) => Some(row),
                        _ => None,
                    }
                }
            }
        )+

        impl EntityData {
            /// Kind of this row, `None` for `Unknown`.
            pub fn kind(&self) -> Option<EntityKind> {
                match self {
                    $(EntityData::$variant(_) => Some(EntityKind::$variant),)+
                    EntityData::Unknown(_) => None,
                }
            }

            /// Identifier of this row, `None` for `Unknown`.
            pub fn id(&self) -> Option<&str> {
                match self {
                    $(EntityData::$variant(row) => Some(&row.id),)+
                    EntityData::Unknown(_) => None,
                }
            }

            /// Decode a JSON object as a row of `kind`.
            pub fn from_value(kind: EntityKind, value: &Value) -> Result<Self> {
                Ok(match kind {
                    $(EntityKind::$variant => EntityData::$variant($dto::deserialize(value)?),)+
                })
            }

            /// Encode the row back to its camelCase JSON object.
            pub fn to_value(&self) -> Result<Value> {
                Ok(match self {
                    $(EntityData::$variant(row) => serde_json::to_value(row)?,)+
                    EntityData::Unknown(raw) => raw.clone(),
                })
            }
        }
    };
}

impl_entity! {
    SportDto => Sport,
    LocationDto => Location,
    TournamentDto => Tournament,
    EventCategoryDto => EventCategory,
    MatchDto => Match,
    MarketDto => Market,
    OutcomeDto => Outcome,
    BettingOfferDto => BettingOffer,
    MarketOutcomeRelationDto => MarketOutcomeRelation,
    MainMarketDto => MainMarket,
    MarketInfoDto => MarketInfo,
    MarketGroupDto => MarketGroup,
    EventInfoDto => EventInfo,
    NextMatchesNumberDto => NextMatchesNumber,
}

impl EntityData {
    pub fn is_unknown(&self) -> bool {
        matches!(self, EntityData::Unknown(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_sparse_row() {
        let data = EntityData::from_value(
            EntityKind::BettingOffer,
            &json!({"_type": "BETTING_OFFER", "id": "bo1", "outcomeId": "o1", "odds": 1.85}),
        )
        .unwrap();

        let offer = BettingOfferDto::from_data(&data).unwrap();
        assert_eq!(offer.id, "bo1");
        assert_eq!(offer.outcome_id, "o1");
        assert_eq!(offer.odds, 1.85);
        assert!(!offer.is_live);
        assert_eq!(data.kind(), Some(EntityKind::BettingOffer));
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let result = EntityData::from_value(
            EntityKind::BettingOffer,
            &json!({"id": "bo1", "odds": "not a number"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_data_wrong_kind() {
        let data = SportDto {
            id: "1".to_string(),
            ..Default::default()
        }
        .into_data();
        assert!(MatchDto::from_data(&data).is_none());
        assert_eq!(data.id(), Some("1"));
    }
}
