//! Wire rows and the batches that carry them.
//!
//! A batch is a list of heterogeneous rows. Each row is either a full entity
//! (an upsert) or a change record addressed by `(entityType, id)`. Rows are
//! decoded one at a time: a row that can't be decoded becomes
//! [`EntityData::Unknown`] and the rest of the batch still goes through.

mod change;
mod response;

pub use change::{ChangeKind, ChangeRecord};
pub use response::{AggregatorResponse, MessageType};

use crate::entities::{Entity, EntityData};
use crate::types::EntityKind;
use serde_json::Value;
use tracing::{debug, warn};

/// One row of an aggregator batch.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityRecord {
    /// A full entity row, stored as an upsert.
    Entity(EntityData),
    /// A create / update / delete addressed by kind and id.
    Change(ChangeRecord),
}

impl EntityRecord {
    /// Wrap a typed row.
    pub fn entity<T: Entity>(row: T) -> Self {
        EntityRecord::Entity(row.into_data())
    }

    /// Decode one raw row. Never fails; undecodable rows become `Unknown`.
    pub fn from_value(value: Value) -> Self {
        let tag = value.get("_type").and_then(Value::as_str).map(str::to_owned);

        let Some(tag) = tag else {
            debug!("row without _type, keeping as unknown");
            return EntityRecord::Entity(EntityData::Unknown(value));
        };

        if let Some(change_kind) = ChangeKind::from_wire(&tag) {
            return match ChangeRecord::from_value(change_kind, &value) {
                Some(change) => EntityRecord::Change(change),
                None => EntityRecord::Entity(EntityData::Unknown(value)),
            };
        }

        match EntityKind::from_wire(&tag) {
            Some(kind) => EntityRecord::Entity(decode_entity(kind, value)),
            None => {
                debug!(entity_type = %tag, "unknown entity type, keeping as unknown");
                EntityRecord::Entity(EntityData::Unknown(value))
            }
        }
    }

    /// Kind this row addresses, `None` for unknown rows.
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            EntityRecord::Entity(data) => data.kind(),
            EntityRecord::Change(change) => Some(change.kind()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, EntityRecord::Entity(EntityData::Unknown(_)))
    }
}

/// Decode a full row of a known kind. Rows without an id are kept as unknown.
pub(crate) fn decode_entity(kind: EntityKind, value: Value) -> EntityData {
    match EntityData::from_value(kind, &value) {
        Ok(data) if data.id().is_some_and(|id| !id.is_empty()) => data,
        Ok(_) => {
            warn!(kind = %kind, "row without id, keeping as unknown");
            EntityData::Unknown(value)
        }
        Err(e) => {
            warn!(kind = %kind, error = %e, "failed to decode row, keeping as unknown");
            EntityData::Unknown(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{MarketDto, SportDto};
    use serde_json::json;

    #[test]
    fn test_decode_entity_row() {
        let record = EntityRecord::from_value(json!({
            "_type": "SPORT",
            "id": "1",
            "name": "Football",
            "numberOfEvents": 120
        }));

        match record {
            EntityRecord::Entity(data) => {
                let sport = SportDto::from_data(&data).unwrap();
                assert_eq!(sport.name, "Football");
                assert_eq!(sport.number_of_events, 120);
            }
            other => panic!("Expected entity row, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_kept_not_failed() {
        let record = EntityRecord::from_value(json!({"_type": "BANNER", "id": "b1"}));
        assert!(record.is_unknown());
        assert_eq!(record.kind(), None);

        let record = EntityRecord::from_value(json!({"id": "no-type"}));
        assert!(record.is_unknown());
    }

    #[test]
    fn test_malformed_row_becomes_unknown() {
        let record = EntityRecord::from_value(json!({
            "_type": "MARKET",
            "id": "mk1",
            "numberOfOutcomes": "three"
        }));
        assert!(record.is_unknown());

        let record = EntityRecord::from_value(json!({"_type": "MARKET", "name": "1x2"}));
        assert!(record.is_unknown());
    }

    #[test]
    fn test_typed_constructor() {
        let record = EntityRecord::entity(MarketDto {
            id: "mk1".to_string(),
            ..Default::default()
        });
        assert_eq!(record.kind(), Some(EntityKind::Market));
    }
}
