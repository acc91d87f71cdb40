//! One betting offer, delivered as the outcome it prices.

use super::ChangePolicy;
use crate::builders::{HierarchicalBuilder, OutcomeBuilder};
use crate::config::StoreConfig;
use crate::entities::BettingOfferDto;
use crate::model::Outcome;
use crate::records::{ChangeRecord, EntityRecord};
use crate::router::{Topic, TopicRequest, TopicRouter};
use crate::store::{EntityStore, StoreReader};
use crate::subscriptions::{SubscriptionManager, TopicHandler};
use crate::types::EntityKind;
use std::sync::Arc;
use tracing::trace;

pub struct SingleOutcomeHandler {
    betting_offer_id: String,
    topic: Topic,
    store: Arc<EntityStore>,
    policy: ChangePolicy,
}

impl SingleOutcomeHandler {
    pub fn new(
        router: &TopicRouter,
        store: &StoreConfig,
        betting_offer_id: impl Into<String>,
    ) -> Self {
        let betting_offer_id = betting_offer_id.into();
        Self {
            topic: router.topic(&TopicRequest::BettingOffer {
                betting_offer_id: betting_offer_id.clone(),
            }),
            betting_offer_id,
            store: Arc::new(EntityStore::with_config(store.clone())),
            policy: ChangePolicy::accept(&[
                EntityKind::BettingOffer,
                EntityKind::Outcome,
                EntityKind::Market,
                EntityKind::MarketOutcomeRelation,
            ]),
        }
    }

    pub fn reader(&self) -> StoreReader {
        StoreReader::new(self.store.clone())
    }

    fn build(&self) -> Option<Outcome> {
        let offer = self.store.get::<BettingOfferDto>(&self.betting_offer_id)?;
        OutcomeBuilder::build(&self.store, &offer.outcome_id)
    }

    /// Whether `records` move this offer's price.
    fn reprices(&self, records: &[EntityRecord]) -> bool {
        records.iter().any(|record| match record {
            EntityRecord::Entity(data) => {
                data.kind() == Some(EntityKind::BettingOffer)
                    && data.id() == Some(self.betting_offer_id.as_str())
            }
            EntityRecord::Change(change) => {
                change.kind() == EntityKind::BettingOffer
                    && change.id() == self.betting_offer_id
                    && match change {
                        ChangeRecord::Update { .. } => change.touches_field("odds"),
                        _ => true,
                    }
            }
        })
    }
}

impl TopicHandler for SingleOutcomeHandler {
    type Output = Outcome;

    fn topic(&self) -> Topic {
        self.topic.clone()
    }

    fn reset(&mut self) {
        self.store.clear();
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<Outcome> {
        self.policy.apply(&self.store, records);
        self.build()
    }

    fn on_update(&mut self, records: &[EntityRecord]) -> Option<Outcome> {
        let reprices = self.reprices(records);
        self.policy.apply(&self.store, records);
        if !reprices {
            trace!(id = %self.betting_offer_id, "update left the price alone");
            return None;
        }
        self.build()
    }
}

pub type SingleOutcomeManager = SubscriptionManager<SingleOutcomeHandler>;

impl SubscriptionManager<SingleOutcomeHandler> {
    /// Read-only view of the offer's scope.
    pub fn reader(&self) -> StoreReader {
        self.with_handler(|handler| handler.reader())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures::{offer, outcome};
    use crate::records::AggregatorResponse;
    use crate::subscriptions::SubscribableContent;
    use crate::transport::InMemoryTransport;
    use serde_json::{json, Map};
    use std::time::Duration;

    fn handler() -> SingleOutcomeHandler {
        SingleOutcomeHandler::new(&TopicRouter::new("1", "en"), &StoreConfig::default(), "bo1")
    }

    fn update(id: &str, field: &str, value: serde_json::Value) -> EntityRecord {
        let mut changed = Map::new();
        changed.insert(field.to_string(), value);
        EntityRecord::Change(ChangeRecord::update(EntityKind::BettingOffer, id, changed))
    }

    #[test]
    fn test_offer_as_outcome() {
        let mut handler = handler();
        let built = handler
            .on_initial(&[
                EntityRecord::entity(outcome("o1", "m1")),
                EntityRecord::entity(offer("bo1", "o1", 1.8)),
            ])
            .unwrap();
        assert_eq!(built.id, "o1");
        assert_eq!(built.odds(), Some(1.8));

        assert!(handler.on_update(&[update("bo1", "isLive", json!(true))]).is_none());
        assert!(handler.on_update(&[update("bo2", "odds", json!(3.0))]).is_none());

        let built = handler.on_update(&[update("bo1", "odds", json!(2.05))]).unwrap();
        assert_eq!(built.odds(), Some(2.05));
    }

    #[test]
    fn test_missing_outcome_yields_nothing() {
        let mut handler = handler();
        assert!(handler
            .on_initial(&[EntityRecord::entity(offer("bo1", "o1", 1.8))])
            .is_none());
        assert!(handler.reader().contains(EntityKind::BettingOffer, "bo1"));
    }

    #[test]
    fn test_manager_reader_sees_scope() {
        let transport = Arc::new(InMemoryTransport::new());
        let manager = SingleOutcomeManager::new(handler(), transport.clone());
        let reader = manager.reader();
        assert!(reader.is_empty());

        let stream = manager.subscribe();
        let topic = transport.last_topic().unwrap();
        transport.publish(
            &topic,
            AggregatorResponse::initial(vec![
                EntityRecord::entity(outcome("o1", "m1")),
                EntityRecord::entity(offer("bo1", "o1", 1.8)),
            ]),
        );
        loop {
            match stream.recv_timeout(Duration::from_millis(500)).unwrap().unwrap() {
                SubscribableContent::ContentUpdate(built) => {
                    assert_eq!(built.id, "o1");
                    break;
                }
                SubscribableContent::Connected(_) => continue,
                other => panic!("Expected content, got {:?}", other),
            }
        }
        assert!(reader.contains(EntityKind::BettingOffer, "bo1"));
        assert_eq!(manager.reader().count(EntityKind::Outcome), 1);
    }
}
