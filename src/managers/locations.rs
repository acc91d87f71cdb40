//! Locations that have events for one sport.

use super::{apply_tracking_membership, ChangePolicy};
use crate::builders::LocationBuilder;
use crate::config::StoreConfig;
use crate::model::Location;
use crate::records::EntityRecord;
use crate::router::{Topic, TopicRequest, TopicRouter};
use crate::store::EntityStore;
use crate::subscriptions::{SubscriptionManager, TopicHandler};
use crate::types::EntityKind;
use std::sync::Arc;

pub struct LocationsHandler {
    sport_id: String,
    topic: Topic,
    store: Arc<EntityStore>,
    policy: ChangePolicy,
}

impl LocationsHandler {
    pub fn new(router: &TopicRouter, store: &StoreConfig, sport_id: impl Into<String>) -> Self {
        let sport_id = sport_id.into();
        Self {
            topic: router.topic(&TopicRequest::Locations {
                sport_id: sport_id.clone(),
            }),
            sport_id,
            store: Arc::new(EntityStore::with_config(store.clone())),
            policy: ChangePolicy::accept(&[EntityKind::Location]),
        }
    }

    pub fn sport_id(&self) -> &str {
        &self.sport_id
    }
}

impl TopicHandler for LocationsHandler {
    type Output = Vec<Location>;

    fn topic(&self) -> Topic {
        self.topic.clone()
    }

    fn reset(&mut self) {
        self.store.clear();
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<Vec<Location>> {
        self.policy.apply(&self.store, records);
        Some(LocationBuilder::build_all(&self.store))
    }

    fn on_update(&mut self, records: &[EntityRecord]) -> Option<Vec<Location>> {
        apply_tracking_membership(&self.policy, &self.store, EntityKind::Location, records)
            .then(|| LocationBuilder::build_all(&self.store))
    }
}

pub type LocationsManager = SubscriptionManager<LocationsHandler>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures::{location, sport};
    use crate::records::ChangeRecord;

    #[test]
    fn test_locations_list() {
        let mut handler =
            LocationsHandler::new(&TopicRouter::new("1", "en"), &StoreConfig::default(), "4");
        assert_eq!(handler.topic().path(), "/sports/1/en/locations/4");
        assert_eq!(handler.sport_id(), "4");

        let locations = handler
            .on_initial(&[
                EntityRecord::entity(location("pt")),
                EntityRecord::entity(sport("4")),
                EntityRecord::entity(location("es")),
            ])
            .unwrap();
        let ids: Vec<_> = locations.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["pt", "es"]);

        let delete = ChangeRecord::delete(EntityKind::Location, "pt");
        let locations = handler.on_update(&[EntityRecord::Change(delete)]).unwrap();
        assert_eq!(locations.len(), 1);
    }
}
