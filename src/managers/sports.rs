//! Sport list topic.

use super::{apply_tracking_membership, ChangePolicy};
use crate::builders::SportBuilder;
use crate::config::StoreConfig;
use crate::model::Sport;
use crate::records::EntityRecord;
use crate::router::{Topic, TopicRequest, TopicRouter};
use crate::store::{EntityStore, StoreReader};
use crate::subscriptions::{SubscriptionManager, TopicHandler};
use crate::types::EntityKind;
use std::sync::Arc;
use tracing::debug;

/// Which sports to list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SportsScope {
    All,
    /// Only sports with live events.
    Live,
}

pub struct SportsHandler {
    topic: Topic,
    store: Arc<EntityStore>,
    policy: ChangePolicy,
}

impl SportsHandler {
    pub fn new(router: &TopicRouter, store: &StoreConfig, scope: SportsScope) -> Self {
        let request = match scope {
            SportsScope::All => TopicRequest::Sports,
            SportsScope::Live => TopicRequest::LiveSports,
        };
        Self {
            topic: router.topic(&request),
            store: Arc::new(EntityStore::with_config(store.clone())),
            policy: ChangePolicy::accept(&[EntityKind::Sport]),
        }
    }

    pub fn reader(&self) -> StoreReader {
        StoreReader::new(self.store.clone())
    }
}

impl TopicHandler for SportsHandler {
    type Output = Vec<Sport>;

    fn topic(&self) -> Topic {
        self.topic.clone()
    }

    fn reset(&mut self) {
        self.store.clear();
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<Vec<Sport>> {
        self.policy.apply(&self.store, records);
        Some(SportBuilder::build_all(&self.store))
    }

    fn on_update(&mut self, records: &[EntityRecord]) -> Option<Vec<Sport>> {
        if !apply_tracking_membership(&self.policy, &self.store, EntityKind::Sport, records) {
            return None;
        }
        debug!(sports = self.store.count(EntityKind::Sport), "sport list changed");
        Some(SportBuilder::build_all(&self.store))
    }
}

pub type SportsManager = SubscriptionManager<SportsHandler>;

impl SubscriptionManager<SportsHandler> {
    /// Read-only view of the sport scope.
    pub fn reader(&self) -> StoreReader {
        self.with_handler(|handler| handler.reader())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures::sport;
    use crate::entities::SportDto;
    use crate::records::ChangeRecord;
    use serde_json::{json, Map};

    fn handler() -> SportsHandler {
        SportsHandler::new(&TopicRouter::new("1", "en"), &StoreConfig::default(), SportsScope::Live)
    }

    #[test]
    fn test_topic_by_scope() {
        assert!(handler().topic().path().ends_with("disciplines/LIVE/BOTH"));
    }

    #[test]
    fn test_update_without_membership_change_is_silent() {
        let mut handler = handler();
        let sports = handler
            .on_initial(&[EntityRecord::entity(sport("1")), EntityRecord::entity(sport("2"))])
            .unwrap();
        assert_eq!(sports.len(), 2);

        let mut changed = Map::new();
        changed.insert("numberOfLiveEvents".to_string(), json!(7));
        let update = ChangeRecord::update(EntityKind::Sport, "1", changed);
        assert!(handler.on_update(&[EntityRecord::Change(update)]).is_none());
        assert_eq!(
            handler.reader().get::<SportDto>("1").unwrap().number_of_live_events,
            7
        );

        let sports = handler.on_update(&[EntityRecord::entity(sport("3"))]).unwrap();
        let ids: Vec<_> = sports.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
