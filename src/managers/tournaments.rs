//! Tournament list for one sport.

use super::ChangePolicy;
use crate::builders::TournamentBuilder;
use crate::config::StoreConfig;
use crate::model::Tournament;
use crate::records::EntityRecord;
use crate::router::{Topic, TopicRequest, TopicRouter};
use crate::store::EntityStore;
use crate::subscriptions::{SubscriptionManager, TopicHandler};
use crate::types::EntityKind;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TournamentsScope {
    All,
    /// The `count` most popular tournaments.
    Popular { count: usize },
}

pub struct TournamentsHandler {
    topic: Topic,
    store: Arc<EntityStore>,
    policy: ChangePolicy,
}

impl TournamentsHandler {
    pub fn new(
        router: &TopicRouter,
        store: &StoreConfig,
        sport_id: impl Into<String>,
        scope: TournamentsScope,
    ) -> Self {
        let sport_id = sport_id.into();
        let request = match scope {
            TournamentsScope::All => TopicRequest::Tournaments { sport_id },
            TournamentsScope::Popular { count } => {
                TopicRequest::PopularTournaments { sport_id, count }
            }
        };
        Self {
            topic: router.topic(&request),
            store: Arc::new(EntityStore::with_config(store.clone())),
            policy: ChangePolicy::accept(&[
                EntityKind::Tournament,
                EntityKind::Sport,
                EntityKind::Location,
            ]),
        }
    }

    /// Tournaments with at least one event, in upstream order.
    fn listed(&self) -> Vec<Tournament> {
        TournamentBuilder::build_all(&self.store)
            .into_iter()
            .filter(|tournament| tournament.number_of_events > 0)
            .collect()
    }
}

fn ids(tournaments: &[Tournament]) -> Vec<&str> {
    tournaments.iter().map(|t| t.id.as_str()).collect()
}

impl TopicHandler for TournamentsHandler {
    type Output = Vec<Tournament>;

    fn topic(&self) -> Topic {
        self.topic.clone()
    }

    fn reset(&mut self) {
        self.store.clear();
    }

    fn on_initial(&mut self, records: &[EntityRecord]) -> Option<Vec<Tournament>> {
        self.policy.apply(&self.store, records);
        Some(self.listed())
    }

    /// Membership counts only listed tournaments, so one dropping to zero
    /// events leaves the list.
    fn on_update(&mut self, records: &[EntityRecord]) -> Option<Vec<Tournament>> {
        let before = self.listed();
        self.policy.apply(&self.store, records);
        let after = self.listed();

        let mut before_ids = ids(&before);
        let mut after_ids = ids(&after);
        before_ids.sort_unstable();
        after_ids.sort_unstable();
        (before_ids != after_ids).then_some(after)
    }
}

pub type TournamentsManager = SubscriptionManager<TournamentsHandler>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::fixtures::{location, sport, tournament};
    use crate::records::ChangeRecord;
    use serde_json::{json, Map};

    fn handler(scope: TournamentsScope) -> TournamentsHandler {
        TournamentsHandler::new(&TopicRouter::new("1", "en"), &StoreConfig::default(), "1", scope)
    }

    #[test]
    fn test_popular_topic() {
        let handler = handler(TournamentsScope::Popular { count: 8 });
        assert_eq!(handler.topic().path(), "/sports/1/en/popular-tournaments/1/8");
    }

    #[test]
    fn test_empty_tournaments_filtered() {
        let mut handler = handler(TournamentsScope::All);
        let list = handler
            .on_initial(&[
                EntityRecord::entity(sport("1")),
                EntityRecord::entity(location("loc1")),
                EntityRecord::entity(tournament("t1", "1", "loc1", 3)),
                EntityRecord::entity(tournament("t2", "1", "loc1", 0)),
                EntityRecord::entity(tournament("t3", "1", "loc1", 1)),
            ])
            .unwrap();
        assert_eq!(ids(&list), vec!["t1", "t3"]);
        assert_eq!(list[0].sport.as_ref().unwrap().id, "1");

        let mut changed = Map::new();
        changed.insert("numberOfEvents".to_string(), json!(5));
        let same = ChangeRecord::update(EntityKind::Tournament, "t1", changed.clone());
        assert!(handler.on_update(&[EntityRecord::Change(same)]).is_none());

        let revived = ChangeRecord::update(EntityKind::Tournament, "t2", changed);
        let list = handler.on_update(&[EntityRecord::Change(revived)]).unwrap();
        assert_eq!(ids(&list), vec!["t1", "t2", "t3"]);
    }
}
