//! Entry point tying config, router and transport together.

use crate::config::FeedConfig;
use crate::error::Result;
use crate::managers::{
    LocationsHandler, LocationsManager, MatchDetailsManager, MatchListHandler, MatchListKind,
    MatchListManager, SingleOutcomeHandler, SingleOutcomeManager, SportsHandler, SportsManager,
    SportsScope, TournamentsHandler, TournamentsManager, TournamentsScope,
};
use crate::pagination::PaginationController;
use crate::router::TopicRouter;
use crate::subscriptions::SubscriptionManager;
use crate::transport::FeedTransport;
use std::sync::Arc;
use tracing::info;

/// Creates managers that share one transport and configuration.
///
/// Every manager owns its scopes; nothing is shared between them.
pub struct Feed {
    config: FeedConfig,
    router: TopicRouter,
    transport: Arc<dyn FeedTransport>,
}

impl Feed {
    /// Validate `config` and bind it to `transport`.
    pub fn new(config: FeedConfig, transport: Arc<dyn FeedTransport>) -> Result<Self> {
        config.validate()?;
        info!(
            operator_id = %config.operator_id,
            language = %config.language,
            "feed ready"
        );
        Ok(Self {
            router: TopicRouter::from_config(&config),
            config,
            transport,
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn router(&self) -> &TopicRouter {
        &self.router
    }

    pub fn sports(&self, scope: SportsScope) -> SportsManager {
        let handler = SportsHandler::new(&self.router, &self.config.store, scope);
        SubscriptionManager::new(handler, self.transport.clone())
    }

    pub fn locations(&self, sport_id: &str) -> LocationsManager {
        let handler = LocationsHandler::new(&self.router, &self.config.store, sport_id);
        SubscriptionManager::new(handler, self.transport.clone())
    }

    pub fn tournaments(&self, sport_id: &str, scope: TournamentsScope) -> TournamentsManager {
        let handler = TournamentsHandler::new(&self.router, &self.config.store, sport_id, scope);
        SubscriptionManager::new(handler, self.transport.clone())
    }

    pub fn live_matches(&self, sport_id: &str) -> MatchListManager {
        self.match_list(MatchListKind::Live, sport_id)
    }

    pub fn pre_live_matches(&self, sport_id: &str) -> MatchListManager {
        self.match_list(MatchListKind::PreLive, sport_id)
    }

    fn match_list(&self, kind: MatchListKind, sport_id: &str) -> MatchListManager {
        let handler = MatchListHandler::new(&self.router, &self.config.store, kind, sport_id);
        PaginationController::new(handler, self.transport.clone(), self.config.pagination.clone())
    }

    pub fn match_details(&self, match_id: &str) -> MatchDetailsManager {
        MatchDetailsManager::new(
            &self.router,
            &self.config.store,
            self.transport.clone(),
            match_id,
        )
    }

    pub fn single_outcome(&self, betting_offer_id: &str) -> SingleOutcomeManager {
        let handler = SingleOutcomeHandler::new(&self.router, &self.config.store, betting_offer_id);
        SubscriptionManager::new(handler, self.transport.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use crate::subscriptions::TopicHandler;
    use crate::transport::InMemoryTransport;

    #[test]
    fn test_rejects_invalid_config() {
        let config = FeedConfig {
            operator_id: String::new(),
            ..Default::default()
        };
        let result = Feed::new(config, Arc::new(InMemoryTransport::new()));
        assert!(matches!(result, Err(FeedError::InvalidConfig(_))));
    }

    #[test]
    fn test_managers_use_configured_router() {
        let config = FeedConfig {
            operator_id: "77".to_string(),
            language: "pt".to_string(),
            ..Default::default()
        };
        let feed = Feed::new(config, Arc::new(InMemoryTransport::new())).unwrap();

        let sports = feed.sports(SportsScope::All);
        let topic = sports.with_handler(|handler| handler.topic());
        assert_eq!(topic.path(), "/sports/77/pt/disciplines/BOTH/BOTH");

        let list = feed.live_matches("1");
        assert_eq!(list.requested_count(), 10);
    }
}
