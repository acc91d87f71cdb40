//! Topic construction.
//!
//! Managers describe what they want with a [`TopicRequest`]; the router turns
//! it into an opaque [`Topic`] scoped to an operator and language. Nothing in
//! the crate parses a topic back.

use crate::config::FeedConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque topic descriptor handed to the transport.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    path: String,
}

impl Topic {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Topic({})", self.path)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Structured description of a feed resource.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TopicRequest {
    /// All sports, live and pre-live.
    Sports,
    /// Sports with live events only.
    LiveSports,
    Locations { sport_id: String },
    Tournaments { sport_id: String },
    PopularTournaments { sport_id: String, count: usize },
    LiveMatches { sport_id: String, count: usize },
    PreLiveMatches { sport_id: String, count: usize },
    /// Match aggregator with its overview group.
    MatchDetails { match_id: String },
    MarketGroups { match_id: String },
    MarketGroupDetails { match_id: String, group_key: String },
    BettingOffer { betting_offer_id: String },
}

/// Builds topics for one operator and language.
#[derive(Clone, Debug)]
pub struct TopicRouter {
    operator_id: String,
    language: String,
    markets_per_match: usize,
}

impl TopicRouter {
    pub fn new(operator_id: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            language: language.into(),
            markets_per_match: 5,
        }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            operator_id: config.operator_id.clone(),
            language: config.language.clone(),
            markets_per_match: config.markets_per_match,
        }
    }

    pub fn with_markets_per_match(mut self, markets: usize) -> Self {
        self.markets_per_match = markets;
        self
    }

    pub fn topic(&self, request: &TopicRequest) -> Topic {
        let base = format!("/sports/{}/{}", self.operator_id, self.language);
        let markets = self.markets_per_match;

        let path = match request {
            TopicRequest::Sports => format!("{}/disciplines/BOTH/BOTH", base),
            TopicRequest::LiveSports => format!("{}/disciplines/LIVE/BOTH", base),
            TopicRequest::Locations { sport_id } => format!("{}/locations/{}", base, sport_id),
            TopicRequest::Tournaments { sport_id } => {
                format!("{}/tournaments/{}", base, sport_id)
            }
            TopicRequest::PopularTournaments { sport_id, count } => {
                format!("{}/popular-tournaments/{}/{}", base, sport_id, count)
            }
            TopicRequest::LiveMatches { sport_id, count } => format!(
                "{}/live-matches-aggregator-main/{}/all-locations/default-event-info/{}/{}",
                base, sport_id, count, markets
            ),
            TopicRequest::PreLiveMatches { sport_id, count } => format!(
                "{}/popular-matches-aggregator-main/{}/{}/{}",
                base, sport_id, count, markets
            ),
            TopicRequest::MatchDetails { match_id } => {
                format!("{}/match-aggregator-groups-overview/{}/1", base, match_id)
            }
            TopicRequest::MarketGroups { match_id } => {
                format!("{}/event/{}/market-groups", base, match_id)
            }
            TopicRequest::MarketGroupDetails {
                match_id,
                group_key,
            } => format!("{}/{}/match-odds/market-group/{}", base, match_id, group_key),
            TopicRequest::BettingOffer { betting_offer_id } => {
                format!("{}/bettingOffers/{}", base, betting_offer_id)
            }
        };
        Topic::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_paths() {
        let router = TopicRouter::new("4093", "en").with_markets_per_match(3);

        assert_eq!(
            router.topic(&TopicRequest::Sports).path(),
            "/sports/4093/en/disciplines/BOTH/BOTH"
        );
        assert_eq!(
            router
                .topic(&TopicRequest::LiveMatches {
                    sport_id: "1".to_string(),
                    count: 10
                })
                .path(),
            "/sports/4093/en/live-matches-aggregator-main/1/all-locations/default-event-info/10/3"
        );
        assert_eq!(
            router
                .topic(&TopicRequest::MarketGroupDetails {
                    match_id: "m1".to_string(),
                    group_key: "goals".to_string()
                })
                .path(),
            "/sports/4093/en/m1/match-odds/market-group/goals"
        );
    }

    #[test]
    fn test_count_changes_topic() {
        let router = TopicRouter::new("1", "pt");
        let page = |count| {
            router.topic(&TopicRequest::PreLiveMatches {
                sport_id: "1".to_string(),
                count,
            })
        };
        assert_ne!(page(10), page(20));
    }

    #[test]
    fn test_from_config() {
        let router = TopicRouter::from_config(&FeedConfig::default());
        assert_eq!(
            router.topic(&TopicRequest::BettingOffer {
                betting_offer_id: "bo1".to_string()
            }),
            Topic::new("/sports/4093/en/bettingOffers/bo1")
        );
    }
}
