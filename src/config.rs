//! Feed configuration.

use crate::error::{FeedError, Result};
use serde::Deserialize;

/// Store configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Max buffered values per observer. A lagging observer drops its oldest
    /// value to make room.
    /// Default: 64
    pub observer_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { observer_buffer: 64 }
    }
}

/// Paging limits for list subscriptions.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationConfig {
    /// Items requested by the first page.
    /// Default: 10
    pub initial_items: usize,

    /// Growth of the requested count per page.
    /// Default: 10
    pub page_step: usize,

    /// Hard cap on the requested count.
    /// Default: 100
    pub max_items: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            initial_items: 10,
            page_step: 10,
            max_items: 100,
        }
    }
}

/// Top-level configuration shared by every manager.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedConfig {
    /// Operator the feed is scoped to.
    pub operator_id: String,

    /// Language code for translated names.
    pub language: String,

    /// Main markets requested per match in list topics.
    /// Default: 5
    pub markets_per_match: usize,

    pub store: StoreConfig,

    pub pagination: PaginationConfig,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            operator_id: "4093".to_string(),
            language: "en".to_string(),
            markets_per_match: 5,
            store: StoreConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl FeedConfig {
    /// Parse from JSON, filling missing fields with defaults, then validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FeedConfig =
            serde_json::from_str(json).map_err(|e| FeedError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.operator_id.is_empty() {
            return Err(FeedError::InvalidConfig("operator id is empty".to_string()));
        }
        if self.language.is_empty() {
            return Err(FeedError::InvalidConfig("language is empty".to_string()));
        }
        if self.store.observer_buffer == 0 {
            return Err(FeedError::InvalidConfig(
                "observer buffer must be at least 1".to_string(),
            ));
        }

        let paging = &self.pagination;
        if paging.page_step == 0 {
            return Err(FeedError::InvalidConfig("page step must be at least 1".to_string()));
        }
        if paging.initial_items == 0 || paging.initial_items > paging.max_items {
            return Err(FeedError::InvalidConfig(format!(
                "initial items {} must be in 1..={}",
                paging.initial_items, paging.max_items
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FeedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pagination.page_step, 10);
        assert_eq!(config.pagination.max_items, 100);
    }

    #[test]
    fn test_from_json_partial() {
        let config = FeedConfig::from_json(
            r#"{"operatorId": "77", "language": "pt", "pagination": {"pageStep": 5}}"#,
        )
        .unwrap();
        assert_eq!(config.operator_id, "77");
        assert_eq!(config.language, "pt");
        assert_eq!(config.pagination.page_step, 5);
        assert_eq!(config.pagination.initial_items, 10);
        assert_eq!(config.store.observer_buffer, 64);
    }

    #[test]
    fn test_invalid_config() {
        let err = FeedConfig::from_json(r#"{"pagination": {"initialItems": 500}}"#).unwrap_err();
        assert!(matches!(err, FeedError::InvalidConfig(_)));

        let err = FeedConfig::from_json(r#"{"store": {"observerBuffer": 0}}"#).unwrap_err();
        assert!(matches!(err, FeedError::InvalidConfig(_)));

        assert!(FeedConfig::from_json("[1, 2]").is_err());
    }
}
