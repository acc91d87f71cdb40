//! # Odds Feed
//!
//! A normalized, observable cache over a topic-addressed odds feed.
//!
//! ## Core Concepts
//!
//! - **Records**: Flat wire rows and change records, decoded per row
//! - **Store**: One keyed collection per entity kind, with per-id observation
//! - **Builders**: Read-time joins from flat rows to hierarchical values
//! - **Managers**: One upstream topic each, owning their store scopes
//! - **Pagination**: Growing-window list topics on one output stream
//!
//! ## Example
//!
//! ```ignore
//! use oddsfeed::{Feed, FeedConfig, InMemoryTransport, SubscribableContent};
//! use std::sync::Arc;
//!
//! let transport = Arc::new(InMemoryTransport::new());
//! let feed = Feed::new(FeedConfig::default(), transport)?;
//!
//! // Page through live football
//! let matches = feed.live_matches("1");
//! let stream = matches.subscribe();
//! for item in stream.iter() {
//!     if let Ok(SubscribableContent::ContentUpdate(list)) = item {
//!         println!("{} matches", list.matches.len());
//!     }
//! }
//!
//! // Ask for more once the first page is in
//! let has_more = matches.load_next_page().wait()?;
//! ```

pub mod builders;
pub mod config;
pub mod entities;
pub mod error;
pub mod feed;
pub mod managers;
pub mod model;
pub mod pagination;
pub mod records;
pub mod router;
pub mod store;
pub mod subscriptions;
pub mod transport;
pub mod types;

// Re-exports
pub use builders::{materialize_match, HierarchicalBuilder};
pub use config::{FeedConfig, PaginationConfig, StoreConfig};
pub use entities::{Entity, EntityData};
pub use error::{FeedError, Result};
pub use feed::Feed;
pub use managers::{
    ChangePolicy, LocationsManager, MatchDetailsManager, MatchListKind, MatchListManager,
    SingleOutcomeManager, SportsManager, SportsScope, TournamentsManager, TournamentsScope,
    UpdateRule,
};
pub use model::*;
pub use pagination::{PageRequest, PagedTopic, PaginationController};
pub use records::{AggregatorResponse, ChangeRecord, EntityRecord, MessageType};
pub use router::{Topic, TopicRequest, TopicRouter};
pub use store::{EntityStore, EntityWatch, EventInfoWatch, StoreReader};
pub use subscriptions::{
    ContentItem, ContentStream, ManagerState, SubscribableContent, SubscriptionManager,
    TopicHandler,
};
pub use transport::{FeedFrame, FeedLink, FeedTransport, InMemoryTransport, TransportEvent};
pub use types::*;
