//! Read-time joins from flat rows to hierarchical values.
//!
//! Builders are pure functions of the store's contents at call time. Nothing
//! is cached. A missing root yields `None`; missing children are left out of
//! their parent's collection, so a partially streamed graph still builds.

mod catalog;
mod live_data;
mod matches;
mod odds;

pub use catalog::{EventCategoryBuilder, LocationBuilder, SportBuilder, TournamentBuilder};
pub use live_data::EventLiveDataBuilder;
pub use matches::{MarketGroupBuilder, MatchBuilder};
pub use odds::{BettingOfferBuilder, MainMarketBuilder, MarketBuilder, OutcomeBuilder};

use crate::entities::MatchDto;
use crate::model::Match;
use crate::records::EntityRecord;
use crate::store::EntityStore;

/// Assembles one hierarchical value from a root id.
pub trait HierarchicalBuilder {
    type Output;

    /// Build the value rooted at `id`, or `None` if the root row is absent.
    fn build(store: &EntityStore, id: &str) -> Option<Self::Output>;
}

/// Build a match from a standalone batch.
///
/// The rows go into a throwaway store. With `expected_id` the match with that
/// id is built; otherwise the first match in the batch.
pub fn materialize_match(records: &[EntityRecord], expected_id: Option<&str>) -> Option<Match> {
    let store = EntityStore::new();
    store.store_records(records);

    let id = match expected_id {
        Some(id) => id.to_string(),
        None => store.get_all_in_order::<MatchDto>().into_iter().next()?.id,
    };
    MatchBuilder::build(&store, &id)
}
