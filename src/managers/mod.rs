//! Topic handlers for each feed family.
//!
//! Every handler owns its store scopes and a [`ChangePolicy`] saying which
//! rows and change records it accepts. The policies differ between topics on
//! purpose and are kept as explicit tables.

mod locations;
mod match_details;
mod match_list;
mod single_outcome;
mod sports;
mod tournaments;

pub use locations::{LocationsHandler, LocationsManager};
pub use match_details::{
    MarketGroupDetailsHandler, MarketGroupsHandler, MatchAggregatorHandler, MatchDetailsManager,
};
pub use match_list::{MatchListHandler, MatchListKind, MatchListManager};
pub use single_outcome::{SingleOutcomeHandler, SingleOutcomeManager};
pub use sports::{SportsHandler, SportsManager, SportsScope};
pub use tournaments::{TournamentsHandler, TournamentsManager, TournamentsScope};

use crate::records::{ChangeRecord, EntityRecord};
use crate::store::EntityStore;
use crate::types::EntityKind;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// What to do with an `UPDATE` change record of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateRule {
    Ignore,
    Apply,
    /// Apply only when the named field is among the changed properties.
    ApplyIfChanged(&'static str),
}

/// Per-kind acceptance table for one topic.
///
/// Entity rows and `CREATE` / `DELETE` records are applied when their kind is
/// accepted. `UPDATE` records follow the per-kind [`UpdateRule`]; kinds
/// without a rule are ignored.
#[derive(Clone, Debug)]
pub struct ChangePolicy {
    rows: HashSet<EntityKind>,
    updates: HashMap<EntityKind, UpdateRule>,
}

impl ChangePolicy {
    /// Accept `kinds` and apply updates to all of them.
    pub fn accept(kinds: &[EntityKind]) -> Self {
        Self {
            rows: kinds.iter().copied().collect(),
            updates: kinds.iter().map(|kind| (*kind, UpdateRule::Apply)).collect(),
        }
    }

    /// Accept every known kind and apply every update.
    pub fn accept_all() -> Self {
        Self::accept(&EntityKind::ALL)
    }

    /// Override the update rule for one kind.
    pub fn with_update(mut self, kind: EntityKind, rule: UpdateRule) -> Self {
        self.updates.insert(kind, rule);
        self
    }

    /// Match lists: every row is stored, but only odds changes on offers and
    /// market / match / event-info changes are applied.
    pub fn match_list() -> Self {
        let mut policy = Self::accept_all();
        policy.updates.clear();
        policy
            .with_update(EntityKind::BettingOffer, UpdateRule::ApplyIfChanged("odds"))
            .with_update(EntityKind::Market, UpdateRule::Apply)
            .with_update(EntityKind::Match, UpdateRule::Apply)
            .with_update(EntityKind::EventInfo, UpdateRule::Apply)
    }

    /// Match aggregator: the match and its surrounding catalog rows.
    pub fn match_aggregator() -> Self {
        Self::accept(&[
            EntityKind::Match,
            EntityKind::EventInfo,
            EntityKind::EventCategory,
            EntityKind::Tournament,
            EntityKind::Location,
            EntityKind::Sport,
            EntityKind::NextMatchesNumber,
        ])
        .with_update(EntityKind::NextMatchesNumber, UpdateRule::Ignore)
    }

    pub fn accepts(&self, kind: EntityKind) -> bool {
        self.rows.contains(&kind)
    }

    pub fn update_rule(&self, kind: EntityKind) -> UpdateRule {
        self.updates.get(&kind).copied().unwrap_or(UpdateRule::Ignore)
    }

    /// Whether `change` should reach the store.
    pub fn admits(&self, change: &ChangeRecord) -> bool {
        match change {
            ChangeRecord::Update { kind, .. } => match self.update_rule(*kind) {
                UpdateRule::Ignore => false,
                UpdateRule::Apply => true,
                UpdateRule::ApplyIfChanged(field) => change.touches_field(field),
            },
            ChangeRecord::Create { .. } | ChangeRecord::Delete { .. } => {
                self.accepts(change.kind())
            }
        }
    }

    /// Apply the admitted part of `records` to `store`. Returns how many
    /// records changed it.
    pub fn apply(&self, store: &EntityStore, records: &[EntityRecord]) -> usize {
        let mut applied = 0;
        for record in records {
            let changed = match record {
                EntityRecord::Entity(data) => match data.kind() {
                    Some(kind) if self.accepts(kind) => store.store_data(data.clone()),
                    _ => false,
                },
                EntityRecord::Change(change) if self.admits(change) => store.apply_change(change),
                EntityRecord::Change(change) => {
                    trace!(kind = %change.kind(), id = %change.id(), "change filtered by policy");
                    false
                }
            };
            if changed {
                applied += 1;
            }
        }
        applied
    }
}

/// Present ids of `kind`, for list membership comparison.
pub(crate) fn id_set(store: &EntityStore, kind: EntityKind) -> HashSet<String> {
    store.ids_in_order(kind).into_iter().collect()
}

/// Apply `records` and report whether the set of `kind` ids changed.
pub(crate) fn apply_tracking_membership(
    policy: &ChangePolicy,
    store: &EntityStore,
    kind: EntityKind,
    records: &[EntityRecord],
) -> bool {
    let before = id_set(store, kind);
    policy.apply(store, records);
    let after = id_set(store, kind);
    before != after
}
