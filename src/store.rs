//! In-memory normalized entity store.
//!
//! One keyed collection per [`EntityKind`], with first-insertion order kept
//! per kind. The store is written by exactly one owner (the link worker of a
//! manager) and read by anyone holding a [`StoreReader`].
//!
//! Observation is per id: an observer gets the current value immediately and
//! then a fresh value on every write touching that id (`None` once deleted).
//! Delivery never blocks the writer. A lagging observer keeps the newest
//! values: when its buffer is full the oldest queued value is dropped, so the
//! last value it reads is always the current one. An observer is detached only
//! once its watch is dropped.

use crate::builders::{EventLiveDataBuilder, HierarchicalBuilder, OutcomeBuilder};
use crate::config::StoreConfig;
use crate::entities::{BettingOfferDto, Entity, EntityData, EventInfoDto, MatchDto};
use crate::model::{EventLiveData, Outcome};
use crate::records::{ChangeRecord, EntityRecord};
use crate::types::EntityKind;
use crossbeam_channel::{
    bounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError, TrySendError,
};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// One kind's rows.
#[derive(Default)]
struct Table {
    rows: HashMap<String, EntityData>,
    /// Ids in first-insertion order. A deleted id keeps its slot.
    order: Vec<String>,
    seen: HashSet<String>,
}

impl Table {
    fn upsert(&mut self, id: &str, data: EntityData) -> Option<EntityData> {
        if self.seen.insert(id.to_string()) {
            self.order.push(id.to_string());
        }
        self.rows.insert(id.to_string(), data)
    }

    fn in_order(&self) -> impl Iterator<Item = &EntityData> {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }
}

/// Store side of one watch.
struct Observer<V> {
    sender: Sender<V>,
    /// Clone of the watch's receiver, used to drop the oldest value.
    drain: Receiver<V>,
    alive: Weak<()>,
}

impl<V> Observer<V> {
    fn open(buffer: usize) -> (Self, Receiver<V>, Arc<()>) {
        let (sender, receiver) = bounded(buffer.max(1));
        let token = Arc::new(());
        let observer = Self {
            sender,
            drain: receiver.clone(),
            alive: Arc::downgrade(&token),
        };
        (observer, receiver, token)
    }

    fn is_alive(&self) -> bool {
        self.alive.strong_count() > 0
    }

    /// Queue `value`, dropping the oldest queued value if the buffer is full.
    /// Returns false once the watch is gone.
    fn deliver(&self, mut value: V) -> bool {
        if !self.is_alive() {
            return false;
        }
        loop {
            match self.sender.try_send(value) {
                Ok(()) => return true,
                Err(TrySendError::Full(rejected)) => {
                    trace!("observer lagging, dropping oldest value");
                    let _ = self.drain.try_recv();
                    value = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

type EntityObservers = HashMap<EntityKind, HashMap<String, Vec<Observer<Option<EntityData>>>>>;

#[derive(Default)]
struct StoreInner {
    tables: HashMap<EntityKind, Table>,
    observers: EntityObservers,
    /// Collection watchers keyed by event (match) id.
    event_info_watchers: HashMap<String, Vec<Observer<Vec<EventInfoDto>>>>,
}

impl StoreInner {
    fn row(&self, kind: EntityKind, id: &str) -> Option<&EntityData> {
        self.tables.get(&kind).and_then(|t| t.rows.get(id))
    }

    fn upsert(&mut self, data: EntityData) -> bool {
        let (Some(kind), Some(id)) = (data.kind(), data.id().map(str::to_owned)) else {
            return false;
        };
        let previous = self.tables.entry(kind).or_default().upsert(&id, data);
        self.after_write(kind, &id, previous);
        true
    }

    /// Push the new state of `(kind, id)` to its observers.
    fn after_write(&mut self, kind: EntityKind, id: &str, previous: Option<EntityData>) {
        self.notify(kind, id);

        if kind != EntityKind::EventInfo {
            return;
        }
        let previous_event = previous.as_ref().and_then(event_id_of);
        let current_event = self.row(kind, id).and_then(event_id_of);
        if let Some(event_id) = &previous_event {
            self.notify_event_infos(event_id);
        }
        if let Some(event_id) = current_event {
            if previous_event.as_ref() != Some(&event_id) {
                self.notify_event_infos(&event_id);
            }
        }
    }

    fn notify(&mut self, kind: EntityKind, id: &str) {
        let Some(by_id) = self.observers.get_mut(&kind) else {
            return;
        };
        let Some(observers) = by_id.get_mut(id) else {
            return;
        };
        let current = self.tables.get(&kind).and_then(|t| t.rows.get(id)).cloned();
        observers.retain(|observer| observer.deliver(current.clone()));
        if observers.is_empty() {
            by_id.remove(id);
        }
    }

    fn event_infos(&self, event_id: &str) -> Vec<EventInfoDto> {
        self.tables
            .get(&EntityKind::EventInfo)
            .map(|table| {
                table
                    .in_order()
                    .filter_map(EventInfoDto::from_data)
                    .filter(|info| info.event_id == event_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify_event_infos(&mut self, event_id: &str) {
        if !self.event_info_watchers.contains_key(event_id) {
            return;
        }
        let current = self.event_infos(event_id);
        if let Some(observers) = self.event_info_watchers.get_mut(event_id) {
            observers.retain(|observer| observer.deliver(current.clone()));
            if observers.is_empty() {
                self.event_info_watchers.remove(event_id);
            }
        }
    }
}

fn event_id_of(data: &EntityData) -> Option<String> {
    EventInfoDto::from_data(data).map(|info| info.event_id.clone())
}

/// A normalized cache for one scope.
pub struct EntityStore {
    inner: RwLock<StoreInner>,
    config: StoreConfig,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            config,
        }
    }

    // --- Writes ---

    /// Upsert a typed row.
    pub(crate) fn store<T: Entity>(&self, row: T) {
        self.store_data(row.into_data());
    }

    /// Upsert a row. Unknown rows are dropped and return false.
    pub(crate) fn store_data(&self, data: EntityData) -> bool {
        if data.is_unknown() {
            return false;
        }
        self.inner.write().upsert(data)
    }

    /// Apply a batch: entity rows are upserts, change records are applied
    /// as create / update / delete. Returns how many rows took effect.
    pub(crate) fn store_records(&self, records: &[EntityRecord]) -> usize {
        records
            .iter()
            .filter(|record| match record {
                EntityRecord::Entity(data) => self.store_data(data.clone()),
                EntityRecord::Change(change) => self.apply_change(change),
            })
            .count()
    }

    /// Apply one change record. Returns whether the store changed.
    pub(crate) fn apply_change(&self, change: &ChangeRecord) -> bool {
        match change {
            ChangeRecord::Create { entity, .. } => self.store_data(entity.clone()),
            ChangeRecord::Update {
                kind,
                id,
                changed_properties,
            } => self.update_entity(*kind, id, changed_properties),
            ChangeRecord::Delete { kind, id } => self.delete_entity(*kind, id),
        }
    }

    /// Merge `changed` into an existing row.
    ///
    /// A missing row is a no-op. Field names the row type doesn't have are
    /// ignored. If the merged row no longer decodes, the row is left as it was.
    pub(crate) fn update_entity(
        &self,
        kind: EntityKind,
        id: &str,
        changed: &Map<String, Value>,
    ) -> bool {
        let mut inner = self.inner.write();

        let Some(existing) = inner.row(kind, id) else {
            trace!(kind = %kind, id = %id, "update for absent row ignored");
            return false;
        };
        let mut value = match existing.to_value() {
            Ok(value) => value,
            Err(e) => {
                warn!(kind = %kind, id = %id, error = %e, "failed to encode row for update");
                return false;
            }
        };

        if let Value::Object(fields) = &mut value {
            for (name, field) in changed {
                if name == "id" || name == "_type" {
                    continue;
                }
                fields.insert(name.clone(), field.clone());
            }
        }

        let merged = match EntityData::from_value(kind, &value) {
            Ok(merged) => merged,
            Err(e) => {
                warn!(kind = %kind, id = %id, error = %e, "update rejected, row unchanged");
                return false;
            }
        };

        let previous = inner.tables.entry(kind).or_default().upsert(id, merged);
        inner.after_write(kind, id, previous);
        true
    }

    /// Remove a row. Observers of that id receive `None`. Nothing cascades.
    pub(crate) fn delete_entity(&self, kind: EntityKind, id: &str) -> bool {
        let mut inner = self.inner.write();
        let previous = inner.tables.get_mut(&kind).and_then(|t| t.rows.remove(id));
        if previous.is_none() {
            return false;
        }
        inner.after_write(kind, id, previous);
        true
    }

    /// Drop every row and close every observation stream.
    pub(crate) fn clear(&self) {
        let mut inner = self.inner.write();
        let observers: usize = inner.observers.values().flat_map(|m| m.values()).map(Vec::len).sum();
        // Dropping the observers drops every sender, which ends the streams.
        *inner = StoreInner::default();
        debug!(observers, "store cleared");
    }

    // --- Reads ---

    pub fn get<T: Entity>(&self, id: &str) -> Option<T> {
        self.inner.read().row(T::KIND, id).and_then(T::from_data).cloned()
    }

    pub fn get_data(&self, kind: EntityKind, id: &str) -> Option<EntityData> {
        self.inner.read().row(kind, id).cloned()
    }

    /// Every row of `T`'s kind, in no particular order.
    pub fn get_all<T: Entity>(&self) -> Vec<T> {
        self.inner
            .read()
            .tables
            .get(&T::KIND)
            .map(|t| t.rows.values().filter_map(T::from_data).cloned().collect())
            .unwrap_or_default()
    }

    /// Every row of `T`'s kind, in first-insertion order.
    pub fn get_all_in_order<T: Entity>(&self) -> Vec<T> {
        self.inner
            .read()
            .tables
            .get(&T::KIND)
            .map(|t| t.in_order().filter_map(T::from_data).cloned().collect())
            .unwrap_or_default()
    }

    /// Ids of present rows of `kind`, in first-insertion order.
    pub fn ids_in_order(&self, kind: EntityKind) -> Vec<String> {
        self.inner
            .read()
            .tables
            .get(&kind)
            .map(|t| t.order.iter().filter(|id| t.rows.contains_key(*id)).cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.inner.read().row(kind, id).is_some()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.inner.read().tables.get(&kind).map_or(0, |t| t.rows.len())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().tables.values().all(|t| t.rows.is_empty())
    }

    /// EventInfo rows for one match, in first-insertion order.
    pub fn event_infos(&self, event_id: &str) -> Vec<EventInfoDto> {
        self.inner.read().event_infos(event_id)
    }

    // --- Observation ---

    /// Watch one row. Emits the current value (possibly `None`) right away.
    pub fn observe<T: Entity>(&self, id: &str) -> EntityWatch<T> {
        let (receiver, token) = self.register_observer(T::KIND, id);
        EntityWatch::new(receiver, token, |data| {
            data.as_ref().and_then(T::from_data).cloned()
        })
    }

    /// Watch one row without picking a type.
    pub fn observe_data(&self, kind: EntityKind, id: &str) -> EntityWatch<EntityData> {
        let (receiver, token) = self.register_observer(kind, id);
        EntityWatch::new(receiver, token, |data| data)
    }

    /// Watch the EventInfo rows of one match. Emits the current rows right
    /// away and again on every EventInfo write for that match.
    pub fn observe_event_infos(&self, event_id: &str) -> EventInfoWatch {
        let (observer, receiver, token) = Observer::open(self.config.observer_buffer);
        let mut inner = self.inner.write();
        let current = inner.event_infos(event_id);
        if observer.deliver(current) {
            let observers = inner.event_info_watchers.entry(event_id.to_string()).or_default();
            observers.retain(Observer::is_alive);
            observers.push(observer);
        }
        EventInfoWatch::new(receiver, token, |infos| infos)
    }

    /// Number of live per-id observers and collection watchers.
    pub fn observer_count(&self) -> usize {
        let inner = self.inner.read();
        let by_id = inner
            .observers
            .values()
            .flat_map(|m| m.values())
            .flatten()
            .filter(|o| o.is_alive())
            .count();
        let by_event = inner
            .event_info_watchers
            .values()
            .flatten()
            .filter(|o| o.is_alive())
            .count();
        by_id + by_event
    }

    fn register_observer(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> (Receiver<Option<EntityData>>, Arc<()>) {
        let (observer, receiver, token) = Observer::open(self.config.observer_buffer);
        let mut inner = self.inner.write();
        let current = inner.row(kind, id).cloned();
        if observer.deliver(current) {
            let observers = inner
                .observers
                .entry(kind)
                .or_default()
                .entry(id.to_string())
                .or_default();
            observers.retain(Observer::is_alive);
            observers.push(observer);
        }
        (receiver, token)
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A stream of values for one observed row.
///
/// A lagging reader may skip intermediate values but always reads the latest
/// one. Ends (receive errors with disconnected) when the store is cleared.
/// Dropping the watch detaches it on the next write to its row.
pub struct EntityWatch<T> {
    receiver: Receiver<Option<EntityData>>,
    map: Arc<dyn Fn(Option<EntityData>) -> Option<T> + Send + Sync>,
    _alive: Arc<()>,
}

impl<T: 'static> EntityWatch<T> {
    fn new<F>(receiver: Receiver<Option<EntityData>>, alive: Arc<()>, map: F) -> Self
    where
        F: Fn(Option<EntityData>) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            receiver,
            map: Arc::new(map),
            _alive: alive,
        }
    }

    /// Receive the next value (blocking).
    pub fn recv(&self) -> Result<Option<T>, RecvError> {
        self.receiver.recv().map(|v| (self.map)(v))
    }

    /// Try to receive a value (non-blocking).
    pub fn try_recv(&self) -> Result<Option<T>, TryRecvError> {
        self.receiver.try_recv().map(|v| (self.map)(v))
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout).map(|v| (self.map)(v))
    }

    /// Transform every value as it is received.
    pub fn map<U, F>(self, f: F) -> EntityWatch<U>
    where
        U: 'static,
        F: Fn(Option<T>) -> Option<U> + Send + Sync + 'static,
    {
        let inner = self.map;
        EntityWatch::new(self.receiver, self._alive, move |data| f(inner(data)))
    }
}

/// A stream of the EventInfo rows of one match.
pub struct EventInfoWatch<T = Vec<EventInfoDto>> {
    receiver: Receiver<Vec<EventInfoDto>>,
    map: Arc<dyn Fn(Vec<EventInfoDto>) -> T + Send + Sync>,
    _alive: Arc<()>,
}

impl<T: 'static> EventInfoWatch<T> {
    fn new<F>(receiver: Receiver<Vec<EventInfoDto>>, alive: Arc<()>, map: F) -> Self
    where
        F: Fn(Vec<EventInfoDto>) -> T + Send + Sync + 'static,
    {
        Self {
            receiver,
            map: Arc::new(map),
            _alive: alive,
        }
    }

    pub fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv().map(|v| (self.map)(v))
    }

    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv().map(|v| (self.map)(v))
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout).map(|v| (self.map)(v))
    }

    pub fn map<U, F>(self, f: F) -> EventInfoWatch<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let inner = self.map;
        EventInfoWatch::new(self.receiver, self._alive, move |infos| f(inner(infos)))
    }
}

/// Read-only view of a store owned by a manager.
#[derive(Clone)]
pub struct StoreReader {
    store: Arc<EntityStore>,
}

impl StoreReader {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    pub fn get<T: Entity>(&self, id: &str) -> Option<T> {
        self.store.get(id)
    }

    pub fn get_data(&self, kind: EntityKind, id: &str) -> Option<EntityData> {
        self.store.get_data(kind, id)
    }

    pub fn get_all<T: Entity>(&self) -> Vec<T> {
        self.store.get_all()
    }

    pub fn get_all_in_order<T: Entity>(&self) -> Vec<T> {
        self.store.get_all_in_order()
    }

    pub fn contains(&self, kind: EntityKind, id: &str) -> bool {
        self.store.contains(kind, id)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.store.count(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn event_infos(&self, event_id: &str) -> Vec<EventInfoDto> {
        self.store.event_infos(event_id)
    }

    pub fn observe<T: Entity>(&self, id: &str) -> EntityWatch<T> {
        self.store.observe(id)
    }

    pub fn observe_event_infos(&self, event_id: &str) -> EventInfoWatch {
        self.store.observe_event_infos(event_id)
    }

    /// Run a builder against the current contents.
    pub fn build<B: HierarchicalBuilder>(&self, id: &str) -> Option<B::Output> {
        B::build(&self.store, id)
    }

    // --- Built observation ---

    /// Watch the `T` row `id` and rebuild `B` from it on every change.
    ///
    /// Only writes to the root row trigger a value; child rows do not.
    pub fn observe_built<T, B>(&self, id: &str) -> EntityWatch<B::Output>
    where
        T: Entity,
        B: HierarchicalBuilder + 'static,
        B::Output: 'static,
    {
        let store = self.store.clone();
        let root = id.to_string();
        self.store
            .observe::<T>(id)
            .map(move |row| row.and_then(|_| B::build(&store, &root)))
    }

    /// Watch a betting offer and emit the outcome it belongs to.
    ///
    /// Odds changes land on offers, so this is how a caller follows the
    /// price of a single selection.
    pub fn observe_offer_as_outcome(&self, betting_offer_id: &str) -> EntityWatch<Outcome> {
        let store = self.store.clone();
        self.store
            .observe::<BettingOfferDto>(betting_offer_id)
            .map(move |offer| offer.and_then(|o| OutcomeBuilder::build(&store, &o.outcome_id)))
    }

    /// Watch the live data of one match.
    pub fn observe_live_data(&self, match_id: &str) -> EventInfoWatch<EventLiveData> {
        let store = self.store.clone();
        let match_id = match_id.to_string();
        self.store.observe_event_infos(&match_id).map(move |infos| {
            let row = store.get::<MatchDto>(&match_id);
            EventLiveDataBuilder::from_infos(&match_id, &infos, row.as_ref())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BettingOfferDto, MatchDto, SportDto};
    use serde_json::json;

    fn sport(id: &str, name: &str) -> SportDto {
        SportDto {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn offer(id: &str, odds: f64) -> BettingOfferDto {
        BettingOfferDto {
            id: id.to_string(),
            outcome_id: "o1".to_string(),
            odds,
            ..Default::default()
        }
    }

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn info(id: &str, event_id: &str, type_id: &str) -> EventInfoDto {
        EventInfoDto {
            id: id.to_string(),
            event_id: event_id.to_string(),
            type_id: type_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_upsert_keeps_one_row_and_first_position() {
        let store = EntityStore::new();
        store.store(sport("1", "Football"));
        store.store(sport("2", "Tennis"));
        store.store(sport("1", "Soccer"));

        assert_eq!(store.count(EntityKind::Sport), 2);
        let sports = store.get_all_in_order::<SportDto>();
        assert_eq!(sports[0].id, "1");
        assert_eq!(sports[0].name, "Soccer");
        assert_eq!(sports[1].id, "2");
    }

    #[test]
    fn test_update_merges_fields() {
        let store = EntityStore::new();
        store.store(offer("bo1", 1.5));

        let applied = store.update_entity(
            EntityKind::BettingOffer,
            "bo1",
            &fields(json!({"odds": 2.25, "someNewField": true})),
        );
        assert!(applied);

        let updated = store.get::<BettingOfferDto>("bo1").unwrap();
        assert_eq!(updated.odds, 2.25);
        assert_eq!(updated.outcome_id, "o1");
    }

    #[test]
    fn test_update_absent_row_is_noop() {
        let store = EntityStore::new();
        let applied =
            store.update_entity(EntityKind::BettingOffer, "missing", &fields(json!({"odds": 3.0})));
        assert!(!applied);
        assert!(store.get::<BettingOfferDto>("missing").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_type_mismatch_leaves_row() {
        let store = EntityStore::new();
        store.store(offer("bo1", 1.5));

        let applied =
            store.update_entity(EntityKind::BettingOffer, "bo1", &fields(json!({"odds": "x"})));
        assert!(!applied);
        assert_eq!(store.get::<BettingOfferDto>("bo1").unwrap().odds, 1.5);
    }

    #[test]
    fn test_update_cannot_change_id() {
        let store = EntityStore::new();
        store.store(offer("bo1", 1.5));
        store.update_entity(EntityKind::BettingOffer, "bo1", &fields(json!({"id": "bo2"})));

        assert!(store.contains(EntityKind::BettingOffer, "bo1"));
        assert!(!store.contains(EntityKind::BettingOffer, "bo2"));
    }

    #[test]
    fn test_delete_and_recreate_keeps_slot() {
        let store = EntityStore::new();
        store.store(sport("1", "Football"));
        store.store(sport("2", "Tennis"));

        assert!(store.delete_entity(EntityKind::Sport, "1"));
        assert!(!store.delete_entity(EntityKind::Sport, "1"));
        assert_eq!(store.ids_in_order(EntityKind::Sport), vec!["2"]);

        store.store(sport("1", "Football"));
        assert_eq!(store.ids_in_order(EntityKind::Sport), vec!["1", "2"]);
    }

    #[test]
    fn test_observe_emits_current_then_changes() {
        let store = EntityStore::new();
        let watch = store.observe::<BettingOfferDto>("bo1");
        assert_eq!(watch.try_recv().unwrap(), None);

        store.store(offer("bo1", 1.5));
        let value = watch.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(value.unwrap().odds, 1.5);

        store.update_entity(EntityKind::BettingOffer, "bo1", &fields(json!({"odds": 1.7})));
        let value = watch.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(value.unwrap().odds, 1.7);
    }

    #[test]
    fn test_delete_is_visible_to_observers() {
        let store = EntityStore::new();
        store.store(offer("bo1", 1.5));
        let watch = store.observe::<BettingOfferDto>("bo1");
        assert!(watch.try_recv().unwrap().is_some());

        store.delete_entity(EntityKind::BettingOffer, "bo1");
        assert_eq!(watch.recv_timeout(Duration::from_millis(100)).unwrap(), None);
    }

    #[test]
    fn test_observers_of_other_ids_stay_quiet() {
        let store = EntityStore::new();
        let watch = store.observe::<BettingOfferDto>("bo1");
        watch.try_recv().unwrap();

        store.store(offer("bo2", 1.5));
        assert!(watch.try_recv().is_err());
    }

    #[test]
    fn test_clear_ends_streams() {
        let store = EntityStore::new();
        store.store(offer("bo1", 1.5));
        let watch = store.observe::<BettingOfferDto>("bo1");
        watch.try_recv().unwrap();

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.observer_count(), 0);
        assert!(matches!(watch.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[test]
    fn test_lagging_observer_keeps_latest() {
        let store = EntityStore::with_config(StoreConfig { observer_buffer: 2 });
        let watch = store.observe::<BettingOfferDto>("bo1");
        assert_eq!(store.observer_count(), 1);

        for i in 0..5 {
            store.store(offer("bo1", 1.0 + i as f64));
        }
        assert_eq!(store.observer_count(), 1);

        let odds: Vec<f64> = std::iter::from_fn(|| watch.try_recv().ok())
            .map(|row| row.unwrap().odds)
            .collect();
        assert_eq!(odds, vec![4.0, 5.0]);
    }

    #[test]
    fn test_lagging_observer_sees_delete() {
        let store = EntityStore::with_config(StoreConfig { observer_buffer: 2 });
        store.store(offer("bo1", 1.4));
        let watch = store.observe::<BettingOfferDto>("bo1");

        store.update_entity(EntityKind::BettingOffer, "bo1", &fields(json!({"odds": 1.5})));
        store.update_entity(EntityKind::BettingOffer, "bo1", &fields(json!({"odds": 1.6})));
        store.delete_entity(EntityKind::BettingOffer, "bo1");
        assert_eq!(store.observer_count(), 1);

        let values: Vec<Option<BettingOfferDto>> =
            std::iter::from_fn(|| watch.try_recv().ok()).collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].as_ref().unwrap().odds, 1.6);
        assert!(values[1].is_none());

        // Still attached: a re-create reaches it.
        store.store(offer("bo1", 2.0));
        let value = watch.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(value.unwrap().odds, 2.0);
    }

    #[test]
    fn test_lagging_event_info_watch_keeps_latest() {
        let store = EntityStore::with_config(StoreConfig { observer_buffer: 1 });
        let watch = store.observe_event_infos("m1");

        store.store(info("i1", "m1", "1"));
        store.store(info("i2", "m1", "95"));
        store.delete_entity(EntityKind::EventInfo, "i1");

        let latest = watch.try_recv().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, "i2");
        assert!(watch.try_recv().is_err());
        assert_eq!(store.observer_count(), 1);
    }

    #[test]
    fn test_dropped_observer_is_detached() {
        let store = EntityStore::new();
        let mapped = store.observe::<BettingOfferDto>("bo1").map(|o| o.map(|o| o.odds));
        drop(store.observe::<BettingOfferDto>("bo1"));
        assert_eq!(store.observer_count(), 1);

        store.store(offer("bo1", 1.5));
        assert_eq!(store.observer_count(), 1);
        assert_eq!(mapped.try_recv().unwrap(), None);
        assert_eq!(mapped.try_recv().unwrap(), Some(1.5));

        drop(mapped);
        assert_eq!(store.observer_count(), 0);
        store.store(offer("bo1", 1.6));
        let inner = store.inner.read();
        assert!(inner.observers[&EntityKind::BettingOffer].is_empty());
    }

    #[test]
    fn test_observe_event_infos() {
        let store = EntityStore::new();
        store.store(info("i1", "m1", "1"));
        store.store(info("i2", "m2", "1"));

        let watch = store.observe_event_infos("m1");
        let initial = watch.try_recv().unwrap();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].id, "i1");

        store.store(info("i3", "m1", "95"));
        let next = watch.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(next.len(), 2);

        store.store(info("i4", "m2", "95"));
        assert!(watch.try_recv().is_err());

        store.delete_entity(EntityKind::EventInfo, "i1");
        let next = watch.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id, "i3");
    }

    #[test]
    fn test_store_records_applies_changes() {
        let store = EntityStore::new();
        let records = vec![
            EntityRecord::entity(offer("bo1", 1.5)),
            EntityRecord::Change(ChangeRecord::update(
                EntityKind::BettingOffer,
                "bo1",
                fields(json!({"odds": 1.9})),
            )),
            EntityRecord::Change(ChangeRecord::update(
                EntityKind::BettingOffer,
                "ghost",
                fields(json!({"odds": 1.9})),
            )),
            EntityRecord::Entity(EntityData::Unknown(json!({"_type": "BANNER"}))),
        ];

        assert_eq!(store.store_records(&records), 2);
        assert_eq!(store.get::<BettingOfferDto>("bo1").unwrap().odds, 1.9);
        assert_eq!(store.count(EntityKind::BettingOffer), 1);
    }

    #[test]
    fn test_reader_sees_writes() {
        let store = Arc::new(EntityStore::new());
        let reader = StoreReader::new(store.clone());

        store.store(MatchDto {
            id: "m1".to_string(),
            ..Default::default()
        });
        assert!(reader.contains(EntityKind::Match, "m1"));
        assert_eq!(reader.get_all::<MatchDto>().len(), 1);
    }

    #[test]
    fn test_offer_observed_as_outcome() {
        use crate::builders::fixtures::{offer, outcome};

        let store = Arc::new(EntityStore::new());
        let reader = StoreReader::new(store.clone());
        store.store(outcome("o1", "m1"));
        store.store(offer("bo1", "o1", 1.5));

        let watch = reader.observe_offer_as_outcome("bo1");
        let first = watch.recv_timeout(Duration::from_millis(100)).unwrap().unwrap();
        assert_eq!(first.odds(), Some(1.5));

        store.update_entity(EntityKind::BettingOffer, "bo1", &fields(json!({"odds": 2.0})));
        let second = watch.recv_timeout(Duration::from_millis(100)).unwrap().unwrap();
        assert_eq!(second.id, "o1");
        assert_eq!(second.odds(), Some(2.0));

        store.delete_entity(EntityKind::BettingOffer, "bo1");
        assert!(watch.recv_timeout(Duration::from_millis(100)).unwrap().is_none());
    }
}
