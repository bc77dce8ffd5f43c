//! The one place assignments live on this side of the backing store.
//!
//! Every view the desk needs (a date, a room, whether an occupant is placed) is
//! derived from the records kept here, so an optimistic record and its
//! rollback are single writes.

use alloc::collections::{BTreeMap, VecDeque};
use alloc::sync::Arc;
use core::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use tokio::sync::RwLock;

use crate::capacity;
use crate::model::{Assignment, AssignmentId, OccupantRef, OccupantSnapshot, RoomId};

pub type SharedStore = Arc<RwLock<AssignmentStore>>;

/// Id of a record that has not been confirmed yet. Derived from what was
/// dropped where, so the same drop always gets the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId {
    occupant: OccupantRef,
    room_id: RoomId,
    date: NaiveDate,
}

impl TempId {
    #[must_use]
    pub const fn new(occupant: OccupantRef, room_id: RoomId, date: NaiveDate) -> Self {
        Self {
            occupant,
            room_id,
            date,
        }
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "temp-{}-{}-room-{}-{}",
            self.occupant.kind(),
            self.occupant.raw_id(),
            self.room_id,
            self.date
        )
    }
}

impl Serialize for TempId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "id", rename_all = "lowercase")]
pub enum RecordId {
    #[serde(rename = "pending")]
    Temporary(TempId),
    Confirmed(AssignmentId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub id: RecordId,
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub occupant: OccupantSnapshot,
}

impl AssignmentRecord {
    #[must_use]
    pub const fn temporary(temp_id: TempId, occupant: OccupantSnapshot) -> Self {
        Self {
            id: RecordId::Temporary(temp_id),
            room_id: temp_id.room_id,
            date: temp_id.date,
            occupant,
        }
    }

    #[must_use]
    pub const fn is_temporary(&self) -> bool {
        matches!(self.id, RecordId::Temporary(_))
    }

    #[must_use]
    pub const fn reference(&self) -> OccupantRef {
        self.occupant.reference()
    }
}

impl From<Assignment> for AssignmentRecord {
    fn from(assignment: Assignment) -> Self {
        Self {
            id: RecordId::Confirmed(assignment.id),
            room_id: assignment.room_id,
            date: assignment.date,
            occupant: assignment.occupant,
        }
    }
}

/// Where the store stood for a date when a read of the backing store began.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark {
    date: NaiveDate,
    generation: u64,
}

#[derive(Clone, Debug)]
enum Change {
    Confirmed(AssignmentRecord),
    Removed(AssignmentId),
}

/// Confirmations and removals kept per date for fetches still in flight.
const CHANGE_LOG_LIMIT: usize = 256;

#[derive(Debug, Default)]
struct Night {
    loaded: bool,
    records: Vec<AssignmentRecord>,
    changes: VecDeque<(u64, Change)>,
    /// Fetches marked before this miss changes that fell off the log.
    log_horizon: u64,
    /// Lookups and fetches marked before this may describe deleted or
    /// changed catalog records.
    forgotten_at: u64,
}

impl Night {
    fn upsert(&mut self, record: AssignmentRecord) {
        if let Some(existing) = self.records.iter_mut().find(|existing| existing.id == record.id) {
            *existing = record;
        } else {
            self.records.push(record);
        }
    }

    fn remove(&mut self, id: RecordId) -> Option<AssignmentRecord> {
        let position = self.records.iter().position(|record| record.id == id)?;
        Some(self.records.remove(position))
    }

    fn apply(&mut self, change: Change) {
        match change {
            Change::Confirmed(record) => self.upsert(record),
            Change::Removed(id) => {
                self.remove(RecordId::Confirmed(id));
            }
        }
    }

    fn log(&mut self, generation: u64, change: Change) {
        if self.changes.len() == CHANGE_LOG_LIMIT {
            if let Some((dropped, _)) = self.changes.pop_front() {
                self.log_horizon = dropped;
            }
        }
        self.changes.push_back((generation, change));
    }

    fn forget(&mut self, generation: u64) {
        self.loaded = false;
        self.records.retain(AssignmentRecord::is_temporary);
        self.changes.clear();
        self.forgotten_at = generation;
    }
}

#[derive(Debug, Default)]
pub struct AssignmentStore {
    nights: BTreeMap<NaiveDate, Night>,
    generation: u64,
}

impl AssignmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// Whether the confirmed records of `date` have been fetched and not
    /// forgotten since.
    #[must_use]
    pub fn is_loaded(&self, date: NaiveDate) -> bool {
        self.nights.get(&date).is_some_and(|night| night.loaded)
    }

    pub fn on(&self, date: NaiveDate) -> impl Iterator<Item = &AssignmentRecord> {
        self.nights
            .get(&date)
            .into_iter()
            .flat_map(|night| night.records.iter())
    }

    pub fn in_room(&self, room_id: RoomId, date: NaiveDate) -> impl Iterator<Item = &AssignmentRecord> {
        self.on(date).filter(move |record| record.room_id == room_id)
    }

    #[must_use]
    pub fn room_occupancy(&self, room_id: RoomId, date: NaiveDate) -> i32 {
        capacity::room_occupancy(room_id, self.on(date))
    }

    #[must_use]
    pub fn record_for(&self, occupant: OccupantRef, date: NaiveDate) -> Option<&AssignmentRecord> {
        self.on(date).find(|record| record.reference() == occupant)
    }

    #[must_use]
    pub fn is_assigned(&self, occupant: OccupantRef, date: NaiveDate) -> bool {
        self.record_for(occupant, date).is_some()
    }

    /// Taken before reading anything from the backing store that ends up in
    /// this store or in a check against it.
    #[must_use]
    pub const fn mark(&self, date: NaiveDate) -> Mark {
        Mark {
            date,
            generation: self.generation,
        }
    }

    /// Whether `date` was forgotten after `mark` was taken.
    #[must_use]
    pub fn forgotten_since(&self, mark: Mark) -> bool {
        self.nights
            .get(&mark.date)
            .is_some_and(|night| mark.generation < night.forgotten_at)
    }

    fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Replaces the confirmed records of the marked date with a fetch that
    /// began at `mark`. Pending records stay, their confirmation is still on
    /// its way. Confirmations and removals that happened while the fetch ran
    /// are applied on top.
    ///
    /// Returns `false` and keeps the date as it is when the fetch may be
    /// stale: the date was forgotten meanwhile, or changes the fetch missed
    /// are no longer logged.
    pub fn replace_date(&mut self, mark: Mark, assignments: impl IntoIterator<Item = Assignment>) -> bool {
        let night = self.nights.entry(mark.date).or_default();
        if mark.generation < night.forgotten_at.max(night.log_horizon) {
            return false;
        }
        night.records.retain(AssignmentRecord::is_temporary);
        night.records.extend(
            assignments
                .into_iter()
                .filter(|assignment| assignment.date == mark.date)
                .map(AssignmentRecord::from),
        );
        let missed: Vec<Change> = night
            .changes
            .iter()
            .filter(|(generation, _)| *generation > mark.generation)
            .map(|(_, change)| change.clone())
            .collect();
        for change in missed {
            night.apply(change);
        }
        night.loaded = true;
        true
    }

    /// Drops the confirmed records of `date`, so that the next read fetches
    /// them again. Pending records stay.
    pub fn forget(&mut self, date: NaiveDate) {
        let generation = self.bump();
        self.nights.entry(date).or_default().forget(generation);
    }

    pub fn forget_all(&mut self) {
        let generation = self.bump();
        for night in self.nights.values_mut() {
            night.forget(generation);
        }
    }

    pub fn insert_temporary(&mut self, temp_id: TempId, occupant: OccupantSnapshot) {
        self.nights
            .entry(temp_id.date)
            .or_default()
            .records
            .push(AssignmentRecord::temporary(temp_id, occupant));
    }

    /// Swaps the pending record for the confirmed one. A refetch may have
    /// brought the confirmed record in already, it is never stored twice.
    pub fn confirm(&mut self, temp_id: &TempId, assignment: Assignment) {
        self.discard(temp_id);
        let generation = self.bump();
        let record = AssignmentRecord::from(assignment);
        let night = self.nights.entry(record.date).or_default();
        night.upsert(record.clone());
        night.log(generation, Change::Confirmed(record));
    }

    pub fn discard(&mut self, temp_id: &TempId) -> Option<AssignmentRecord> {
        self.nights
            .get_mut(&temp_id.date)?
            .remove(RecordId::Temporary(*temp_id))
    }

    pub fn take_confirmed(&mut self, assignment_id: AssignmentId) -> Option<AssignmentRecord> {
        let id = RecordId::Confirmed(assignment_id);
        let date = self
            .nights
            .iter()
            .find(|(_, night)| night.records.iter().any(|record| record.id == id))
            .map(|(date, _)| *date)?;
        let generation = self.bump();
        let night = self.nights.get_mut(&date)?;
        night.log(generation, Change::Removed(assignment_id));
        night.remove(id)
    }

    /// Settles a removal once the backing store has no row for it anymore.
    /// A fetch that began before that may have brought the record back.
    pub fn finish_removal(&mut self, record: &AssignmentRecord) {
        let RecordId::Confirmed(id) = record.id else {
            return;
        };
        let generation = self.bump();
        let night = self.nights.entry(record.date).or_default();
        night.remove(record.id);
        night.log(generation, Change::Removed(id));
    }

    pub fn restore(&mut self, record: AssignmentRecord) {
        let generation = self.bump();
        let night = self.nights.entry(record.date).or_default();
        night.upsert(record.clone());
        if !record.is_temporary() {
            night.log(generation, Change::Confirmed(record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PartnerId, Person, PersonId};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn individual(id: i32) -> OccupantSnapshot {
        OccupantSnapshot::Individual {
            person: Person {
                id: PersonId(id),
                name: format!("Guest {id}"),
                partner_id: PartnerId(1),
                group_id: None,
                backpack: true,
            },
        }
    }

    fn load(store: &mut AssignmentStore, assignments: impl IntoIterator<Item = Assignment>) {
        let mark = store.mark(date());
        assert!(store.replace_date(mark, assignments));
    }

    fn assignment(id: i32, person: i32) -> Assignment {
        Assignment {
            id: AssignmentId(id),
            room_id: RoomId(1),
            date: date(),
            occupant: individual(person),
        }
    }

    #[test]
    fn temp_id_is_deterministic() {
        let occupant = OccupantRef::Individual(PersonId(4));
        let first = TempId::new(occupant, RoomId(2), date());
        let second = TempId::new(occupant, RoomId(2), date());

        assert_eq!(first, second);
        assert_eq!(first.to_string(), "temp-individual-4-room-2-2024-05-01");
    }

    #[test]
    fn confirming_leaves_exactly_one_record() {
        let mut store = AssignmentStore::new();
        load(&mut store, []);
        let occupant = OccupantRef::Individual(PersonId(4));
        let temp_id = TempId::new(occupant, RoomId(1), date());

        store.insert_temporary(temp_id, individual(4));
        assert!(store.record_for(occupant, date()).unwrap().is_temporary());

        store.confirm(&temp_id, assignment(17, 4));

        let records: Vec<_> = store.on(date()).filter(|r| r.reference() == occupant).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, RecordId::Confirmed(AssignmentId(17)));
    }

    #[test]
    fn confirmation_after_refetch_is_not_duplicated() {
        let mut store = AssignmentStore::new();
        let occupant = OccupantRef::Individual(PersonId(4));
        let temp_id = TempId::new(occupant, RoomId(1), date());
        store.insert_temporary(temp_id, individual(4));

        load(&mut store, [assignment(17, 4)]);
        store.confirm(&temp_id, assignment(17, 4));

        assert_eq!(store.on(date()).count(), 1);
    }

    #[test]
    fn refetch_keeps_pending_records() {
        let mut store = AssignmentStore::new();
        load(&mut store, [assignment(1, 1), assignment(2, 2)]);
        let temp_id = TempId::new(OccupantRef::Individual(PersonId(3)), RoomId(1), date());
        store.insert_temporary(temp_id, individual(3));

        load(&mut store, [assignment(2, 2)]);

        assert!(!store.is_assigned(OccupantRef::Individual(PersonId(1)), date()));
        assert!(store.is_assigned(OccupantRef::Individual(PersonId(2)), date()));
        assert!(store.is_assigned(OccupantRef::Individual(PersonId(3)), date()));
        assert_eq!(store.room_occupancy(RoomId(1), date()), 2);
    }

    #[test]
    fn discard_reverts_the_assigned_flag() {
        let mut store = AssignmentStore::new();
        let occupant = OccupantRef::Individual(PersonId(4));
        let temp_id = TempId::new(occupant, RoomId(1), date());
        store.insert_temporary(temp_id, individual(4));

        assert!(store.discard(&temp_id).is_some());
        assert!(!store.is_assigned(occupant, date()));
        assert!(store.discard(&temp_id).is_none());
    }

    #[test]
    fn take_and_restore() {
        let mut store = AssignmentStore::new();
        load(&mut store, [assignment(9, 1)]);

        let record = store.take_confirmed(AssignmentId(9)).unwrap();
        assert_eq!(store.room_occupancy(RoomId(1), date()), 0);
        assert!(store.take_confirmed(AssignmentId(9)).is_none());

        store.restore(record.clone());
        store.restore(record);
        assert_eq!(store.in_room(RoomId(1), date()).count(), 1);
    }

    #[test]
    fn forgetting_keeps_pending_records_only() {
        let mut store = AssignmentStore::new();
        load(&mut store, [assignment(1, 1)]);
        let temp_id = TempId::new(OccupantRef::Individual(PersonId(3)), RoomId(1), date());
        store.insert_temporary(temp_id, individual(3));

        store.forget_all();

        assert!(!store.is_loaded(date()));
        assert!(!store.is_assigned(OccupantRef::Individual(PersonId(1)), date()));
        assert!(store.is_assigned(OccupantRef::Individual(PersonId(3)), date()));
    }

    #[test]
    fn fetch_started_before_forgetting_is_refused() {
        let mut store = AssignmentStore::new();
        load(&mut store, [assignment(1, 1)]);
        let mark = store.mark(date());

        store.forget(date());

        assert!(store.forgotten_since(mark));
        assert!(!store.replace_date(mark, [assignment(1, 1)]));
        assert!(!store.is_loaded(date()));
        load(&mut store, []);
        assert!(store.is_loaded(date()));
        assert_eq!(store.on(date()).count(), 0);
    }

    #[test]
    fn confirmation_during_a_fetch_survives_it() {
        let mut store = AssignmentStore::new();
        load(&mut store, [assignment(1, 1)]);
        let occupant = OccupantRef::Individual(PersonId(4));
        let temp_id = TempId::new(occupant, RoomId(1), date());
        store.insert_temporary(temp_id, individual(4));
        let mark = store.mark(date());

        store.confirm(&temp_id, assignment(17, 4));
        assert!(store.replace_date(mark, [assignment(1, 1)]));

        assert_eq!(
            store.record_for(occupant, date()).unwrap().id,
            RecordId::Confirmed(AssignmentId(17))
        );
        assert_eq!(store.room_occupancy(RoomId(1), date()), 2);
    }

    #[test]
    fn removal_during_a_fetch_is_not_undone() {
        let mut store = AssignmentStore::new();
        load(&mut store, [assignment(1, 1), assignment(2, 2)]);
        let mark = store.mark(date());

        let record = store.take_confirmed(AssignmentId(2)).unwrap();
        store.finish_removal(&record);
        assert!(store.replace_date(mark, [assignment(1, 1), assignment(2, 2)]));

        assert!(!store.is_assigned(OccupantRef::Individual(PersonId(2)), date()));
        assert_eq!(store.room_occupancy(RoomId(1), date()), 1);
    }

    #[test]
    fn settled_removal_drops_a_record_a_fetch_brought_back() {
        let mut store = AssignmentStore::new();
        load(&mut store, [assignment(2, 2)]);
        let record = store.take_confirmed(AssignmentId(2)).unwrap();
        // the fetch read the row before the backing store deleted it
        load(&mut store, [assignment(2, 2)]);
        assert!(store.is_assigned(OccupantRef::Individual(PersonId(2)), date()));

        store.finish_removal(&record);

        assert!(!store.is_assigned(OccupantRef::Individual(PersonId(2)), date()));
    }

    #[test]
    fn fetch_older_than_the_change_log_is_refused() {
        let mut store = AssignmentStore::new();
        load(&mut store, []);
        let mark = store.mark(date());
        for id in 0..=CHANGE_LOG_LIMIT {
            let id = i32::try_from(id).unwrap();
            store.restore(assignment(id, id).into());
        }

        assert!(!store.replace_date(mark, []));
        assert_eq!(store.on(date()).count(), CHANGE_LOG_LIMIT + 1);
    }

    #[test]
    fn unloaded_dates_are_empty() {
        let store = AssignmentStore::new();
        assert!(!store.is_loaded(date()));
        assert_eq!(store.on(date()).count(), 0);
    }

    #[test]
    fn pending_records_serialize_with_their_temp_id() {
        let temp_id = TempId::new(OccupantRef::Individual(PersonId(4)), RoomId(1), date());
        let value = serde_json::to_value(RecordId::Temporary(temp_id)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"status": "pending", "id": "temp-individual-4-room-1-2024-05-01"})
        );
    }
}
