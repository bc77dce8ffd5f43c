#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use hostel_desk_allocation::model::{
    Assignment, AssignmentId, Group, GroupId, HostelId, NewAssignment, OccupantRef,
    OccupantSnapshot, Partner, PartnerId, Person, PersonId, Room, RoomId,
};
use hostel_desk_allocation::AssignmentBackend;
use tokio::sync::Notify;

#[derive(thiserror::Error, Debug)]
#[error("backing store unavailable")]
pub struct Unavailable;

/// Lets a test hold a create request while it looks at the store.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
struct Tables {
    rooms: Vec<Room>,
    partners: Vec<Partner>,
    groups: Vec<Group>,
    persons: Vec<Person>,
    assignments: Vec<(AssignmentId, NewAssignment)>,
    next_id: i32,
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    writes_fail: AtomicBool,
    reads_fail: AtomicBool,
    creates: AtomicUsize,
    gate: Option<Gate>,
}

impl MemoryBackend {
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn fail_writes(&self, fail: bool) {
        self.writes_fail.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.reads_fail.store(fail, Ordering::SeqCst);
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn add_room(&self, room: Room) {
        self.tables.lock().unwrap().rooms.push(room);
    }

    pub fn add_partner(&self, partner: Partner) {
        self.tables.lock().unwrap().partners.push(partner);
    }

    pub fn add_group(&self, group: Group) {
        self.tables.lock().unwrap().groups.push(group);
    }

    pub fn add_person(&self, person: Person) {
        self.tables.lock().unwrap().persons.push(person);
    }

    /// Inserts a row directly, as another operator would.
    pub fn insert(&self, assignment: NewAssignment) -> AssignmentId {
        let mut tables = self.tables.lock().unwrap();
        tables.next_id += 1;
        let id = AssignmentId(tables.next_id);
        tables.assignments.push((id, assignment));
        id
    }

    /// Deletes the group the way the database does: its assignments go with
    /// it and its members become individuals.
    pub fn delete_group(&self, id: GroupId) {
        let mut tables = self.tables.lock().unwrap();
        tables.groups.retain(|group| group.id != id);
        tables
            .assignments
            .retain(|(_, row)| row.occupant != OccupantRef::Group(id));
        for person in &mut tables.persons {
            if person.group_id == Some(id) {
                person.group_id = None;
            }
        }
    }

    pub fn stored(&self) -> Vec<(AssignmentId, NewAssignment)> {
        self.tables.lock().unwrap().assignments.clone()
    }

    fn check(&self, flag: &AtomicBool) -> Result<(), Unavailable> {
        if flag.load(Ordering::SeqCst) {
            Err(Unavailable)
        } else {
            Ok(())
        }
    }
}

impl Tables {
    fn snapshot(&self, occupant: OccupantRef) -> Option<OccupantSnapshot> {
        match occupant {
            OccupantRef::Group(id) => {
                let group = self.groups.iter().find(|group| group.id == id)?.clone();
                let members = self
                    .persons
                    .iter()
                    .filter(|person| person.group_id == Some(id))
                    .cloned()
                    .collect();
                Some(OccupantSnapshot::Group { group, members })
            }
            OccupantRef::Individual(id) => {
                let person = self.persons.iter().find(|person| person.id == id)?.clone();
                Some(OccupantSnapshot::Individual { person })
            }
        }
    }

    fn assignment(&self, id: AssignmentId, row: &NewAssignment) -> Option<Assignment> {
        Some(Assignment {
            id,
            room_id: row.room_id,
            date: row.date,
            occupant: self.snapshot(row.occupant)?,
        })
    }
}

#[async_trait]
impl AssignmentBackend for MemoryBackend {
    type Error = Unavailable;

    async fn room(&self, id: RoomId) -> Result<Option<Room>, Unavailable> {
        self.check(&self.reads_fail)?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.rooms.iter().find(|room| room.id == id).cloned())
    }

    async fn partner(&self, id: PartnerId) -> Result<Option<Partner>, Unavailable> {
        self.check(&self.reads_fail)?;
        let tables = self.tables.lock().unwrap();
        Ok(tables.partners.iter().find(|partner| partner.id == id).cloned())
    }

    async fn occupant(
        &self,
        occupant: OccupantRef,
    ) -> Result<Option<OccupantSnapshot>, Unavailable> {
        self.check(&self.reads_fail)?;
        Ok(self.tables.lock().unwrap().snapshot(occupant))
    }

    async fn assignments_on(&self, date: NaiveDate) -> Result<Vec<Assignment>, Unavailable> {
        self.check(&self.reads_fail)?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .assignments
            .iter()
            .filter(|(_, row)| row.date == date)
            .filter_map(|(id, row)| tables.assignment(*id, row))
            .collect())
    }

    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment, Unavailable> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.check(&self.writes_fail)?;
        let id = self.insert(assignment);
        let tables = self.tables.lock().unwrap();
        tables.assignment(id, &assignment).ok_or(Unavailable)
    }

    async fn assignment_date(&self, id: AssignmentId) -> Result<Option<NaiveDate>, Unavailable> {
        self.check(&self.reads_fail)?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .assignments
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, row)| row.date))
    }

    async fn delete_assignment(&self, id: AssignmentId) -> Result<bool, Unavailable> {
        self.check(&self.writes_fail)?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.assignments.len();
        tables.assignments.retain(|(existing, _)| *existing != id);
        Ok(tables.assignments.len() != before)
    }
}

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

pub const ROOM: RoomId = RoomId(1);
pub const SEATED_INDIVIDUAL: PersonId = PersonId(1);
pub const WAITING_INDIVIDUAL: PersonId = PersonId(2);
pub const SEATED_GROUP: GroupId = GroupId(1);
pub const WAITING_GROUP: GroupId = GroupId(2);
pub const LATE_INDIVIDUAL: PersonId = PersonId(3);

fn person(id: i32, partner: i32, group: Option<GroupId>) -> Person {
    Person {
        id: PersonId(id),
        name: format!("Guest {id}"),
        partner_id: PartnerId(partner),
        group_id: group,
        backpack: false,
    }
}

/// A room of four already holding one individual and a group of two, with
/// another group of two and another individual waiting. The partner of
/// `LATE_INDIVIDUAL` only arrives the day after.
pub fn nearly_full_room(backend: MemoryBackend) -> MemoryBackend {
    backend.add_room(Room {
        id: ROOM,
        hostel_id: HostelId(1),
        name: "Four bed dorm".to_owned(),
        capacity: 4,
    });
    backend.add_partner(Partner {
        id: PartnerId(1),
        name: "Hiking club".to_owned(),
        size: 12,
        start_date: NaiveDate::from_ymd_opt(2024, 4, 29).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
    });
    backend.add_partner(Partner {
        id: PartnerId(2),
        name: "Late arrivals".to_owned(),
        size: 2,
        start_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
    });
    for (group, size) in [(SEATED_GROUP, 2), (WAITING_GROUP, 2)] {
        backend.add_group(Group {
            id: group,
            partner_id: PartnerId(1),
            size,
        });
    }
    backend.add_person(person(SEATED_INDIVIDUAL.0, 1, None));
    backend.add_person(person(WAITING_INDIVIDUAL.0, 1, None));
    backend.add_person(person(LATE_INDIVIDUAL.0, 2, None));
    backend.add_person(person(10, 1, Some(SEATED_GROUP)));
    backend.add_person(person(11, 1, Some(SEATED_GROUP)));
    backend.add_person(person(20, 1, Some(WAITING_GROUP)));
    backend.add_person(person(21, 1, Some(WAITING_GROUP)));

    backend.insert(NewAssignment {
        room_id: ROOM,
        date: date(),
        occupant: OccupantRef::Individual(SEATED_INDIVIDUAL),
    });
    backend.insert(NewAssignment {
        room_id: ROOM,
        date: date(),
        occupant: OccupantRef::Group(SEATED_GROUP),
    });
    backend
}
