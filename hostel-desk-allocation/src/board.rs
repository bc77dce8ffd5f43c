//! What the desk shows for one hostel on one night: each room with its
//! occupants and free beds, and everyone still waiting for a room.

use std::collections::HashMap;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;

use crate::model::{
    Group, GroupId, HostelId, OccupantRef, OccupantSnapshot, Partner, PartnerId, Person, Room,
};
use crate::store::{AssignmentRecord, AssignmentStore};

/// Partners with their groups and persons, as loaded from the catalog.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    pub partners: Vec<Partner>,
    pub groups: Vec<Group>,
    pub persons: Vec<Person>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSlot {
    pub room: Room,
    pub occupancy: i32,
    pub remaining_capacity: i32,
    pub assignments: Vec<AssignmentRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub hostel_id: HostelId,
    pub date: NaiveDate,
    pub rooms: Vec<RoomSlot>,
    /// Always [`OccupantSnapshot::Group`].
    pub unassigned_groups: Vec<OccupantSnapshot>,
    pub unassigned_individuals: Vec<Person>,
}

#[must_use]
pub fn build_board(
    hostel_id: HostelId,
    date: NaiveDate,
    rooms: Vec<Room>,
    roster: Roster,
    store: &AssignmentStore,
) -> Board {
    let rooms = rooms
        .into_iter()
        .filter(|room| room.hostel_id == hostel_id)
        .sorted_by_key(|room| room.id)
        .map(|room| {
            let occupancy = store.room_occupancy(room.id, date);
            RoomSlot {
                remaining_capacity: room.capacity.saturating_sub(occupancy),
                occupancy,
                assignments: store.in_room(room.id, date).cloned().collect(),
                room,
            }
        })
        .collect();

    let staying: Vec<PartnerId> = roster
        .partners
        .iter()
        .filter(|partner| partner.stays_on(date))
        .map(|partner| partner.id)
        .collect();

    let (grouped, individuals): (Vec<Person>, Vec<Person>) = roster
        .persons
        .into_iter()
        .filter(|person| staying.contains(&person.partner_id))
        .partition(|person| person.group_id.is_some());
    let mut members: HashMap<Option<GroupId>, Vec<Person>> =
        grouped.into_iter().into_group_map_by(|person| person.group_id);

    let unassigned_groups = roster
        .groups
        .into_iter()
        .filter(|group| staying.contains(&group.partner_id))
        .filter(|group| !store.is_assigned(OccupantRef::Group(group.id), date))
        .sorted_by_key(|group| group.id)
        .map(|group| OccupantSnapshot::Group {
            members: members.remove(&Some(group.id)).unwrap_or_default(),
            group,
        })
        .collect();

    let unassigned_individuals = individuals
        .into_iter()
        .filter(|person| !store.is_assigned(OccupantRef::Individual(person.id), date))
        .sorted_by_key(|person| person.id)
        .collect();

    Board {
        hostel_id,
        date,
        rooms,
        unassigned_groups,
        unassigned_individuals,
    }
}
