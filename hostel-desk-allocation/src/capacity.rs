use serde::{Deserialize, Serialize};

use crate::model::{Assignment, OccupantSnapshot, Room, RoomId};
use crate::store::AssignmentRecord;

/// Anything that takes beds in a room.
pub trait Occupancy {
    fn room_id(&self) -> RoomId;
    fn occupant(&self) -> &OccupantSnapshot;
}

impl Occupancy for Assignment {
    fn room_id(&self) -> RoomId {
        self.room_id
    }

    fn occupant(&self) -> &OccupantSnapshot {
        &self.occupant
    }
}

impl Occupancy for AssignmentRecord {
    fn room_id(&self) -> RoomId {
        self.room_id
    }

    fn occupant(&self) -> &OccupantSnapshot {
        &self.occupant
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityCheck {
    pub has_capacity: bool,
    /// Negative when the room is already overbooked.
    pub remaining_capacity: i32,
    pub requested_space: i32,
    pub room_capacity: i32,
}

/// Beds taken in `room_id` by the given records. Records for other rooms are
/// ignored, so the whole list for a date can be passed.
pub fn room_occupancy<'a, T, I>(room_id: RoomId, records: I) -> i32
where
    T: Occupancy + 'a,
    I: IntoIterator<Item = &'a T>,
{
    records
        .into_iter()
        .filter(|record| record.room_id() == room_id)
        .map(|record| record.occupant().person_count())
        .fold(0_i32, i32::saturating_add)
}

/// Checks whether `dragged` fits into `room` next to `records`, which must be
/// the assignments of a single date.
///
/// Individuals always fit; only groups are held against the remaining beds.
pub fn check_capacity<'a, T, I>(room: &Room, dragged: &OccupantSnapshot, records: I) -> CapacityCheck
where
    T: Occupancy + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let occupied = room_occupancy(room.id, records);
    let remaining_capacity = room.capacity.saturating_sub(occupied);
    let requested_space = dragged.requested_space();
    let has_capacity = match dragged {
        OccupantSnapshot::Group { .. } => requested_space <= remaining_capacity,
        OccupantSnapshot::Individual { .. } => true,
    };

    CapacityCheck {
        has_capacity,
        remaining_capacity,
        requested_space,
        room_capacity: room.capacity,
    }
}
