use chrono::NaiveDate;
use serde::Serialize;

use crate::capacity::CapacityCheck;
use crate::model::{AssignmentId, OccupantRef, PartnerId, RoomId};

/// Why a drop was refused before anything was sent to the backing store.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(
    tag = "reason",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Rejection {
    #[error("room {room_id} does not exist")]
    UnknownRoom { room_id: RoomId },
    #[error("{occupant} does not exist")]
    UnknownOccupant { occupant: OccupantRef },
    #[error("partner {partner_id} of {occupant} does not exist")]
    UnknownPartner {
        occupant: OccupantRef,
        partner_id: PartnerId,
    },
    #[error("{occupant} does not stay on {date}, the stay is {start_date} to {end_date}")]
    OutsideStay {
        occupant: OccupantRef,
        date: NaiveDate,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    #[error("{occupant} is already assigned to room {room_id} on {date}")]
    AlreadyAssigned {
        occupant: OccupantRef,
        room_id: RoomId,
        date: NaiveDate,
    },
    #[error(
        "room {room_id} has {} beds left but {occupant} needs {}",
        .check.remaining_capacity,
        .check.requested_space
    )]
    CapacityExceeded {
        occupant: OccupantRef,
        room_id: RoomId,
        check: CapacityCheck,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum DropError<E> {
    #[error("drop rejected: {0}")]
    Rejected(#[from] Rejection),
    #[error("backing store failed, assignment rolled back: {0}")]
    Backend(#[source] E),
}

#[derive(thiserror::Error, Debug)]
pub enum UnassignError<E> {
    #[error("assignment {id} is not on the board")]
    UnknownAssignment { id: AssignmentId },
    #[error("backing store failed, assignment restored: {0}")]
    Backend(#[source] E),
}
