//! Room allocation for the hostel front desk.
//!
//! Dropping a group or an individual onto a room goes through the
//! [`Reconciler`]: it checks the drop against the [`AssignmentStore`] with
//! [`check_capacity`], applies a pending record right away, and then either
//! confirms it with what the [`AssignmentBackend`] returned or takes it back.

extern crate alloc;

pub mod backend;
pub mod board;
pub mod capacity;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;

pub use backend::AssignmentBackend;
pub use board::{build_board, Board, Roster, RoomSlot};
pub use capacity::{check_capacity, room_occupancy, CapacityCheck, Occupancy};
pub use error::{DropError, Rejection, UnassignError};
pub use reconcile::{validate_drop, DropState, Reconciler};
pub use store::{AssignmentRecord, AssignmentStore, Mark, RecordId, SharedStore, TempId};
