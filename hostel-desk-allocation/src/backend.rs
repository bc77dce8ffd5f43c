use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{
    Assignment, AssignmentId, NewAssignment, OccupantRef, OccupantSnapshot, Partner, PartnerId,
    Room, RoomId,
};

/// The backing store as the reconciler sees it: a few lookups, the
/// assignments of a date, and create/delete.
#[async_trait]
pub trait AssignmentBackend: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn room(&self, id: RoomId) -> Result<Option<Room>, Self::Error>;

    async fn partner(&self, id: PartnerId) -> Result<Option<Partner>, Self::Error>;

    async fn occupant(
        &self,
        occupant: OccupantRef,
    ) -> Result<Option<OccupantSnapshot>, Self::Error>;

    async fn assignments_on(&self, date: NaiveDate) -> Result<Vec<Assignment>, Self::Error>;

    async fn create_assignment(&self, assignment: NewAssignment)
        -> Result<Assignment, Self::Error>;

    /// The date of the stored row, `None` when there is no such row.
    async fn assignment_date(&self, id: AssignmentId) -> Result<Option<NaiveDate>, Self::Error>;

    /// Returns whether a row was actually deleted.
    async fn delete_assignment(&self, id: AssignmentId) -> Result<bool, Self::Error>;
}
