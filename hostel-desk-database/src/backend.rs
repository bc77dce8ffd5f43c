use async_trait::async_trait;
use chrono::NaiveDate;
use hostel_desk_allocation::model::{
    Assignment, AssignmentId, NewAssignment, OccupantRef, OccupantSnapshot, Partner, PartnerId,
    Room, RoomId,
};
use hostel_desk_allocation::AssignmentBackend;

use crate::error::DatabaseError;
use crate::repository::{assignments, partners, rooms};
use crate::Pool;

/// Serves the reconciler from Postgres, checking out one pooled connection
/// per call.
#[derive(Clone)]
pub struct PgAssignmentBackend {
    pool: Pool,
}

impl PgAssignmentBackend {
    #[must_use]
    pub const fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentBackend for PgAssignmentBackend {
    type Error = DatabaseError;

    async fn room(&self, id: RoomId) -> Result<Option<Room>, DatabaseError> {
        let mut connection = self.pool.get().await?;
        rooms::get(&mut connection, id).await
    }

    async fn partner(&self, id: PartnerId) -> Result<Option<Partner>, DatabaseError> {
        let mut connection = self.pool.get().await?;
        partners::get(&mut connection, id).await
    }

    async fn occupant(
        &self,
        occupant: OccupantRef,
    ) -> Result<Option<OccupantSnapshot>, DatabaseError> {
        let mut connection = self.pool.get().await?;
        assignments::snapshot(&mut connection, occupant).await
    }

    async fn assignments_on(&self, date: NaiveDate) -> Result<Vec<Assignment>, DatabaseError> {
        let mut connection = self.pool.get().await?;
        assignments::list_on(&mut connection, date).await
    }

    async fn create_assignment(
        &self,
        assignment: NewAssignment,
    ) -> Result<Assignment, DatabaseError> {
        let mut connection = self.pool.get().await?;
        assignments::create(&mut connection, assignment).await
    }

    async fn assignment_date(&self, id: AssignmentId) -> Result<Option<NaiveDate>, DatabaseError> {
        let mut connection = self.pool.get().await?;
        assignments::date_of(&mut connection, id).await
    }

    async fn delete_assignment(&self, id: AssignmentId) -> Result<bool, DatabaseError> {
        let mut connection = self.pool.get().await?;
        assignments::delete(&mut connection, id).await
    }
}
