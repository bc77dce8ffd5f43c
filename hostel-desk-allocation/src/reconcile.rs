use chrono::NaiveDate;
use tokio::sync::{RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, trace, warn};

use crate::backend::AssignmentBackend;
use crate::capacity::{check_capacity, CapacityCheck};
use crate::error::{DropError, Rejection, UnassignError};
use crate::model::{
    Assignment, AssignmentId, NewAssignment, OccupantRef, OccupantSnapshot, Partner, Room, RoomId,
};
use crate::store::{AssignmentStore, SharedStore, TempId};

/// Where a single drop is. `Committed` and `RolledBack` are terminal, a
/// rejected drop never leaves `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropState {
    Idle,
    Optimistic,
    Confirming,
    Committed,
    RolledBack,
}

impl DropState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }

    #[must_use]
    pub const fn allows(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Optimistic)
                | (Self::Optimistic, Self::Confirming)
                | (Self::Confirming, Self::Committed | Self::RolledBack)
        )
    }

    fn advance(&mut self, next: Self) {
        debug_assert!(self.allows(next), "{self:?} -> {next:?}");
        trace!(from = ?*self, to = ?next, "drop state");
        *self = next;
    }
}

/// Everything checked against the store before a drop is applied: the stay
/// of the partner, duplicates on that date, and the room's capacity.
pub fn validate_drop(
    store: &AssignmentStore,
    room: &Room,
    partner: &Partner,
    occupant: &OccupantSnapshot,
    date: NaiveDate,
) -> Result<CapacityCheck, Rejection> {
    let reference = occupant.reference();
    if !partner.stays_on(date) {
        return Err(Rejection::OutsideStay {
            occupant: reference,
            date,
            start_date: partner.start_date,
            end_date: partner.end_date,
        });
    }
    if let Some(existing) = store.record_for(reference, date) {
        return Err(Rejection::AlreadyAssigned {
            occupant: reference,
            room_id: existing.room_id,
            date,
        });
    }
    let check = check_capacity(room, occupant, store.on(date));
    if !check.has_capacity {
        return Err(Rejection::CapacityExceeded {
            occupant: reference,
            room_id: room.id,
            check,
        });
    }
    Ok(check)
}

/// Applies drops and removals to the injected store first and to the backing
/// store second, undoing the local change when the backing store fails.
pub struct Reconciler<B> {
    backend: B,
    store: SharedStore,
}

impl<B: AssignmentBackend> Reconciler<B> {
    pub const fn new(backend: B, store: SharedStore) -> Self {
        Self { backend, store }
    }

    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Refetches `date` and replaces what the store knows about it. A fetch
    /// that overlapped forgetting the date is repeated.
    #[instrument(skip(self))]
    pub async fn load(&self, date: NaiveDate) -> Result<(), B::Error> {
        loop {
            let mark = self.store.read().await.mark(date);
            let assignments = self.backend.assignments_on(date).await?;
            debug!(count = assignments.len(), "fetched assignments");
            if self.store.write().await.replace_date(mark, assignments) {
                return Ok(());
            }
            debug!("store changed under the fetch, fetching again");
        }
    }

    pub async fn ensure_loaded(&self, date: NaiveDate) -> Result<(), B::Error> {
        let loaded = self.store.read().await.is_loaded(date);
        if !loaded {
            self.load(date).await?;
        }
        Ok(())
    }

    /// The store, with `date` loaded.
    pub async fn loaded(
        &self,
        date: NaiveDate,
    ) -> Result<RwLockReadGuard<'_, AssignmentStore>, B::Error> {
        loop {
            self.ensure_loaded(date).await?;
            let store = self.store.read().await;
            if store.is_loaded(date) {
                return Ok(store);
            }
        }
    }

    async fn loaded_mut(
        &self,
        date: NaiveDate,
    ) -> Result<RwLockWriteGuard<'_, AssignmentStore>, B::Error> {
        loop {
            self.ensure_loaded(date).await?;
            let store = self.store.write().await;
            if store.is_loaded(date) {
                return Ok(store);
            }
        }
    }

    /// Makes every date fetch again on its next read. Called after catalog
    /// writes, which can delete assignments or change who is in a group.
    pub async fn forget_all(&self) {
        self.store.write().await.forget_all();
        debug!("forgot all loaded dates");
    }

    /// Runs the room's capacity check for `occupant` without applying
    /// anything.
    pub async fn preview(
        &self,
        occupant: OccupantRef,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<CapacityCheck, DropError<B::Error>> {
        let (room, snapshot) = self.lookup(occupant, room_id).await?;
        let store = self.loaded(date).await.map_err(DropError::Backend)?;
        Ok(check_capacity(&room, &snapshot, store.on(date)))
    }

    #[instrument(skip_all, fields(%occupant, %room_id, %date))]
    pub async fn drop_onto(
        &self,
        occupant: OccupantRef,
        room_id: RoomId,
        date: NaiveDate,
    ) -> Result<Assignment, DropError<B::Error>> {
        let mut state = DropState::Idle;

        let temp_id = loop {
            let mark = self.store.read().await.mark(date);
            let (room, snapshot) = self.lookup(occupant, room_id).await?;
            let partner_id = snapshot.partner_id();
            let partner = self
                .backend
                .partner(partner_id)
                .await
                .map_err(DropError::Backend)?
                .ok_or(Rejection::UnknownPartner {
                    occupant,
                    partner_id,
                })?;

            let mut store = self.loaded_mut(date).await.map_err(DropError::Backend)?;
            if store.forgotten_since(mark) {
                debug!("catalog changed during the lookup, looking up again");
                continue;
            }
            let check = validate_drop(&store, &room, &partner, &snapshot, date).map_err(
                |rejection| {
                    info!(%rejection, "drop rejected");
                    rejection
                },
            )?;
            debug!(remaining = check.remaining_capacity, "capacity ok");
            let temp_id = TempId::new(occupant, room_id, date);
            store.insert_temporary(temp_id, snapshot);
            state.advance(DropState::Optimistic);
            break temp_id;
        };

        state.advance(DropState::Confirming);
        let result = self
            .backend
            .create_assignment(NewAssignment {
                room_id,
                date,
                occupant,
            })
            .await;

        let mut store = self.store.write().await;
        match result {
            Ok(assignment) => {
                store.confirm(&temp_id, assignment.clone());
                state.advance(DropState::Committed);
                info!(assignment_id = %assignment.id, "assignment committed");
                Ok(assignment)
            }
            Err(error) => {
                store.discard(&temp_id);
                state.advance(DropState::RolledBack);
                warn!(%temp_id, %error, "assignment rolled back");
                Err(DropError::Backend(error))
            }
        }
    }

    /// Removes the assignment from the store first and from the backing
    /// store second. The date of a stored row is loaded beforehand, so a row
    /// the store has not seen yet can be removed too.
    #[instrument(skip_all, fields(%id))]
    pub async fn unassign(&self, id: AssignmentId) -> Result<(), UnassignError<B::Error>> {
        let date = self
            .backend
            .assignment_date(id)
            .await
            .map_err(UnassignError::Backend)?;
        let record = {
            let mut store = match date {
                Some(date) => self.loaded_mut(date).await.map_err(UnassignError::Backend)?,
                None => self.store.write().await,
            };
            store
                .take_confirmed(id)
                .ok_or(UnassignError::UnknownAssignment { id })?
        };

        match self.backend.delete_assignment(id).await {
            Ok(deleted) => {
                if deleted {
                    info!("assignment removed");
                } else {
                    warn!("assignment was already gone from the backing store");
                }
                self.store.write().await.finish_removal(&record);
                Ok(())
            }
            Err(error) => {
                warn!(%error, "removal failed, restoring assignment");
                self.store.write().await.restore(record);
                Err(UnassignError::Backend(error))
            }
        }
    }

    async fn lookup(
        &self,
        occupant: OccupantRef,
        room_id: RoomId,
    ) -> Result<(Room, OccupantSnapshot), DropError<B::Error>> {
        let room = self
            .backend
            .room(room_id)
            .await
            .map_err(DropError::Backend)?
            .ok_or(Rejection::UnknownRoom { room_id })?;
        let snapshot = self
            .backend
            .occupant(occupant)
            .await
            .map_err(DropError::Backend)?
            .ok_or(Rejection::UnknownOccupant { occupant })?;
        Ok((room, snapshot))
    }
}
