use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hostel_desk_allocation::model::{Assignment, AssignmentId, NewAssignment};
use hostel_desk_allocation::AssignmentRecord;
use tracing::instrument;

use super::DateQuery;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::Desk;

async fn records_on(desk: &Desk, query: &DateQuery) -> Result<Vec<AssignmentRecord>, AppError> {
    let store = desk.loaded(query.date).await?;
    Ok(store.on(query.date).cloned().collect())
}

/// Everything the desk knows about the date, pending drops included.
pub async fn list(
    State(desk): State<Desk>,
    AppQuery(query): AppQuery<DateQuery>,
) -> Result<Json<Vec<AssignmentRecord>>, AppError> {
    Ok(Json(records_on(&desk, &query).await?))
}

/// Refetches the date, picking up what other desks wrote meanwhile.
pub async fn refresh(
    State(desk): State<Desk>,
    AppQuery(query): AppQuery<DateQuery>,
) -> Result<Json<Vec<AssignmentRecord>>, AppError> {
    desk.load(query.date).await?;
    Ok(Json(records_on(&desk, &query).await?))
}

/// Drops the occupant onto the room. The drop runs in its own task so that a
/// client hanging up cannot leave a pending record behind.
#[instrument(skip_all, fields(occupant = %assignment.occupant, room_id = %assignment.room_id))]
pub async fn create(
    State(desk): State<Desk>,
    AppJson(assignment): AppJson<NewAssignment>,
) -> Result<(StatusCode, Json<Assignment>), AppError> {
    let NewAssignment {
        room_id,
        date,
        occupant,
    } = assignment;
    let task = tokio::spawn(async move { desk.drop_onto(occupant, room_id, date).await });
    let assignment = task.await??;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[instrument(skip_all, fields(%id))]
pub async fn delete(
    State(desk): State<Desk>,
    AppPath(id): AppPath<AssignmentId>,
) -> Result<StatusCode, AppError> {
    tokio::spawn(async move { desk.unassign(id).await }).await??;
    Ok(StatusCode::NO_CONTENT)
}
