use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use hostel_desk_allocation::model::{OccupantKind, OccupantRef, Room, RoomId};
use hostel_desk_allocation::CapacityCheck;
use hostel_desk_database::models::RoomForm;
use hostel_desk_database::repository::rooms;
use hostel_desk_database::Pool;
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::Desk;

pub async fn create(
    State(pool): State<Pool>,
    AppJson(form): AppJson<RoomForm>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let mut connection = pool.get().await?;
    let room = rooms::create(&mut connection, &form).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<RoomId>,
    AppJson(form): AppJson<RoomForm>,
) -> Result<Json<Room>, AppError> {
    let mut connection = pool.get().await?;
    let room = rooms::update(&mut connection, id, &form)
        .await?
        .ok_or(AppError::not_found("room", id.0))?;
    desk.forget_all().await;
    Ok(Json(room))
}

pub async fn delete(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<RoomId>,
) -> Result<StatusCode, AppError> {
    let mut connection = pool.get().await?;
    if rooms::delete(&mut connection, id).await? {
        desk.forget_all().await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("room", id.0))
    }
}

#[derive(Deserialize)]
pub struct CapacityQuery {
    pub date: NaiveDate,
    pub kind: OccupantKind,
    pub id: i32,
}

/// What dropping the occupant onto the room would look like, without
/// dropping it.
pub async fn capacity(
    State(desk): State<Desk>,
    AppPath(room_id): AppPath<RoomId>,
    AppQuery(query): AppQuery<CapacityQuery>,
) -> Result<Json<CapacityCheck>, AppError> {
    let occupant = OccupantRef::new(query.kind, query.id);
    Ok(Json(desk.preview(occupant, room_id, query.date).await?))
}
