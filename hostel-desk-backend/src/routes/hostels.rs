use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hostel_desk_allocation::model::{Hostel, HostelId, Room};
use hostel_desk_database::models::HostelForm;
use hostel_desk_database::repository::{hostels, rooms};
use hostel_desk_database::Pool;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::Desk;

pub async fn list(State(pool): State<Pool>) -> Result<Json<Vec<Hostel>>, AppError> {
    let mut connection = pool.get().await?;
    Ok(Json(hostels::list(&mut connection).await?))
}

pub async fn get(
    State(pool): State<Pool>,
    AppPath(id): AppPath<HostelId>,
) -> Result<Json<Hostel>, AppError> {
    let mut connection = pool.get().await?;
    hostels::get(&mut connection, id)
        .await?
        .map(Json)
        .ok_or(AppError::not_found("hostel", id.0))
}

pub async fn rooms(
    State(pool): State<Pool>,
    AppPath(id): AppPath<HostelId>,
) -> Result<Json<Vec<Room>>, AppError> {
    let mut connection = pool.get().await?;
    if hostels::get(&mut connection, id).await?.is_none() {
        return Err(AppError::not_found("hostel", id.0));
    }
    Ok(Json(rooms::in_hostel(&mut connection, id).await?))
}

pub async fn create(
    State(pool): State<Pool>,
    AppJson(form): AppJson<HostelForm>,
) -> Result<(StatusCode, Json<Hostel>), AppError> {
    let mut connection = pool.get().await?;
    let hostel = hostels::create(&mut connection, &form).await?;
    Ok((StatusCode::CREATED, Json(hostel)))
}

pub async fn update(
    State(pool): State<Pool>,
    AppPath(id): AppPath<HostelId>,
    AppJson(form): AppJson<HostelForm>,
) -> Result<Json<Hostel>, AppError> {
    let mut connection = pool.get().await?;
    hostels::update(&mut connection, id, &form)
        .await?
        .map(Json)
        .ok_or(AppError::not_found("hostel", id.0))
}

pub async fn delete(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<HostelId>,
) -> Result<StatusCode, AppError> {
    let mut connection = pool.get().await?;
    if hostels::delete(&mut connection, id).await? {
        desk.forget_all().await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("hostel", id.0))
    }
}
