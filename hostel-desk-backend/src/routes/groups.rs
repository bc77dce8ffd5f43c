use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hostel_desk_allocation::model::{Group, GroupId};
use hostel_desk_database::models::GroupForm;
use hostel_desk_database::repository::groups;
use hostel_desk_database::Pool;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::Desk;

pub async fn create(
    State(pool): State<Pool>,
    AppJson(form): AppJson<GroupForm>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    let mut connection = pool.get().await?;
    let group = groups::create(&mut connection, &form).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<GroupId>,
    AppJson(form): AppJson<GroupForm>,
) -> Result<Json<Group>, AppError> {
    let mut connection = pool.get().await?;
    let group = groups::update(&mut connection, id, &form)
        .await?
        .ok_or(AppError::not_found("group", id.0))?;
    desk.forget_all().await;
    Ok(Json(group))
}

pub async fn delete(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<GroupId>,
) -> Result<StatusCode, AppError> {
    let mut connection = pool.get().await?;
    if groups::delete(&mut connection, id).await? {
        desk.forget_all().await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("group", id.0))
    }
}
