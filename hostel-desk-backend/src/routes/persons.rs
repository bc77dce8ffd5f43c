use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hostel_desk_allocation::model::{Person, PersonId};
use hostel_desk_database::models::PersonForm;
use hostel_desk_database::repository::persons;
use hostel_desk_database::Pool;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::Desk;

pub async fn create(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppJson(form): AppJson<PersonForm>,
) -> Result<(StatusCode, Json<Person>), AppError> {
    let mut connection = pool.get().await?;
    let person = persons::create(&mut connection, &form).await?;
    if person.group_id.is_some() {
        desk.forget_all().await;
    }
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn update(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<PersonId>,
    AppJson(form): AppJson<PersonForm>,
) -> Result<Json<Person>, AppError> {
    let mut connection = pool.get().await?;
    let person = persons::update(&mut connection, id, &form)
        .await?
        .ok_or(AppError::not_found("person", id.0))?;
    desk.forget_all().await;
    Ok(Json(person))
}

pub async fn delete(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<PersonId>,
) -> Result<StatusCode, AppError> {
    let mut connection = pool.get().await?;
    if persons::delete(&mut connection, id).await? {
        desk.forget_all().await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("person", id.0))
    }
}
