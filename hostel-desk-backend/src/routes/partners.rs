use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use hostel_desk_allocation::model::{Group, Partner, PartnerId, Person};
use hostel_desk_database::models::PartnerForm;
use hostel_desk_database::repository::{groups, partners, persons};
use hostel_desk_database::Pool;
use itertools::Itertools;
use serde::Serialize;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::Desk;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupWithMembers {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<Person>,
}

pub async fn list(State(pool): State<Pool>) -> Result<Json<Vec<Partner>>, AppError> {
    let mut connection = pool.get().await?;
    Ok(Json(partners::list(&mut connection).await?))
}

pub async fn get(
    State(pool): State<Pool>,
    AppPath(id): AppPath<PartnerId>,
) -> Result<Json<Partner>, AppError> {
    let mut connection = pool.get().await?;
    partners::get(&mut connection, id)
        .await?
        .map(Json)
        .ok_or(AppError::not_found("partner", id.0))
}

pub async fn groups(
    State(pool): State<Pool>,
    AppPath(id): AppPath<PartnerId>,
) -> Result<Json<Vec<GroupWithMembers>>, AppError> {
    let mut connection = pool.get().await?;
    if partners::get(&mut connection, id).await?.is_none() {
        return Err(AppError::not_found("partner", id.0));
    }
    let groups = groups::of_partner(&mut connection, id).await?;
    let mut members = persons::of_partner(&mut connection, id)
        .await?
        .into_iter()
        .filter_map(|person| Some((person.group_id?, person)))
        .into_group_map();
    Ok(Json(
        groups
            .into_iter()
            .map(|group| GroupWithMembers {
                members: members.remove(&group.id).unwrap_or_default(),
                group,
            })
            .collect(),
    ))
}

pub async fn persons(
    State(pool): State<Pool>,
    AppPath(id): AppPath<PartnerId>,
) -> Result<Json<Vec<Person>>, AppError> {
    let mut connection = pool.get().await?;
    if partners::get(&mut connection, id).await?.is_none() {
        return Err(AppError::not_found("partner", id.0));
    }
    Ok(Json(persons::of_partner(&mut connection, id).await?))
}

pub async fn create(
    State(pool): State<Pool>,
    AppJson(form): AppJson<PartnerForm>,
) -> Result<(StatusCode, Json<Partner>), AppError> {
    let mut connection = pool.get().await?;
    let partner = partners::create(&mut connection, &form).await?;
    Ok((StatusCode::CREATED, Json(partner)))
}

pub async fn update(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<PartnerId>,
    AppJson(form): AppJson<PartnerForm>,
) -> Result<Json<Partner>, AppError> {
    let mut connection = pool.get().await?;
    let partner = partners::update(&mut connection, id, &form)
        .await?
        .ok_or(AppError::not_found("partner", id.0))?;
    desk.forget_all().await;
    Ok(Json(partner))
}

pub async fn delete(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppPath(id): AppPath<PartnerId>,
) -> Result<StatusCode, AppError> {
    let mut connection = pool.get().await?;
    if partners::delete(&mut connection, id).await? {
        desk.forget_all().await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("partner", id.0))
    }
}

#[cfg(test)]
mod tests {
    use hostel_desk_allocation::model::{GroupId, PersonId};
    use serde_json::json;

    use super::*;

    #[test]
    fn group_fields_sit_next_to_the_members() {
        let view = GroupWithMembers {
            group: Group {
                id: GroupId(2),
                partner_id: PartnerId(1),
                size: 1,
            },
            members: vec![Person {
                id: PersonId(5),
                name: "Noa".to_owned(),
                partner_id: PartnerId(1),
                group_id: Some(GroupId(2)),
                backpack: true,
            }],
        };
        assert_eq!(
            serde_json::to_value(view).unwrap(),
            json!({
                "id": 2,
                "partnerId": 1,
                "size": 1,
                "members": [{
                    "id": 5,
                    "name": "Noa",
                    "partnerId": 1,
                    "groupId": 2,
                    "backpack": true
                }]
            })
        );
    }
}
