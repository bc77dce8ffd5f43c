use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use hostel_desk_allocation::model::{Group, GroupId, PartnerId};

use crate::error::DatabaseError;
use crate::models::{GroupForm, GroupRow};
use crate::schema::groups;

pub async fn list(connection: &mut AsyncPgConnection) -> Result<Vec<Group>, DatabaseError> {
    let rows = groups::table
        .order(groups::id)
        .select(GroupRow::as_select())
        .load(connection)
        .await?;
    Ok(rows.into_iter().map(Group::from).collect())
}

pub async fn of_partner(
    connection: &mut AsyncPgConnection,
    partner_id: PartnerId,
) -> Result<Vec<Group>, DatabaseError> {
    let rows = groups::table
        .filter(groups::partner_id.eq(partner_id.0))
        .order(groups::id)
        .select(GroupRow::as_select())
        .load(connection)
        .await?;
    Ok(rows.into_iter().map(Group::from).collect())
}

pub async fn create(
    connection: &mut AsyncPgConnection,
    form: &GroupForm,
) -> Result<Group, DatabaseError> {
    let row = diesel::insert_into(groups::table)
        .values(form)
        .returning(GroupRow::as_returning())
        .get_result(connection)
        .await?;
    Ok(row.into())
}

pub async fn update(
    connection: &mut AsyncPgConnection,
    id: GroupId,
    form: &GroupForm,
) -> Result<Option<Group>, DatabaseError> {
    let row = diesel::update(groups::table.find(id.0))
        .set(form)
        .returning(GroupRow::as_returning())
        .get_result(connection)
        .await
        .optional()?;
    Ok(row.map(Group::from))
}

/// Members become individuals, assignments of the group are removed.
pub async fn delete(connection: &mut AsyncPgConnection, id: GroupId) -> Result<bool, DatabaseError> {
    let deleted = diesel::delete(groups::table.find(id.0))
        .execute(connection)
        .await?;
    Ok(deleted > 0)
}
