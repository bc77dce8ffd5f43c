use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use hostel_desk_allocation::model::{Hostel, HostelId};

use crate::error::DatabaseError;
use crate::models::{HostelForm, HostelRow};
use crate::schema::hostels;

pub async fn list(connection: &mut AsyncPgConnection) -> Result<Vec<Hostel>, DatabaseError> {
    let rows = hostels::table
        .order(hostels::id)
        .select(HostelRow::as_select())
        .load(connection)
        .await?;
    Ok(rows.into_iter().map(Hostel::from).collect())
}

pub async fn get(
    connection: &mut AsyncPgConnection,
    id: HostelId,
) -> Result<Option<Hostel>, DatabaseError> {
    let row = hostels::table
        .find(id.0)
        .select(HostelRow::as_select())
        .first(connection)
        .await
        .optional()?;
    Ok(row.map(Hostel::from))
}

pub async fn create(
    connection: &mut AsyncPgConnection,
    form: &HostelForm,
) -> Result<Hostel, DatabaseError> {
    let row = diesel::insert_into(hostels::table)
        .values(form)
        .returning(HostelRow::as_returning())
        .get_result(connection)
        .await?;
    Ok(row.into())
}

pub async fn update(
    connection: &mut AsyncPgConnection,
    id: HostelId,
    form: &HostelForm,
) -> Result<Option<Hostel>, DatabaseError> {
    let row = diesel::update(hostels::table.find(id.0))
        .set(form)
        .returning(HostelRow::as_returning())
        .get_result(connection)
        .await
        .optional()?;
    Ok(row.map(Hostel::from))
}

/// Rooms of the hostel go with it.
pub async fn delete(connection: &mut AsyncPgConnection, id: HostelId) -> Result<bool, DatabaseError> {
    let deleted = diesel::delete(hostels::table.find(id.0))
        .execute(connection)
        .await?;
    Ok(deleted > 0)
}
