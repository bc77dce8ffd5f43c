use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use hostel_desk_allocation::model::{HostelId, Room, RoomId};

use crate::error::DatabaseError;
use crate::models::{RoomForm, RoomRow};
use crate::schema::rooms;

pub async fn in_hostel(
    connection: &mut AsyncPgConnection,
    hostel_id: HostelId,
) -> Result<Vec<Room>, DatabaseError> {
    let rows = rooms::table
        .filter(rooms::hostel_id.eq(hostel_id.0))
        .order(rooms::id)
        .select(RoomRow::as_select())
        .load(connection)
        .await?;
    Ok(rows.into_iter().map(Room::from).collect())
}

pub async fn get(
    connection: &mut AsyncPgConnection,
    id: RoomId,
) -> Result<Option<Room>, DatabaseError> {
    let row = rooms::table
        .find(id.0)
        .select(RoomRow::as_select())
        .first(connection)
        .await
        .optional()?;
    Ok(row.map(Room::from))
}

pub async fn create(
    connection: &mut AsyncPgConnection,
    form: &RoomForm,
) -> Result<Room, DatabaseError> {
    let row = diesel::insert_into(rooms::table)
        .values(form)
        .returning(RoomRow::as_returning())
        .get_result(connection)
        .await?;
    Ok(row.into())
}

pub async fn update(
    connection: &mut AsyncPgConnection,
    id: RoomId,
    form: &RoomForm,
) -> Result<Option<Room>, DatabaseError> {
    let row = diesel::update(rooms::table.find(id.0))
        .set(form)
        .returning(RoomRow::as_returning())
        .get_result(connection)
        .await
        .optional()?;
    Ok(row.map(Room::from))
}

/// Assignments to the room go with it.
pub async fn delete(connection: &mut AsyncPgConnection, id: RoomId) -> Result<bool, DatabaseError> {
    let deleted = diesel::delete(rooms::table.find(id.0))
        .execute(connection)
        .await?;
    Ok(deleted > 0)
}
