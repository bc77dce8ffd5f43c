use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use hostel_desk_allocation::model::{GroupId, PartnerId, Person, PersonId};
use tracing::debug;

use crate::error::DatabaseError;
use crate::models::{PersonForm, PersonRow};
use crate::schema::{groups, partners, persons};

pub async fn list(connection: &mut AsyncPgConnection) -> Result<Vec<Person>, DatabaseError> {
    let rows = persons::table
        .order(persons::id)
        .select(PersonRow::as_select())
        .load(connection)
        .await?;
    Ok(rows.into_iter().map(Person::from).collect())
}

pub async fn of_partner(
    connection: &mut AsyncPgConnection,
    partner_id: PartnerId,
) -> Result<Vec<Person>, DatabaseError> {
    let rows = persons::table
        .filter(persons::partner_id.eq(partner_id.0))
        .order(persons::id)
        .select(PersonRow::as_select())
        .load(connection)
        .await?;
    Ok(rows.into_iter().map(Person::from).collect())
}

/// A partner of `size` already bringing `others` persons can take one more.
fn ensure_room_for_one(partner_id: PartnerId, size: i32, others: i64) -> Result<(), DatabaseError> {
    if others >= i64::from(size) {
        debug!(%partner_id, size, "partner is full");
        return Err(DatabaseError::PartnerFull { partner_id, size });
    }
    Ok(())
}

/// `owner` is the partner the group is stored under, `None` for an unknown
/// group, which is left to the foreign key.
fn ensure_own_group(partner_id: PartnerId, group_id: GroupId, owner: Option<i32>) -> Result<(), DatabaseError> {
    if owner.is_some_and(|owner| owner != partner_id.0) {
        return Err(DatabaseError::ForeignGroup { group_id });
    }
    Ok(())
}

/// Checks the form against the partner it names: the partner must have room
/// for one more person besides `existing`, and the group must be one of its
/// own. An unknown partner is left to the foreign key.
async fn check_partner(
    connection: &mut AsyncPgConnection,
    form: &PersonForm,
    existing: Option<PersonId>,
) -> Result<(), DatabaseError> {
    let size = partners::table
        .find(form.partner_id)
        .select(partners::size)
        .first::<i32>(connection)
        .await
        .optional()?;
    let Some(size) = size else {
        return Ok(());
    };

    let count: i64 = persons::table
        .filter(persons::partner_id.eq(form.partner_id))
        .filter(
            persons::id
                .nullable()
                .is_distinct_from(existing.map(|PersonId(id)| id)),
        )
        .count()
        .get_result(connection)
        .await?;
    let partner_id = PartnerId(form.partner_id);
    ensure_room_for_one(partner_id, size, count)?;

    if let Some(group_id) = form.group_id {
        let owner = groups::table
            .find(group_id)
            .select(groups::partner_id)
            .first::<i32>(connection)
            .await
            .optional()?;
        ensure_own_group(partner_id, GroupId(group_id), owner)?;
    }
    Ok(())
}

pub async fn create(
    connection: &mut AsyncPgConnection,
    form: &PersonForm,
) -> Result<Person, DatabaseError> {
    connection
        .transaction::<_, DatabaseError, _>(|connection| {
            async move {
                check_partner(connection, form, None).await?;
                let row = diesel::insert_into(persons::table)
                    .values(form)
                    .returning(PersonRow::as_returning())
                    .get_result(connection)
                    .await?;
                Ok(row.into())
            }
            .scope_boxed()
        })
        .await
}

pub async fn update(
    connection: &mut AsyncPgConnection,
    id: PersonId,
    form: &PersonForm,
) -> Result<Option<Person>, DatabaseError> {
    connection
        .transaction::<_, DatabaseError, _>(|connection| {
            async move {
                check_partner(connection, form, Some(id)).await?;
                let row = diesel::update(persons::table.find(id.0))
                    .set(form)
                    .returning(PersonRow::as_returning())
                    .get_result(connection)
                    .await
                    .optional()?;
                Ok(row.map(Person::from))
            }
            .scope_boxed()
        })
        .await
}

/// Assignments of the person as an individual go with it.
pub async fn delete(connection: &mut AsyncPgConnection, id: PersonId) -> Result<bool, DatabaseError> {
    let deleted = diesel::delete(persons::table.find(id.0))
        .execute(connection)
        .await?;
    Ok(deleted > 0)
}
