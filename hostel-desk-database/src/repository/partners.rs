use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use hostel_desk_allocation::model::{Partner, PartnerId};
use tracing::debug;

use crate::error::DatabaseError;
use crate::models::{PartnerForm, PartnerRow};
use crate::schema::{partners, persons};

pub async fn list(connection: &mut AsyncPgConnection) -> Result<Vec<Partner>, DatabaseError> {
    let rows = partners::table
        .order((partners::start_date, partners::id))
        .select(PartnerRow::as_select())
        .load(connection)
        .await?;
    Ok(rows.into_iter().map(Partner::from).collect())
}

pub async fn get(
    connection: &mut AsyncPgConnection,
    id: PartnerId,
) -> Result<Option<Partner>, DatabaseError> {
    let row = partners::table
        .find(id.0)
        .select(PartnerRow::as_select())
        .first(connection)
        .await
        .optional()?;
    Ok(row.map(Partner::from))
}

pub async fn create(
    connection: &mut AsyncPgConnection,
    form: &PartnerForm,
) -> Result<Partner, DatabaseError> {
    let row = diesel::insert_into(partners::table)
        .values(form)
        .returning(PartnerRow::as_returning())
        .get_result(connection)
        .await?;
    Ok(row.into())
}

fn ensure_size_holds(partner_id: PartnerId, size: i32, persons: i64) -> Result<(), DatabaseError> {
    if persons > i64::from(size) {
        debug!(%partner_id, size, persons, "partner would shrink below its persons");
        return Err(DatabaseError::PartnerTooSmall {
            partner_id,
            size,
            persons,
        });
    }
    Ok(())
}

/// The new size must still hold every person the partner already brings.
pub async fn update(
    connection: &mut AsyncPgConnection,
    id: PartnerId,
    form: &PartnerForm,
) -> Result<Option<Partner>, DatabaseError> {
    connection
        .transaction::<_, DatabaseError, _>(|connection| {
            async move {
                let count: i64 = persons::table
                    .filter(persons::partner_id.eq(id.0))
                    .count()
                    .get_result(connection)
                    .await?;
                ensure_size_holds(id, form.size, count)?;
                let row = diesel::update(partners::table.find(id.0))
                    .set(form)
                    .returning(PartnerRow::as_returning())
                    .get_result(connection)
                    .await
                    .optional()?;
                Ok(row.map(Partner::from))
            }
            .scope_boxed()
        })
        .await
}

/// Groups, persons and their assignments go with the partner.
pub async fn delete(
    connection: &mut AsyncPgConnection,
    id: PartnerId,
) -> Result<bool, DatabaseError> {
    let deleted = diesel::delete(partners::table.find(id.0))
        .execute(connection)
        .await?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_may_shrink_down_to_the_persons_brought() {
        assert!(ensure_size_holds(PartnerId(1), 3, 3).is_ok());
        assert!(ensure_size_holds(PartnerId(1), 5, 0).is_ok());
        assert!(matches!(
            ensure_size_holds(PartnerId(1), 2, 3),
            Err(DatabaseError::PartnerTooSmall {
                partner_id: PartnerId(1),
                size: 2,
                persons: 3
            })
        ));
    }
}
