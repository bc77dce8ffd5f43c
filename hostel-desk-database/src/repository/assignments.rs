use std::collections::HashMap;

use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use hostel_desk_allocation::model::{
    Assignment, AssignmentId, Group, GroupId, NewAssignment, OccupantRef, OccupantSnapshot,
    Person, PersonId, RoomId,
};
use itertools::Itertools;
use tracing::warn;

use crate::error::DatabaseError;
use crate::models::{AssignmentRow, GroupRow, NewAssignmentRow, PersonRow};
use crate::schema::{assignments, groups, persons};

/// Describes the occupant as it is stored right now.
pub async fn snapshot(
    connection: &mut AsyncPgConnection,
    occupant: OccupantRef,
) -> Result<Option<OccupantSnapshot>, DatabaseError> {
    match occupant {
        OccupantRef::Group(GroupId(id)) => {
            let Some(group) = groups::table
                .find(id)
                .select(GroupRow::as_select())
                .first(connection)
                .await
                .optional()?
            else {
                return Ok(None);
            };
            let members = persons::table
                .filter(persons::group_id.eq(id))
                .order(persons::id)
                .select(PersonRow::as_select())
                .load(connection)
                .await?;
            Ok(Some(OccupantSnapshot::Group {
                group: group.into(),
                members: members.into_iter().map(Person::from).collect(),
            }))
        }
        OccupantRef::Individual(PersonId(id)) => {
            let person = persons::table
                .find(id)
                .select(PersonRow::as_select())
                .first(connection)
                .await
                .optional()?;
            Ok(person.map(|person| OccupantSnapshot::Individual {
                person: person.into(),
            }))
        }
    }
}

/// Turns rows into assignments with three queries, whatever the number of
/// rows. Rows whose occupant vanished in between are skipped.
async fn with_snapshots(
    connection: &mut AsyncPgConnection,
    rows: Vec<AssignmentRow>,
) -> Result<Vec<Assignment>, DatabaseError> {
    let occupants: Vec<OccupantRef> = rows
        .iter()
        .map(AssignmentRow::occupant)
        .collect::<Result<_, _>>()?;
    let group_ids = occupants
        .iter()
        .filter_map(|occupant| match occupant {
            OccupantRef::Group(GroupId(id)) => Some(*id),
            OccupantRef::Individual(_) => None,
        })
        .unique()
        .collect_vec();
    let person_ids = occupants
        .iter()
        .filter_map(|occupant| match occupant {
            OccupantRef::Individual(PersonId(id)) => Some(*id),
            OccupantRef::Group(_) => None,
        })
        .unique()
        .collect_vec();

    let groups: HashMap<GroupId, Group> = groups::table
        .filter(groups::id.eq_any(&group_ids))
        .select(GroupRow::as_select())
        .load(connection)
        .await?
        .into_iter()
        .map(|row| {
            let group = Group::from(row);
            (group.id, group)
        })
        .collect();
    let persons: Vec<Person> = persons::table
        .filter(
            persons::id
                .eq_any(&person_ids)
                .or(persons::group_id.eq_any(&group_ids)),
        )
        .order(persons::id)
        .select(PersonRow::as_select())
        .load(connection)
        .await?
        .into_iter()
        .map(Person::from)
        .collect();
    let members = persons
        .iter()
        .filter_map(|person| Some((person.group_id?, person.clone())))
        .into_group_map();
    let individuals: HashMap<PersonId, Person> = persons
        .into_iter()
        .map(|person| (person.id, person))
        .collect();

    let mut assignments = Vec::with_capacity(rows.len());
    for (row, occupant) in rows.into_iter().zip(occupants) {
        let snapshot = match occupant {
            OccupantRef::Group(id) => groups.get(&id).map(|group| OccupantSnapshot::Group {
                group: group.clone(),
                members: members.get(&id).cloned().unwrap_or_default(),
            }),
            OccupantRef::Individual(id) => {
                individuals
                    .get(&id)
                    .map(|person| OccupantSnapshot::Individual {
                        person: person.clone(),
                    })
            }
        };
        let Some(occupant) = snapshot else {
            warn!(id = row.id, "assignment without occupant");
            continue;
        };
        assignments.push(Assignment {
            id: AssignmentId(row.id),
            room_id: RoomId(row.room_id),
            date: row.date,
            occupant,
        });
    }
    Ok(assignments)
}

pub async fn list_on(
    connection: &mut AsyncPgConnection,
    date: NaiveDate,
) -> Result<Vec<Assignment>, DatabaseError> {
    let rows = assignments::table
        .filter(assignments::date.eq(date))
        .order(assignments::id)
        .select(AssignmentRow::as_select())
        .load(connection)
        .await?;
    with_snapshots(connection, rows).await
}

/// The night the assignment is for, without loading its occupant.
pub async fn date_of(
    connection: &mut AsyncPgConnection,
    id: AssignmentId,
) -> Result<Option<NaiveDate>, DatabaseError> {
    Ok(assignments::table
        .find(id.0)
        .select(assignments::date)
        .first(connection)
        .await
        .optional()?)
}

/// Inserts the row as is. Duplicates and capacity are checked by the caller.
pub async fn create(
    connection: &mut AsyncPgConnection,
    assignment: NewAssignment,
) -> Result<Assignment, DatabaseError> {
    let row = diesel::insert_into(assignments::table)
        .values(NewAssignmentRow::from(assignment))
        .returning(AssignmentRow::as_returning())
        .get_result(connection)
        .await?;
    let id = AssignmentId(row.id);
    with_snapshots(connection, vec![row])
        .await?
        .pop()
        .ok_or(DatabaseError::InvalidAssignment { id })
}

pub async fn delete(
    connection: &mut AsyncPgConnection,
    id: AssignmentId,
) -> Result<bool, DatabaseError> {
    let deleted = diesel::delete(assignments::table.find(id.0))
        .execute(connection)
        .await?;
    Ok(deleted > 0)
}
