use chrono::NaiveDate;
use diesel::prelude::*;
use hostel_desk_allocation::model::{
    AssignmentId, Group, GroupId, Hostel, HostelId, NewAssignment, OccupantRef, Partner,
    PartnerId, Person, PersonId, Room, RoomId,
};
use serde::Deserialize;

use crate::error::DatabaseError;
use crate::schema::{assignments, groups, hostels, partners, persons, rooms};

#[derive(Queryable, Selectable)]
#[diesel(table_name = hostels)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HostelRow {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
}

impl From<HostelRow> for Hostel {
    fn from(row: HostelRow) -> Self {
        Self {
            id: HostelId(row.id),
            name: row.name,
            capacity: row.capacity,
        }
    }
}

#[derive(Insertable, AsChangeset, Deserialize)]
#[diesel(table_name = hostels)]
#[serde(rename_all = "camelCase")]
pub struct HostelForm {
    pub name: String,
    pub capacity: i32,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoomRow {
    pub id: i32,
    pub hostel_id: i32,
    pub name: String,
    pub capacity: i32,
}

impl From<RoomRow> for Room {
    fn from(row: RoomRow) -> Self {
        Self {
            id: RoomId(row.id),
            hostel_id: HostelId(row.hostel_id),
            name: row.name,
            capacity: row.capacity,
        }
    }
}

#[derive(Insertable, AsChangeset, Deserialize)]
#[diesel(table_name = rooms)]
#[serde(rename_all = "camelCase")]
pub struct RoomForm {
    pub hostel_id: i32,
    pub name: String,
    pub capacity: i32,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = partners)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PartnerRow {
    pub id: i32,
    pub name: String,
    pub size: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<PartnerRow> for Partner {
    fn from(row: PartnerRow) -> Self {
        Self {
            id: PartnerId(row.id),
            name: row.name,
            size: row.size,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

#[derive(Insertable, AsChangeset, Deserialize)]
#[diesel(table_name = partners)]
#[serde(rename_all = "camelCase")]
pub struct PartnerForm {
    pub name: String,
    pub size: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GroupRow {
    pub id: i32,
    pub partner_id: i32,
    pub size: i32,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: GroupId(row.id),
            partner_id: PartnerId(row.partner_id),
            size: row.size,
        }
    }
}

#[derive(Insertable, AsChangeset, Deserialize)]
#[diesel(table_name = groups)]
#[serde(rename_all = "camelCase")]
pub struct GroupForm {
    pub partner_id: i32,
    pub size: i32,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = persons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PersonRow {
    pub id: i32,
    pub name: String,
    pub partner_id: i32,
    pub group_id: Option<i32>,
    pub backpack: bool,
}

impl From<PersonRow> for Person {
    fn from(row: PersonRow) -> Self {
        Self {
            id: PersonId(row.id),
            name: row.name,
            partner_id: PartnerId(row.partner_id),
            group_id: row.group_id.map(GroupId),
            backpack: row.backpack,
        }
    }
}

/// Updating with `group_id: None` takes the person out of its group.
#[derive(Insertable, AsChangeset, Deserialize)]
#[diesel(table_name = persons)]
#[diesel(treat_none_as_null = true)]
#[serde(rename_all = "camelCase")]
pub struct PersonForm {
    pub name: String,
    pub partner_id: i32,
    #[serde(default)]
    pub group_id: Option<i32>,
    #[serde(default)]
    pub backpack: bool,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AssignmentRow {
    pub id: i32,
    pub room_id: i32,
    pub date: NaiveDate,
    pub group_id: Option<i32>,
    pub person_id: Option<i32>,
}

impl AssignmentRow {
    /// The row's occupant. Exactly one of the two columns must be set.
    pub fn occupant(&self) -> Result<OccupantRef, DatabaseError> {
        match (self.group_id, self.person_id) {
            (Some(group_id), None) => Ok(OccupantRef::Group(GroupId(group_id))),
            (None, Some(person_id)) => Ok(OccupantRef::Individual(PersonId(person_id))),
            _ => Err(DatabaseError::InvalidAssignment {
                id: AssignmentId(self.id),
            }),
        }
    }
}

#[derive(Insertable, Debug, PartialEq, Eq)]
#[diesel(table_name = assignments)]
pub struct NewAssignmentRow {
    pub room_id: i32,
    pub date: NaiveDate,
    pub group_id: Option<i32>,
    pub person_id: Option<i32>,
}

impl From<NewAssignment> for NewAssignmentRow {
    fn from(assignment: NewAssignment) -> Self {
        let (group_id, person_id) = match assignment.occupant {
            OccupantRef::Group(GroupId(id)) => (Some(id), None),
            OccupantRef::Individual(PersonId(id)) => (None, Some(id)),
        };
        Self {
            room_id: assignment.room_id.0,
            date: assignment.date,
            group_id,
            person_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(group_id: Option<i32>, person_id: Option<i32>) -> AssignmentRow {
        AssignmentRow {
            id: 7,
            room_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            group_id,
            person_id,
        }
    }

    #[test]
    fn row_with_one_occupant_column() {
        assert_eq!(
            row(Some(3), None).occupant().unwrap(),
            OccupantRef::Group(GroupId(3))
        );
        assert_eq!(
            row(None, Some(4)).occupant().unwrap(),
            OccupantRef::Individual(PersonId(4))
        );
    }

    #[test]
    fn row_with_both_or_neither_is_invalid() {
        for (group_id, person_id) in [(Some(3), Some(4)), (None, None)] {
            assert!(matches!(
                row(group_id, person_id).occupant(),
                Err(DatabaseError::InvalidAssignment {
                    id: AssignmentId(7)
                })
            ));
        }
    }

    #[test]
    fn new_assignment_sets_exactly_one_column() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let row = NewAssignmentRow::from(NewAssignment {
            room_id: RoomId(2),
            date,
            occupant: OccupantRef::Individual(PersonId(9)),
        });
        assert_eq!(
            row,
            NewAssignmentRow {
                room_id: 2,
                date,
                group_id: None,
                person_id: Some(9),
            }
        );
    }

    #[test]
    fn person_form_defaults_to_individual_without_backpack() {
        let form: PersonForm =
            serde_json::from_str(r#"{"name": "Ida", "partnerId": 2}"#).unwrap();
        assert_eq!(form.group_id, None);
        assert!(!form.backpack);
        assert_eq!(form.partner_id, 2);
    }
}
