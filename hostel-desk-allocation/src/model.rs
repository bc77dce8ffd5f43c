//! Records of the front desk: hostels with their rooms, partners with their
//! groups and persons, and the assignments binding an occupant to a room for a
//! night.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub i32);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Display::fmt(&self.0, f)
                }
            }
        )*
    };
}

identifier!(
    HostelId,
    RoomId,
    PartnerId,
    GroupId,
    PersonId,
    /// Id handed out by the backing store once an assignment is persisted.
    AssignmentId,
);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hostel {
    pub id: HostelId,
    pub name: String,
    pub capacity: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub hostel_id: HostelId,
    pub name: String,
    pub capacity: i32,
}

/// The organisation travelers arrive with. `size` caps how many persons it
/// may bring, `start_date..=end_date` is the stay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub size: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Partner {
    #[must_use]
    pub fn stays_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub partner_id: PartnerId,
    pub size: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub partner_id: PartnerId,
    /// `None` makes the person an individual.
    pub group_id: Option<GroupId>,
    pub backpack: bool,
}

impl Person {
    #[must_use]
    pub const fn is_individual(&self) -> bool {
        self.group_id.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OccupantKind {
    Group,
    Individual,
}

impl fmt::Display for OccupantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Group => "group",
            Self::Individual => "individual",
        })
    }
}

/// Whoever gets dropped onto a room: a whole group or a single person without
/// a group. Serialized as `{"kind": "group", "id": 3}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum OccupantRef {
    Group(GroupId),
    Individual(PersonId),
}

impl OccupantRef {
    #[must_use]
    pub const fn new(kind: OccupantKind, id: i32) -> Self {
        match kind {
            OccupantKind::Group => Self::Group(GroupId(id)),
            OccupantKind::Individual => Self::Individual(PersonId(id)),
        }
    }

    #[must_use]
    pub const fn kind(self) -> OccupantKind {
        match self {
            Self::Group(_) => OccupantKind::Group,
            Self::Individual(_) => OccupantKind::Individual,
        }
    }

    #[must_use]
    pub const fn raw_id(self) -> i32 {
        match self {
            Self::Group(GroupId(id)) | Self::Individual(PersonId(id)) => id,
        }
    }
}

impl fmt::Display for OccupantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.raw_id())
    }
}

/// The occupant as the backing store last described it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OccupantSnapshot {
    Group { group: Group, members: Vec<Person> },
    Individual { person: Person },
}

impl OccupantSnapshot {
    #[must_use]
    pub const fn reference(&self) -> OccupantRef {
        match self {
            Self::Group { group, .. } => OccupantRef::Group(group.id),
            Self::Individual { person } => OccupantRef::Individual(person.id),
        }
    }

    #[must_use]
    pub const fn partner_id(&self) -> PartnerId {
        match self {
            Self::Group { group, .. } => group.partner_id,
            Self::Individual { person } => person.partner_id,
        }
    }

    /// Beds taken by this occupant once it is in a room.
    #[must_use]
    pub fn person_count(&self) -> i32 {
        match self {
            Self::Group { members, .. } => i32::try_from(members.len()).unwrap_or(i32::MAX),
            Self::Individual { .. } => 1,
        }
    }

    /// Beds asked for when this occupant is dropped onto a room.
    #[must_use]
    pub const fn requested_space(&self) -> i32 {
        match self {
            Self::Group { group, .. } => group.size,
            Self::Individual { .. } => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: AssignmentId,
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub occupant: OccupantSnapshot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub room_id: RoomId,
    pub date: NaiveDate,
    pub occupant: OccupantRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupant_ref_is_a_tagged_union_on_the_wire() {
        let value = serde_json::to_value(OccupantRef::Group(GroupId(3))).unwrap();
        assert_eq!(value, serde_json::json!({"kind": "group", "id": 3}));

        let parsed: OccupantRef =
            serde_json::from_value(serde_json::json!({"kind": "individual", "id": 12})).unwrap();
        assert_eq!(parsed, OccupantRef::Individual(PersonId(12)));
    }

    #[test]
    fn unknown_occupant_kind_is_refused() {
        let parsed = serde_json::from_value::<OccupantRef>(serde_json::json!({
            "kind": "family",
            "id": 1
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn stay_includes_both_ends() {
        let partner = Partner {
            id: PartnerId(1),
            name: "Alpine club".to_owned(),
            size: 10,
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 3).unwrap(),
        };
        assert!(partner.stays_on(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()));
        assert!(partner.stays_on(NaiveDate::from_ymd_opt(2024, 7, 3).unwrap()));
        assert!(!partner.stays_on(NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()));
        assert!(!partner.stays_on(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()));
    }

    #[test]
    fn group_counts_its_members_but_asks_for_its_size() {
        let group = Group {
            id: GroupId(1),
            partner_id: PartnerId(1),
            size: 3,
        };
        let member = Person {
            id: PersonId(1),
            name: "Ada".to_owned(),
            partner_id: PartnerId(1),
            group_id: Some(GroupId(1)),
            backpack: false,
        };
        let snapshot = OccupantSnapshot::Group {
            group,
            members: vec![member],
        };
        assert_eq!(snapshot.person_count(), 1);
        assert_eq!(snapshot.requested_space(), 3);
        assert_eq!(snapshot.reference().to_string(), "group 1");
    }
}
