use diesel_async::pooled_connection::deadpool;
use hostel_desk_allocation::model::{AssignmentId, GroupId, PartnerId};
use thiserror::Error;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Failed to create database pool {0}")]
    PoolBuild(#[from] deadpool::BuildError),
    #[error("Database pool failed {0}")]
    Pool(#[from] deadpool::PoolError),
    #[error("Database query failed {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Assignment {id} does not name exactly one occupant")]
    InvalidAssignment { id: AssignmentId },
    #[error("Partner {partner_id} already brings all of its {size} persons")]
    PartnerFull { partner_id: PartnerId, size: i32 },
    #[error("Partner {partner_id} already brings {persons} persons, more than {size}")]
    PartnerTooSmall {
        partner_id: PartnerId,
        size: i32,
        persons: i64,
    },
    #[error("Group {group_id} belongs to another partner")]
    ForeignGroup { group_id: GroupId },
}

impl DatabaseError {
    /// Whether the caller asked for something the stored records do not
    /// allow, as opposed to the database failing.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::PartnerFull { .. }
                | Self::PartnerTooSmall { .. }
                | Self::ForeignGroup { .. }
                | Self::Database(diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::ForeignKeyViolation
                        | diesel::result::DatabaseErrorKind::CheckViolation
                        | diesel::result::DatabaseErrorKind::UniqueViolation,
                    _
                ))
        )
    }
}
