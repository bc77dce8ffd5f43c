use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel_async::pooled_connection::deadpool::PoolError;
use hostel_desk_allocation::model::AssignmentId;
use hostel_desk_allocation::{DropError, Rejection, UnassignError};
use hostel_desk_config::ConfigError;
use hostel_desk_database::DatabaseError;
use serde::Serialize;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("{0}")]
    Rejected(#[from] Rejection),
    #[error("assignment {id} is not on the board")]
    UnknownAssignment { id: AssignmentId },
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: i32 },
    #[error("invalid request body: {0}")]
    Json(#[from] JsonRejection),
    #[error("invalid query: {0}")]
    Query(#[from] QueryRejection),
    #[error("invalid path: {0}")]
    Path(#[from] PathRejection),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AppError {
    #[must_use]
    pub const fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(
                Rejection::UnknownRoom { .. }
                | Rejection::UnknownOccupant { .. }
                | Rejection::UnknownPartner { .. },
            )
            | Self::UnknownAssignment { .. }
            | Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Rejected(_) => StatusCode::CONFLICT,
            Self::Database(error) if error.is_conflict() => StatusCode::CONFLICT,
            Self::Json(rejection) => rejection.status(),
            Self::Query(rejection) => rejection.status(),
            Self::Path(rejection) => rejection.status(),
            Self::Config(_) | Self::Database(_) | Self::Io(_) | Self::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<PoolError> for AppError {
    fn from(value: PoolError) -> Self {
        Self::Database(value.into())
    }
}

impl From<DropError<DatabaseError>> for AppError {
    fn from(value: DropError<DatabaseError>) -> Self {
        match value {
            DropError::Rejected(rejection) => Self::Rejected(rejection),
            DropError::Backend(error) => Self::Database(error),
        }
    }
}

impl From<UnassignError<DatabaseError>> for AppError {
    fn from(value: UnassignError<DatabaseError>) -> Self {
        match value {
            UnassignError::UnknownAssignment { id } => Self::UnknownAssignment { id },
            UnassignError::Backend(error) => Self::Database(error),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection: Option<&'a Rejection>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let rejection = match &self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            rejection,
        };
        (status, Json(body)).into_response()
    }
}
