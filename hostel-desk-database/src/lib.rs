//! Postgres storage of the front desk records, through diesel-async and a
//! deadpool connection pool.

pub mod backend;
pub mod error;
pub mod models;
pub mod repository;
pub mod schema;

use diesel_async::pooled_connection::deadpool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
pub use diesel_async::AsyncPgConnection;

pub use crate::backend::PgAssignmentBackend;
pub use crate::error::DatabaseError;

pub type Pool = deadpool::Pool<AsyncPgConnection>;

// https://github.com/tokio-rs/axum/tree/main/examples/diesel-async-postgres

pub fn get_database_connection(database_url: &str) -> Result<Pool, DatabaseError> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Ok(Pool::builder(config).build()?)
}
