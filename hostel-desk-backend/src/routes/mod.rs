pub mod assignments;
pub mod board;
pub mod groups;
pub mod hostels;
pub mod partners;
pub mod persons;
pub mod rooms;

use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}
