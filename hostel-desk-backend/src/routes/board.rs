use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use hostel_desk_allocation::model::HostelId;
use hostel_desk_allocation::{build_board, Board, Roster};
use hostel_desk_database::repository::{groups, hostels, partners, persons, rooms};
use hostel_desk_database::Pool;
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::AppQuery;
use crate::Desk;

#[derive(Deserialize)]
pub struct BoardQuery {
    pub hostel_id: HostelId,
    pub date: NaiveDate,
}

pub async fn show(
    State(pool): State<Pool>,
    State(desk): State<Desk>,
    AppQuery(query): AppQuery<BoardQuery>,
) -> Result<Json<Board>, AppError> {
    let (rooms, roster) = {
        let mut connection = pool.get().await?;
        if hostels::get(&mut connection, query.hostel_id).await?.is_none() {
            return Err(AppError::not_found("hostel", query.hostel_id.0));
        }
        let rooms = rooms::in_hostel(&mut connection, query.hostel_id).await?;
        let roster = Roster {
            partners: partners::list(&mut connection).await?,
            groups: groups::list(&mut connection).await?,
            persons: persons::list(&mut connection).await?,
        };
        (rooms, roster)
    };
    let store = desk.loaded(query.date).await?;
    Ok(Json(build_board(
        query.hostel_id,
        query.date,
        rooms,
        roster,
        &store,
    )))
}
