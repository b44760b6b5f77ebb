// handlers/protected/weather.rs - GET /weather
//
// Several readings share a date, so this listing pages on (date, weather_id)
// and takes `cursor_date` + `cursor_id` instead of `cursor`.

use axum::extract::{Query, State};

use super::records::{self, Resource};
use crate::database::TableId;
use crate::middleware::PageResult;
use crate::pagination::PaginationQuery;
use crate::state::AppState;

pub const WEATHER: Resource = Resource::new(TableId::Weather, "Weather");

pub async fn weather_list(State(state): State<AppState>, Query(query): Query<PaginationQuery>) -> PageResult {
    records::list_composite(&state, &WEATHER, &query).await
}
