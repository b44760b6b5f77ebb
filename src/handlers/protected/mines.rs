// handlers/protected/mines.rs - GET /mines, GET /mines/:id

use axum::extract::{Path, Query, State};
use serde_json::Value;

use super::records::{self, Resource};
use crate::database::TableId;
use crate::middleware::{ApiResult, PageResult};
use crate::pagination::PaginationQuery;
use crate::state::AppState;

pub const MINES: Resource = Resource::new(TableId::Mines, "Mine");

/// Any authenticated user may browse mines
pub async fn mines_list(State(state): State<AppState>, Query(query): Query<PaginationQuery>) -> PageResult {
    records::list(&state, &MINES, &query).await
}

pub async fn mine_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    records::show(&state, &MINES, &id).await
}
