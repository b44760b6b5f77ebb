// handlers/protected/constraints.rs - /production-constraints (mine planners only)
//
// `update_date` is stamped by the database on create and cannot be supplied.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde_json::Value;

use super::payload::PayloadRules;
use super::records::{self, Resource};
use crate::auth::Role;
use crate::database::{RawExpr, TableId};
use crate::middleware::{ApiResult, AuthUser, PageResult};
use crate::pagination::PaginationQuery;
use crate::state::AppState;

pub const PRODUCTION_CONSTRAINTS: Resource = Resource::new(TableId::ProductionConstraints, "Production constraint")
    .ids("C", 4)
    .create(
        PayloadRules::new(TableId::ProductionConstraints)
            .required(&["mine_id", "equipment_id", "week_start", "constraint_type"])
            .managed(&["update_date"]),
    )
    .create_defaults(&[("update_date", RawExpr::CurrentDate)]);

pub async fn constraints_list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PaginationQuery>,
) -> PageResult {
    user.require_role(Role::MinePlanner)?;
    records::list_composite(&state, &PRODUCTION_CONSTRAINTS, &query).await
}

pub async fn constraints_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Value> {
    user.require_role(Role::MinePlanner)?;
    let Json(body) = body?;
    records::create(&state, &PRODUCTION_CONSTRAINTS, &body).await
}
