use axum::extract::State;
use serde_json::Value;

use super::json_rows;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, JsonObject};
use crate::state::AppState;
use crate::store::Table;

/// GET /forums
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let rows = state.store.select(Table::Forums, &Filter::new()).await?;
    Ok(ApiResponse::success(json_rows(rows)))
}

/// POST /forums [admin]
pub async fn create(State(state): State<AppState>, JsonObject(forum): JsonObject) -> ApiResult<Value> {
    let rows = state.store.insert(Table::Forums, forum).await?;
    Ok(ApiResponse::created(json_rows(rows)))
}
