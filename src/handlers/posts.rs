use axum::extract::{Extension, Path, State};
use serde_json::Value;

use super::{insert_owned, json_rows};
use crate::auth::Caller;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, JsonObject};
use crate::state::AppState;
use crate::store::Table;

/// GET /posts/:thread_id - replies in one thread
pub async fn list(State(state): State<AppState>, Path(thread_id): Path<i64>) -> ApiResult<Value> {
    let rows = state
        .store
        .select(Table::Posts, &Filter::new().eq("thread_id", thread_id))
        .await?;
    Ok(ApiResponse::success(json_rows(rows)))
}

/// POST /posts [login]
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonObject(post): JsonObject,
) -> ApiResult<Value> {
    let rows = insert_owned(state.store.as_ref(), Table::Posts, &caller, post).await?;
    Ok(ApiResponse::created(json_rows(rows)))
}
