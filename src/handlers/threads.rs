use axum::extract::{Extension, Path, State};
use serde_json::Value;

use super::{insert_owned, json_rows};
use crate::auth::Caller;
use crate::filter::Filter;
use crate::middleware::{ApiResponse, ApiResult, JsonObject};
use crate::state::AppState;
use crate::store::Table;

/// GET /threads/:forum_id - threads of one forum
pub async fn list(State(state): State<AppState>, Path(forum_id): Path<i64>) -> ApiResult<Value> {
    let rows = state
        .store
        .select(Table::Threads, &Filter::new().eq("forum_id", forum_id))
        .await?;
    Ok(ApiResponse::success(json_rows(rows)))
}

/// POST /threads [login]
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    JsonObject(thread): JsonObject,
) -> ApiResult<Value> {
    let rows = insert_owned(state.store.as_ref(), Table::Threads, &caller, thread).await?;
    Ok(ApiResponse::created(json_rows(rows)))
}
