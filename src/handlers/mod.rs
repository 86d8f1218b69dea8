// handlers/mod.rs - Resource handlers
//
// One module per entity. Each handler issues a single logical store operation
// and shapes the result; authorization happens in the route filters before a
// handler runs (see routes::ResourceRouter and middleware::auth).
//
// Route → handler map:
//   GET    /                     root::index
//   GET    /health               root::health
//   GET    /products             products::list
//   GET    /products/{id:int}    products::get
//   POST   /products             products::create   [admin]
//   PUT    /products/{id:int}    products::update   [admin]
//   DELETE /products/{id:int}    products::delete   [admin]
//   GET    /forums               forums::list
//   POST   /forums               forums::create     [admin]
//   GET    /threads/{forum_id}   threads::list
//   POST   /threads              threads::create    [login]
//   GET    /posts/{thread_id}    posts::list
//   POST   /posts                posts::create      [login]

pub mod forums;
pub mod posts;
pub mod products;
pub mod root;
pub mod threads;

use serde_json::Value;

use crate::auth::{self, Caller};
use crate::error::ApiError;
use crate::store::{Row, Store, Table};

/// Insert `row` into `table` as a child record owned by the caller.
///
/// Any client-supplied `user_id` is replaced with the id the caller's username
/// resolves to, so the body cannot claim another user's identity.
pub(crate) async fn insert_owned(
    store: &dyn Store,
    table: Table,
    caller: &Caller,
    mut row: Row,
) -> Result<Vec<Row>, ApiError> {
    let user_id = auth::id_of(store, &caller.username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if let Some(claimed) = row.get("user_id").filter(|v| **v != user_id) {
        tracing::debug!("overriding client user_id {} with {} for '{}'", claimed, user_id, caller.username);
    }
    row.insert("user_id".to_string(), user_id);

    Ok(store.insert(table, row).await?)
}

pub(crate) fn json_rows(rows: Vec<Row>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}
