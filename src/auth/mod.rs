//! Caller identity and role resolution.
//!
//! Identity is a plaintext username claim carried in the `X-User` header. It is
//! not signed or otherwise verified; anyone able to reach the API can present
//! any username.

use axum::http::HeaderMap;
use serde_json::Value;

use crate::filter::Filter;
use crate::store::{Store, StoreError, Table};

pub const IDENTITY_HEADER: &str = "x-user";

/// Authenticated caller injected into request extensions by the auth filters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub username: String,
}

impl Caller {
    /// Read the identity header; absent, empty or non-UTF-8 values yield `None`
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(IDENTITY_HEADER)?;
        let username = std::str::from_utf8(value.as_bytes()).ok()?;
        if username.is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member(String),
}

impl Role {
    pub fn from_name(name: &str) -> Self {
        match name {
            "admin" => Role::Admin,
            other => Role::Member(other.to_string()),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Role of `username`, or `None` when the username does not resolve to exactly one user
pub async fn role_of(store: &dyn Store, username: &str) -> Result<Option<Role>, StoreError> {
    let filter = Filter::new().columns(["role"]).eq("username", username);
    let row = store.select_single(Table::Users, &filter).await?;
    Ok(row.map(|row| Role::from_name(row.get("role").and_then(Value::as_str).unwrap_or_default())))
}

/// Store id of `username`, or `None` when the username does not resolve
pub async fn id_of(store: &dyn Store, username: &str) -> Result<Option<Value>, StoreError> {
    let filter = Filter::new().columns(["id"]).eq("username", username);
    let row = store.select_single(Table::Users, &filter).await?;
    Ok(row.and_then(|mut row| row.remove("id")).filter(|id| !id.is_null()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    use crate::store::MemoryStore;

    #[test]
    fn test_caller_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(Caller::from_headers(&headers), None);

        headers.insert("x-user", HeaderValue::from_static(""));
        assert_eq!(Caller::from_headers(&headers), None);

        headers.insert("x-user", HeaderValue::from_static("alice"));
        assert_eq!(
            Caller::from_headers(&headers),
            Some(Caller { username: "alice".to_string() })
        );

        headers.insert("x-user", HeaderValue::from_bytes("café".as_bytes()).unwrap());
        assert_eq!(
            Caller::from_headers(&headers),
            Some(Caller { username: "café".to_string() })
        );

        headers.insert("x-user", HeaderValue::from_bytes(b"caf\xe9").unwrap());
        assert_eq!(Caller::from_headers(&headers), None);
    }

    #[tokio::test]
    async fn test_role_and_id_lookup() {
        let store = MemoryStore::new();
        store
            .seed(
                Table::Users,
                [
                    json!({"id": 1, "username": "alice", "role": "admin"}),
                    json!({"id": 7, "username": "bob", "role": "member"}),
                ],
            )
            .await;

        assert_eq!(role_of(&store, "alice").await.unwrap(), Some(Role::Admin));
        assert_eq!(
            role_of(&store, "bob").await.unwrap(),
            Some(Role::Member("member".to_string()))
        );
        assert_eq!(role_of(&store, "mallory").await.unwrap(), None);

        assert_eq!(id_of(&store, "bob").await.unwrap(), Some(json!(7)));
        assert_eq!(id_of(&store, "mallory").await.unwrap(), None);
    }
}
