//! Table-scoped access to the remote relational store.
//!
//! Handlers talk to the [`Store`] trait only. [`RestStore`] speaks the hosted
//! backend's PostgREST dialect over HTTP; [`MemoryStore`] keeps rows in
//! process with the same filter semantics.

pub mod memory;
pub mod rest;

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::Filter;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// A single record as returned by the store
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Products,
    Forums,
    Threads,
    Posts,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Users,
        Table::Products,
        Table::Forums,
        Table::Threads,
        Table::Posts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Products => "products",
            Table::Forums => "forums",
            Table::Threads => "threads",
            Table::Posts => "posts",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected store response: {0}")]
    Decode(String),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// All rows of `table` matching `filter`
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    /// Exactly one matching row; zero or several matches yield `None`
    async fn select_single(&self, table: Table, filter: &Filter) -> Result<Option<Row>, StoreError>;

    /// Insert one row, returning what the store persisted
    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError>;

    /// Apply `changes` to every matching row, returning the updated rows
    async fn update(&self, table: Table, changes: Row, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    /// Delete every matching row, returning the removed rows
    async fn delete(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
