use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Row, Store, StoreError, Table};
use crate::filter::Filter;

#[derive(Default)]
struct TableData {
    rows: Vec<Row>,
    next_id: i64,
}

/// In-process store with the same filtering rules as the remote backend.
/// Rows without an `id` get the next auto-increment value on insert.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, TableData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert fixture rows directly, bypassing the `Store` trait
    pub async fn seed<I>(&self, table: Table, rows: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut tables = self.tables.write().await;
        let data = tables.entry(table).or_default();
        for row in rows {
            if let Value::Object(row) = row {
                push_row(data, row);
            }
        }
    }

    /// Snapshot of every row currently held in `table`
    pub async fn rows(&self, table: Table) -> Vec<Row> {
        self.tables
            .read()
            .await
            .get(&table)
            .map(|data| data.rows.clone())
            .unwrap_or_default()
    }
}

fn push_row(data: &mut TableData, mut row: Row) -> Row {
    match row.get("id").and_then(Value::as_i64) {
        Some(id) => data.next_id = data.next_id.max(id),
        None => {
            data.next_id += 1;
            row.insert("id".to_string(), Value::from(data.next_id));
        }
    }
    data.rows.push(row.clone());
    row
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(&table)
            .map(|data| {
                data.rows
                    .iter()
                    .filter(|row| filter.matches(row))
                    .map(|row| filter.project(row))
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn select_single(&self, table: Table, filter: &Filter) -> Result<Option<Row>, StoreError> {
        let mut rows = self.select(table, filter).await?;
        if rows.len() == 1 {
            Ok(rows.pop())
        } else {
            Ok(None)
        }
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let data = tables.entry(table).or_default();
        Ok(vec![push_row(data, row)])
    }

    async fn update(&self, table: Table, changes: Row, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(data) = tables.get_mut(&table) else {
            return Ok(vec![]);
        };

        let mut updated = Vec::new();
        for row in data.rows.iter_mut().filter(|row| filter.matches(row)) {
            for (column, value) in &changes {
                row.insert(column.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(data) = tables.get_mut(&table) else {
            return Ok(vec![]);
        };

        let (removed, kept): (Vec<Row>, Vec<Row>) =
            data.rows.drain(..).partition(|row| filter.matches(row));
        data.rows = kept;
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
