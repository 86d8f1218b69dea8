//! Reqwest-backed adapter for the hosted store's PostgREST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;

use super::{Row, Store, StoreError, Table};
use crate::config::StoreConfig;
use crate::filter::Filter;

const REST_PATH: &str = "rest/v1/";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

pub struct RestStore {
    client: Client,
    endpoint: Url,
    key: String,
}

impl RestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = config.url.join(REST_PATH)?;

        Ok(Self {
            client,
            endpoint,
            key: config.key.clone(),
        })
    }

    fn request(&self, method: Method, table: Table, filter: &Filter) -> Result<RequestBuilder, StoreError> {
        let url = self.endpoint.join(table.as_str())?;
        let builder = self
            .client
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .query(&filter.to_query_pairs());
        Ok(builder)
    }

    async fn send_rows(&self, builder: RequestBuilder, table: Table) -> Result<Vec<Row>, StoreError> {
        let response = builder.send().await?;
        let response = check_status(response, table).await?;
        let body: Value = response.json().await?;
        rows_from(body)
    }
}

#[async_trait]
impl Store for RestStore {
    async fn select(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        tracing::debug!("select from {} ({} conditions)", table, filter.conditions().len());
        let builder = self.request(Method::GET, table, filter)?;
        self.send_rows(builder, table).await
    }

    async fn select_single(&self, table: Table, filter: &Filter) -> Result<Option<Row>, StoreError> {
        let response = self
            .request(Method::GET, table, filter)?
            .header(header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;

        // PostgREST answers 406 when the result is not exactly one row
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            tracing::debug!("single-row fetch from {} matched zero or many rows", table);
            return Ok(None);
        }

        let response = check_status(response, table).await?;
        match response.json::<Value>().await? {
            Value::Object(row) => Ok(Some(row)),
            Value::Null => Ok(None),
            other => Err(StoreError::Decode(format!("expected object, got {}", other))),
        }
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Vec<Row>, StoreError> {
        let builder = self
            .request(Method::POST, table, &Filter::new())?
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row);
        self.send_rows(builder, table).await
    }

    async fn update(&self, table: Table, changes: Row, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let builder = self
            .request(Method::PATCH, table, filter)?
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&changes);
        self.send_rows(builder, table).await
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let builder = self
            .request(Method::DELETE, table, filter)?
            .header("Prefer", RETURN_REPRESENTATION);
        self.send_rows(builder, table).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .send()
            .await?;
        if response.status().is_server_error() {
            return Err(StoreError::Rejected {
                status: response.status().as_u16(),
                message: "store health check failed".to_string(),
            });
        }
        Ok(())
    }
}

async fn check_status(response: Response, table: Table) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    // PostgREST error bodies carry a human-readable "message"
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(text);

    tracing::warn!("store rejected request on {}: {} {}", table, status, message);
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn rows_from(body: Value) -> Result<Vec<Row>, StoreError> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Decode(format!("expected row object, got {}", other))),
            })
            .collect(),
        Value::Null => Ok(vec![]),
        other => Err(StoreError::Decode(format!("expected array, got {}", other))),
    }
}
