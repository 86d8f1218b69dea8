//! Equality filters applied server-side by the store.
//!
//! A [`Filter`] carries an optional column projection and a conjunction of
//! `column = value` conditions. It renders to PostgREST query parameters
//! (`select=a,b`, `col=eq.value`) and can evaluate itself against an
//! in-memory row with the same text-based comparison PostgREST applies.

pub mod error;

use serde_json::{Map, Value};

pub use error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
        }
    }

    fn parse(op: &str) -> Result<Self, FilterError> {
        match op {
            "eq" => Ok(FilterOp::Eq),
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    columns: Option<Vec<String>>,
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict returned columns; `*` (the default) when never called
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            column: column.into(),
            operator: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Render as PostgREST query parameters
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.conditions.len() + 1);
        if let Some(columns) = &self.columns {
            pairs.push(("select".to_string(), columns.join(",")));
        }
        for condition in &self.conditions {
            pairs.push((
                condition.column.clone(),
                format!("{}.{}", condition.operator.as_str(), value_text(&condition.value)),
            ));
        }
        pairs
    }

    /// Parse PostgREST query parameters back into a filter
    pub fn from_query_pairs<'a, I>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filter = Filter::new();
        for (key, raw) in pairs {
            if key == "select" {
                if raw != "*" {
                    filter = filter.columns(raw.split(',').map(str::trim));
                }
                continue;
            }
            validate_column(key)?;
            let (op, value) = raw
                .split_once('.')
                .ok_or_else(|| FilterError::InvalidOperatorData(raw.to_string()))?;
            filter.conditions.push(Condition {
                column: key.to_string(),
                operator: FilterOp::parse(op)?,
                value: Value::String(value.to_string()),
            });
        }
        Ok(filter)
    }

    /// True when every condition holds for `row`
    pub fn matches(&self, row: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|condition| match condition.operator {
            FilterOp::Eq => row
                .get(&condition.column)
                .filter(|v| !v.is_null())
                .map(|v| value_text(v) == value_text(&condition.value))
                .unwrap_or(false),
        })
    }

    /// Apply the column projection to `row`
    pub fn project(&self, row: &Map<String, Value>) -> Map<String, Value> {
        match &self.columns {
            None => row.clone(),
            Some(columns) => columns
                .iter()
                .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                .collect(),
        }
    }
}

/// Text form of a JSON scalar as the store compares it
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn validate_column(column: &str) -> Result<(), FilterError> {
    let mut chars = column.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(FilterError::InvalidColumn(column.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_query_pairs() {
        let filter = Filter::new().columns(["id"]).eq("username", "alice").eq("id", 7);
        assert_eq!(
            filter.to_query_pairs(),
            vec![
                ("select".to_string(), "id".to_string()),
                ("username".to_string(), "eq.alice".to_string()),
                ("id".to_string(), "eq.7".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_filter_renders_nothing() {
        assert!(Filter::new().to_query_pairs().is_empty());
        assert!(Filter::new().matches(&row(json!({"id": 1}))));
    }

    #[test]
    fn test_matches_compares_text_form() {
        let product = row(json!({"id": 7, "category": "electronics", "stock": null}));
        assert!(Filter::new().eq("id", 7).matches(&product));
        assert!(Filter::new().eq("id", "7").matches(&product));
        assert!(!Filter::new().eq("category", "books").matches(&product));
        assert!(!Filter::new().eq("stock", "null").matches(&product));
        assert!(!Filter::new().eq("missing", "x").matches(&product));
    }

    #[test]
    fn test_parse_keeps_dots_in_value() {
        let filter =
            Filter::from_query_pairs([("select", "role"), ("email", "eq.a.b@example.com")]).unwrap();
        assert_eq!(filter.projection(), Some(&["role".to_string()][..]));
        assert_eq!(filter.conditions()[0].value, json!("a.b@example.com"));
    }

    #[test]
    fn test_parse_rejects_unknown_operator() {
        let err = Filter::from_query_pairs([("id", "gt.3")]).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedOperator(op) if op == "gt"));

        let err = Filter::from_query_pairs([("id;drop", "eq.3")]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn test_project() {
        let user = row(json!({"id": 1, "username": "alice", "role": "admin"}));
        let projected = Filter::new().columns(["role"]).project(&user);
        assert_eq!(Value::Object(projected), json!({"role": "admin"}));
    }
}
