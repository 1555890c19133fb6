//! Document store outbound port. Collection-based CRUD plus change notifications.
//!
//! Documents are schema-flexible JSON objects. The store assigns the id and the
//! creation timestamp; callers never write either.

use crate::domain::DomainError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use tokio::sync::broadcast;

/// Top-level fields of a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Sort key that refers to the store-assigned creation time instead of a data field.
pub const TIMESTAMP_FIELD: &str = "timestamp";

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub data: Fields,
}

impl Document {
    /// Deserialize the data fields into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(serde_json::Value::Object(self.data.clone())).map_err(|e| {
            DomainError::Store(format!("malformed document {}: {}", self.id, e))
        })
    }
}

/// Serialize `value` into top-level document fields. `value` must serialize to a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, DomainError> {
    match serde_json::to_value(value).map_err(|e| DomainError::Store(e.to_string()))? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(DomainError::Store(format!(
            "document must be an object, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// A collection read ordered by one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    pub order_by: String,
    pub direction: SortDirection,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: &str, order_by: &str, direction: SortDirection) -> Self {
        Self {
            collection: collection.to_string(),
            order_by: order_by.to_string(),
            direction,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Order two documents by this query's key. Documents missing the field sort last
    /// in ascending order; ties fall back to creation time, then id.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let primary = if self.order_by == TIMESTAMP_FIELD {
            a.created_at.cmp(&b.created_at)
        } else {
            compare_values(a.data.get(&self.order_by), b.data.get(&self.order_by))
        };
        let ord = primary
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

fn compare_values(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> Ordering {
    use serde_json::Value;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Document store port. Backing store for check-in logs and the driver roster.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; the store assigns its id and creation timestamp.
    async fn create(&self, collection: &str, data: Fields) -> Result<Document, DomainError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DomainError>;

    /// Merge `fields` into the document's top-level fields.
    ///
    /// # Errors
    /// `NotFound` when no document has this id.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), DomainError>;

    /// # Errors
    /// `NotFound` when no document has this id.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), DomainError>;

    async fn query(&self, query: &Query) -> Result<Vec<Document>, DomainError>;

    /// Names of collections touched by successful writes, in commit order.
    fn changes(&self) -> broadcast::Receiver<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn doc(id: &str, secs: i64, data: serde_json::Value) -> Document {
        Document {
            id: id.into(),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            data: data.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn missing_field_sorts_last_ascending() {
        let q = Query::new("drivers", "name", SortDirection::Ascending);
        let mut docs = vec![
            doc("a", 1, json!({})),
            doc("b", 2, json!({"name": "Zé"})),
            doc("c", 3, json!({"name": "Ana"})),
        ];
        docs.sort_by(|x, y| q.compare(x, y));
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["c", "b", "a"]);
    }

    #[test]
    fn timestamp_descending_uses_creation_time() {
        let q = Query::new("logs", TIMESTAMP_FIELD, SortDirection::Descending);
        let mut docs = vec![doc("old", 10, json!({})), doc("new", 20, json!({}))];
        docs.sort_by(|x, y| q.compare(x, y));
        assert_eq!(docs[0].id, "new");
    }

    #[test]
    fn to_fields_rejects_non_objects() {
        assert!(to_fields(&42).is_err());
        let f = to_fields(&json!({"plate": "ABC1234"})).unwrap();
        assert_eq!(f.get("plate"), Some(&json!("ABC1234")));
    }
}
