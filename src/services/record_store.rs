//! Generic record store interface.
//!
//! The store exposes a filtered, sorted read of a named collection, insert,
//! conditional update, and conditional delete. Workflow services depend on
//! the trait only, so the hosted REST backend and the local SQLite backend
//! are interchangeable.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A single row, keyed by column name.
pub type Record = Map<String, Value>;

/// Record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with an error payload.
    #[error("{message}")]
    Remote {
        message: String,
        status: Option<u16>,
    },

    /// The request never produced an answer.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The query could not be expressed safely.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The store answered with something that is not a record.
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => Self::Remote {
                message: db.message().to_string(),
                status: None,
            },
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport("Request timed out".to_string())
        } else if err.is_connect() {
            Self::Transport("Failed to connect to record store".to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Column ordering for a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// An equality filter: `column = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A foreign record embedded into each row of a read.
///
/// `departments(name, code)` through `department_id` is written as
/// `Embed { collection: "departments", foreign_key: "department_id", columns: ["name", "code"] }`
/// and shows up under the `departments` key of each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub collection: String,
    pub foreign_key: String,
    pub columns: Vec<String>,
}

/// A read of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<u32>,
    pub embed: Option<Embed>,
}

impl SelectQuery {
    pub fn from(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
            embed: None,
        }
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn embed(
        mut self,
        collection: impl Into<String>,
        foreign_key: impl Into<String>,
        columns: &[&str],
    ) -> Self {
        self.embed = Some(Embed {
            collection: collection.into(),
            foreign_key: foreign_key.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Check every identifier in the query.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_identifier(&self.collection)?;
        for filter in &self.filters {
            validate_identifier(&filter.column)?;
        }
        if let Some(order) = &self.order {
            validate_identifier(&order.column)?;
        }
        if let Some(embed) = &self.embed {
            validate_identifier(&embed.collection)?;
            validate_identifier(&embed.foreign_key)?;
            for column in &embed.columns {
                validate_identifier(column)?;
            }
        }
        Ok(())
    }
}

/// Collection and column names are plain ASCII identifiers.
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!(
            "'{}' is not a valid identifier",
            name
        )))
    }
}

/// External record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read rows matching the query.
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Record>, StoreError>;

    /// Insert one row and return it as stored.
    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError>;

    /// Apply `patch` to every row matching all `filters`. Returns the number of rows changed.
    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> Result<u64, StoreError>;

    /// Remove every row matching all `filters`. Returns the number of rows removed.
    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError>;
}

/// Convert a serializable value into a record.
pub fn to_record<T: serde::Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value).map_err(|e| StoreError::Decode(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Decode a record into a typed row.
pub fn from_record<T: serde::de::DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(record)).map_err(|e| StoreError::Decode(e.to_string()))
}
