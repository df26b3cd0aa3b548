//! Local SQLite implementation of the record store.
//!
//! Rows are converted to JSON records column by column using the stored
//! value's SQLite type, so the same decoding path serves every collection.

use crate::db::{self, pool::DbPool, DbError};
use crate::services::record_store::{
    validate_identifier, Direction, Embed, Filter, Record, RecordStore, SelectQuery, StoreError,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, TypeInfo, ValueRef};
use std::path::Path;

/// Column alias prefix for embedded foreign columns.
const EMBED_PREFIX: &str = "__embed_";

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Record store backed by the local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: DbPool,
}

impl SqliteRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (and migrate) the database at `path`.
    pub async fn open(path: &Path) -> Result<Self, DbError> {
        Ok(Self::new(db::initialize(path).await?))
    }
}

/// Build the SELECT statement and the values to bind, in order.
fn build_select(query: &SelectQuery) -> Result<(String, Vec<&Value>), StoreError> {
    query.validate()?;

    let mut sql = String::from("SELECT t.*");
    match &query.embed {
        Some(embed) => {
            for column in &embed.columns {
                sql.push_str(&format!(", e.\"{}\" AS \"{}{}\"", column, EMBED_PREFIX, column));
            }
            sql.push_str(&format!(
                " FROM \"{}\" t LEFT JOIN \"{}\" e ON e.id = t.\"{}\"",
                query.collection, embed.collection, embed.foreign_key
            ));
        }
        None => sql.push_str(&format!(" FROM \"{}\" t", query.collection)),
    }

    let (where_clause, binds) = build_where(&query.filters, "t.");
    sql.push_str(&where_clause);

    if let Some(order) = &query.order {
        let direction = match order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        sql.push_str(&format!(" ORDER BY t.\"{}\" {}", order.column, direction));
    }

    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Ok((sql, binds))
}

/// Build a WHERE clause of ANDed equality filters. Null compares with `IS NULL`.
fn build_where<'a>(filters: &'a [Filter], qualifier: &str) -> (String, Vec<&'a Value>) {
    if filters.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut binds = Vec::new();
    let conditions: Vec<String> = filters
        .iter()
        .map(|filter| {
            if filter.value.is_null() {
                format!("{}\"{}\" IS NULL", qualifier, filter.column)
            } else {
                binds.push(&filter.value);
                format!("{}\"{}\" = ?", qualifier, filter.column)
            }
        })
        .collect();

    (format!(" WHERE {}", conditions.join(" AND ")), binds)
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

fn column_value(row: &SqliteRow, index: usize) -> Result<Value, StoreError> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
        "REAL" => Value::from(row.try_get::<f64, _>(index)?),
        "BLOB" => Value::String(
            String::from_utf8_lossy(&row.try_get::<Vec<u8>, _>(index)?).into_owned(),
        ),
        _ => Value::String(row.try_get::<String, _>(index)?),
    };
    Ok(value)
}

fn row_to_record(row: &SqliteRow, embed: Option<&Embed>) -> Result<Record, StoreError> {
    let mut record = Record::new();
    let mut embedded = Record::new();

    for column in row.columns() {
        let value = column_value(row, column.ordinal())?;
        match column.name().strip_prefix(EMBED_PREFIX) {
            Some(name) => {
                embedded.insert(name.to_string(), value);
            }
            None => {
                record.insert(column.name().to_string(), value);
            }
        }
    }

    if let Some(embed) = embed {
        // LEFT JOIN with no match yields all-null columns
        let joined = if embedded.values().all(Value::is_null) {
            Value::Null
        } else {
            Value::Object(embedded)
        };
        record.insert(embed.collection.clone(), joined);
    }

    Ok(record)
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Record>, StoreError> {
        let (sql, binds) = build_select(query)?;

        let mut statement = sqlx::query(&sql);
        for value in binds {
            statement = bind_value(statement, value);
        }

        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row_to_record(row, query.embed.as_ref()))
            .collect()
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        validate_identifier(collection)?;
        if record.is_empty() {
            return Err(StoreError::InvalidQuery("insert without columns".to_string()));
        }
        for column in record.keys() {
            validate_identifier(column)?;
        }

        let columns: Vec<String> = record.keys().map(|c| format!("\"{}\"", c)).collect();
        let placeholders = vec!["?"; record.len()].join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING *",
            collection,
            columns.join(", "),
            placeholders
        );

        let mut statement = sqlx::query(&sql);
        for value in record.values() {
            statement = bind_value(statement, value);
        }

        let row = statement.fetch_one(&self.pool).await?;
        row_to_record(&row, None)
    }

    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> Result<u64, StoreError> {
        validate_identifier(collection)?;
        if patch.is_empty() {
            return Err(StoreError::InvalidQuery("update without columns".to_string()));
        }
        if filters.is_empty() {
            return Err(StoreError::InvalidQuery("update without filter".to_string()));
        }
        for column in patch.keys().chain(filters.iter().map(|f| &f.column)) {
            validate_identifier(column)?;
        }

        let assignments: Vec<String> = patch.keys().map(|c| format!("\"{}\" = ?", c)).collect();
        let (where_clause, binds) = build_where(filters, "");
        let sql = format!(
            "UPDATE \"{}\" SET {}{}",
            collection,
            assignments.join(", "),
            where_clause
        );

        let mut statement = sqlx::query(&sql);
        for value in patch.values().chain(binds) {
            statement = bind_value(statement, value);
        }

        let result = statement.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        validate_identifier(collection)?;
        if filters.is_empty() {
            return Err(StoreError::InvalidQuery("delete without filter".to_string()));
        }
        for filter in filters {
            validate_identifier(&filter.column)?;
        }

        let (where_clause, binds) = build_where(filters, "");
        let sql = format!("DELETE FROM \"{}\"{}", collection, where_clause);

        let mut statement = sqlx::query(&sql);
        for value in binds {
            statement = bind_value(statement, value);
        }

        let result = statement.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
