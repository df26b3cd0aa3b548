//! Hosted record store client.
//!
//! Speaks the PostgREST dialect used by the hosted database service:
//! `GET/POST/PATCH/DELETE {base}/rest/v1/{collection}` with filters such as
//! `department_id=eq.CS-1` in the query string.

use crate::error::AppError;
use crate::services::record_store::{
    validate_identifier, Direction, Filter, Record, RecordStore, SelectQuery, StoreError,
};
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Hosted record store configuration.
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,

    /// Anonymous API key, sent both as `apikey` and as bearer token.
    pub api_key: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Record store backed by the hosted REST endpoint.
#[derive(Debug, Clone)]
pub struct RestRecordStore {
    client: Client,
    config: RestStoreConfig,
}

impl RestRecordStore {
    /// Create a new client with the key installed as default headers.
    pub fn new(config: RestStoreConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();

        let key_value = header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| AppError::invalid_input_field("Invalid store key format", "api_key"))?;
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| AppError::invalid_input_field("Invalid store key format", "api_key"))?;
        headers.insert("apikey", key_value);
        headers.insert(header::AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// URL of a collection endpoint.
    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            collection
        )
    }

    /// Turn an API response into a typed value or a store error.
    async fn handle_response<T: DeserializeOwned>(
        response: Response,
        collection: &str,
    ) -> Result<T, StoreError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| StoreError::Decode(format!("{}: {}", collection, e)))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(StoreError::Remote {
                message: error_message(status, &body),
                status: Some(status.as_u16()),
            })
        }
    }
}

/// Query string for a read.
fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let select = match &query.embed {
        Some(embed) => format!("*,{}({})", embed.collection, embed.columns.join(",")),
        None => "*".to_string(),
    };

    let mut params = vec![("select".to_string(), select)];
    params.extend(filter_params(&query.filters));

    if let Some(order) = &query.order {
        let direction = match order.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|filter| {
            let operand = match &filter.value {
                Value::Null => "is.null".to_string(),
                Value::String(s) => format!("eq.{}", s),
                other => format!("eq.{}", other),
            };
            (filter.column.clone(), operand)
        })
        .collect()
}

/// Extract a human-readable message from an error body.
///
/// PostgREST answers `{"message": ..., "code": ..., "details": ...}`; the auth
/// gateway in front of it answers `{"error": ...}` or `{"msg": ...}`.
fn error_message(status: StatusCode, body: &str) -> String {
    let body_message = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["message", "error", "msg"]
            .iter()
            .find_map(|key| v.get(*key))
            .map(|m| match m.as_str() {
                Some(s) => s.to_string(),
                None => m.to_string(),
            })
    });

    match (status, body_message) {
        (_, Some(msg)) => msg,
        (StatusCode::UNAUTHORIZED, None) => "Invalid API key".to_string(),
        (StatusCode::NOT_FOUND, None) => "Collection not found".to_string(),
        _ => format!("Request failed ({}): {}", status.as_u16(), body),
    }
}

#[async_trait]
impl RecordStore for RestRecordStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Record>, StoreError> {
        query.validate()?;

        let response = self
            .client
            .get(self.collection_url(&query.collection))
            .query(&select_params(query))
            .send()
            .await?;

        Self::handle_response(response, &query.collection).await
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        validate_identifier(collection)?;

        let response = self
            .client
            .post(self.collection_url(collection))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;

        let mut rows: Vec<Record> = Self::handle_response(response, collection).await?;
        if rows.is_empty() {
            return Err(StoreError::Decode(format!(
                "{}: insert returned no rows",
                collection
            )));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> Result<u64, StoreError> {
        validate_identifier(collection)?;
        if filters.is_empty() {
            return Err(StoreError::InvalidQuery("update without filter".to_string()));
        }
        for filter in filters {
            validate_identifier(&filter.column)?;
        }

        let response = self
            .client
            .patch(self.collection_url(collection))
            .query(&filter_params(filters))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;

        let rows: Vec<Record> = Self::handle_response(response, collection).await?;
        Ok(rows.len() as u64)
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        validate_identifier(collection)?;
        if filters.is_empty() {
            return Err(StoreError::InvalidQuery("delete without filter".to_string()));
        }
        for filter in filters {
            validate_identifier(&filter.column)?;
        }

        let response = self
            .client
            .delete(self.collection_url(collection))
            .query(&filter_params(filters))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<Record> = Self::handle_response(response, collection).await?;
        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(params: &[(String, String)]) -> Vec<(&str, &str)> {
        params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    #[test]
    fn test_select_params_with_embed_filter_and_order() {
        let query = SelectQuery::from("signup_requests")
            .eq("department_id", "CS-1")
            .order_by("created_at", Direction::Descending)
            .embed("departments", "department_id", &["name", "code"]);

        assert_eq!(
            pairs(&select_params(&query)),
            vec![
                ("select", "*,departments(name,code)"),
                ("department_id", "eq.CS-1"),
                ("order", "created_at.desc"),
            ]
        );
    }

    #[test]
    fn test_filter_params_non_string_values() {
        let filters = vec![
            Filter::eq("reviewed_by", Value::Null),
            Filter::eq("is_active", true),
            Filter::eq("limit_hint", 3),
        ];
        assert_eq!(
            pairs(&filter_params(&filters)),
            vec![
                ("reviewed_by", "is.null"),
                ("is_active", "eq.true"),
                ("limit_hint", "eq.3"),
            ]
        );
    }

    #[test]
    fn test_error_message_prefers_body() {
        let body = json!({"message": "new row violates row-level security policy", "code": "42501"});
        assert_eq!(
            error_message(StatusCode::FORBIDDEN, &body.to_string()),
            "new row violates row-level security policy"
        );
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"msg": "JWT expired"}"#),
            "JWT expired"
        );
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(StatusCode::UNAUTHORIZED, ""), "Invalid API key");
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream down"),
            "Request failed (502): upstream down"
        );
    }

    #[test]
    fn test_collection_url_trims_slash() {
        let store = RestRecordStore::new(RestStoreConfig {
            base_url: "https://example.supabase.co/".to_string(),
            api_key: "anon-key".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            store.collection_url("signup_requests"),
            "https://example.supabase.co/rest/v1/signup_requests"
        );
    }

    #[test]
    fn test_rejects_key_with_newline() {
        let result = RestRecordStore::new(RestStoreConfig {
            base_url: "https://example.supabase.co".to_string(),
            api_key: "bad\nkey".to_string(),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}
