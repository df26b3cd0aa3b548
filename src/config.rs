//! Configuration from environment variables.
//!
//! | Variable                 | Default     |
//! |--------------------------|-------------|
//! | `LMS_STORE_URL`          | unset       |
//! | `LMS_STORE_KEY`          | unset       |
//! | `LMS_DATABASE_PATH`      | unset       |
//! | `LMS_STORE_TIMEOUT_SECS` | `30`        |
//! | `LMS_GUARD_TRANSITIONS`  | `false`     |
//! | `LMS_HOST`               | `127.0.0.1` |
//! | `LMS_PORT`               | `6767`      |
//!
//! The hosted store needs both URL and key and wins over the local database.

use crate::error::AppError;
use crate::services::rest_store::RestStoreConfig;
use crate::services::signup_requests::TransitionGuard;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Which record store backs the gateway.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Hosted REST endpoint.
    Rest(RestStoreConfig),
    /// Local SQLite file.
    Sqlite(PathBuf),
    /// No store; every operation reports "Database not configured".
    Unconfigured,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub guard_transitions: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6767,
            store: StoreBackend::Unconfigured,
            guard_transitions: false,
        }
    }
}

impl AppConfig {
    /// Load config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let timeout_secs = get("LMS_STORE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(RestStoreConfig::default().timeout_secs);

        let store = match (get("LMS_STORE_URL"), get("LMS_STORE_KEY"), get("LMS_DATABASE_PATH")) {
            (Some(base_url), Some(api_key), _) => StoreBackend::Rest(RestStoreConfig {
                base_url,
                api_key,
                timeout_secs,
            }),
            (_, _, Some(path)) => StoreBackend::Sqlite(PathBuf::from(path)),
            _ => StoreBackend::Unconfigured,
        };

        Self {
            host: get("LMS_HOST").unwrap_or(defaults.host),
            port: get("LMS_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            store,
            guard_transitions: get("LMS_GUARD_TRANSITIONS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(defaults.guard_transitions),
        }
    }

    /// Socket address to bind.
    pub fn bind_address(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                AppError::invalid_input_field(
                    format!("Invalid bind address {}:{}", self.host, self.port),
                    "LMS_HOST",
                )
            })
    }

    pub fn transition_guard(&self) -> TransitionGuard {
        if self.guard_transitions {
            TransitionGuard::PendingOnly
        } else {
            TransitionGuard::Unguarded
        }
    }
}
