//! LMS Admin - signup request review for department administrators.
//!
//! Prospective students submit signup requests; department admins approve
//! or reject them. Persistence is delegated to a record store: the hosted
//! REST backend or a local SQLite file.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use config::{AppConfig, StoreBackend};
use error::AppError;
use services::http_api::ApiState;
use services::http_server::start_server;
use services::{RecordStore, RestRecordStore, SignupRequestManager, SqliteRecordStore};
use std::sync::Arc;

/// Build the configured record store, or `None` when no backend is set.
pub async fn connect_store(config: &AppConfig) -> Result<Option<Arc<dyn RecordStore>>, AppError> {
    let store: Arc<dyn RecordStore> = match &config.store {
        StoreBackend::Rest(rest) => {
            log::info!("[store] Using hosted record store at {}", rest.base_url);
            Arc::new(RestRecordStore::new(rest.clone())?)
        }
        StoreBackend::Sqlite(path) => Arc::new(SqliteRecordStore::open(path).await?),
        StoreBackend::Unconfigured => {
            log::warn!("[store] No record store configured. Signup features will be disabled.");
            return Ok(None);
        }
    };
    Ok(Some(store))
}

/// Run the API server until Ctrl-C.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let store = connect_store(&config).await?;
    let requests = SignupRequestManager::from_optional(store).with_guard(config.transition_guard());

    let handle = start_server(config.bind_address()?, ApiState::new(requests)).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::internal(format!("Failed to listen for shutdown signal: {}", e)))?;

    handle.shutdown().await;
    Ok(())
}
