//! Store construction at process start

use log::warn;
use std::sync::Arc;

use crate::core::config::{StoreBackend, StoreConfig};
use crate::store::{DocumentStore, MemoryDocumentStore, StoreError};

pub fn bootstrap_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store; flows will be lost on shutdown");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        StoreBackend::Postgres => bootstrap_postgres(config),
    }
}

#[cfg(feature = "postgres")]
fn bootstrap_postgres(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    use crate::core::shared::utils::create_conn;
    use crate::store::{ensure_schema, PgDocumentStore};

    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| StoreError::Unavailable("DATABASE_URL is not set".to_string()))?;
    let pool = create_conn(url, config.pool_size)?;
    ensure_schema(&pool)?;
    log::info!("Connected to Postgres store (pool size {})", config.pool_size);
    Ok(Arc::new(PgDocumentStore::new(pool)))
}

#[cfg(not(feature = "postgres"))]
fn bootstrap_postgres(_config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    Err(StoreError::Unavailable(
        "built without the postgres feature; set STORE_BACKEND=memory".to_string(),
    ))
}
