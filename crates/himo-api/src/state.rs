use std::sync::Arc;

use anyhow::anyhow;
use tracing::error;

use himo_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    db: Option<Database>,
}

impl AppStateInner {
    /// `None` means no store is configured; every handler then answers 500.
    pub fn new(db: Option<Database>) -> Self {
        Self { db }
    }

    pub fn store(&self) -> Result<&Database, ApiError> {
        self.db.as_ref().ok_or(ApiError::StoreNotConfigured)
    }
}

/// Run blocking store work off the async runtime.
pub async fn with_store<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(state.store()?))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("store task failed: {}", e))
        })?
}
