use std::sync::Arc;

use anyhow::anyhow;
use tera::Tera;
use tracing::error;

use codelens_ai::AiGateway;
use codelens_db::Database;

use crate::error::ApiError;
use crate::pages;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub session_secret: String,
    pub gateway: AiGateway,
    pub templates: Tera,
}

impl AppStateInner {
    pub fn new(db: Database, session_secret: String, gateway: AiGateway) -> anyhow::Result<AppState> {
        Ok(Arc::new(Self {
            db,
            session_secret,
            gateway,
            templates: pages::templates()?,
        }))
    }
}

/// Run blocking DB or hashing work off the async runtime.
pub async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("background task failed"))
        })?
        .map_err(ApiError::Internal)
}
