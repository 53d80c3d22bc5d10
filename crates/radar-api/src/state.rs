use std::path::PathBuf;
use std::sync::Arc;

use radar_db::Database;

use crate::error::ApiResult;
use crate::metrics::Metrics;
use crate::scan::VirusScanner;
use crate::storage::MediaStore;

/// Settings the router needs; the binary fills these from the environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Scanner binary; `None` disables virus scanning.
    pub scan_command: Option<String>,
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub storage: MediaStore,
    pub scanner: VirusScanner,
    pub metrics: Metrics,
    pub max_upload_bytes: usize,
}

pub async fn build_state(db: Database, config: ApiConfig) -> anyhow::Result<AppState> {
    let storage = MediaStore::new(config.upload_dir).await?;
    Ok(Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        token_ttl: chrono::Duration::days(config.token_ttl_days),
        storage,
        scanner: VirusScanner::new(config.scan_command),
        metrics: Metrics::default(),
        max_upload_bytes: config.max_upload_bytes,
    }))
}

/// Run a database closure off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let out = tokio::task::spawn_blocking(move || f(&state.db)).await??;
    Ok(out)
}
