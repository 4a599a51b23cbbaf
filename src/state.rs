use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    session_key: Key,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config.database_url).await?;
        let session_key = config.session_key()?;
        Ok(Self {
            db,
            config,
            session_key,
        })
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let session_key = config.session_key()?;
        Ok(Self {
            db,
            config,
            session_key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.session_key.clone()
    }
}
