use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::storage::media::MediaStorage;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub media: MediaStorage,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool, media: MediaStorage) -> Self {
        Self { config, db, media }
    }
}
