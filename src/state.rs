use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    storage::UploadStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> Self {
        let uploads = UploadStore::new(&config.upload_dir, &config.public_upload_base);
        Self {
            pool,
            orm,
            config: Arc::new(config),
            uploads,
        }
    }
}
