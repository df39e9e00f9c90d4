use std::sync::Arc;

use gallery_common::ingest::ImageGuard;
use gallery_common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::gate::AdminGate;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub guard: ImageGuard,
    pub gate: AdminGate,
    pub config: AppConfig,
}
