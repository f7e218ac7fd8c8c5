use crate::cache::ListingCache;
use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{ContentSummary, ItemType};
use crate::selection::SelectionStore;
use crate::services::backend_client::BackendClient;
use crate::services::bulk::BulkMutator;
use crate::services::clock::Clock;
use crate::services::importer::Importer;
use crate::services::progress::ProgressTracker;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub backend: BackendClient,
    pub imports: Arc<ProgressTracker>,
    pub cache: Arc<ListingCache>,
    pub selections: Arc<SelectionStore>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let backend = BackendClient::from_config(&config)?.with_audit(db.clone());
        let imports = Arc::new(ProgressTracker::new(clock, config.close_delay));

        Ok(Self {
            db,
            config: Arc::new(config),
            backend,
            imports,
            cache: Arc::new(ListingCache::new()),
            selections: Arc::new(SelectionStore::new()),
        })
    }

    pub fn importer(&self) -> Importer {
        Importer::new(
            self.backend.clone(),
            self.imports.clone(),
            self.cache.clone(),
        )
    }

    pub fn bulk(&self) -> BulkMutator {
        BulkMutator::new(
            self.backend.clone(),
            self.cache.clone(),
            self.selections.clone(),
        )
    }

    pub async fn cached_listing(&self, item_type: ItemType) -> AppResult<Vec<ContentSummary>> {
        self.cache.load(&self.backend, item_type).await
    }
}
