use std::sync::Arc;

use crate::config::Settings;
use crate::domain::ingest::DocumentReconciler;
use crate::domain::search::{MappingSummaryCache, SearchConfig, SearchService};
use crate::domain::store::{DocumentStore, IndexNames};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DocumentStore>,
    mapping_cache: Arc<MappingSummaryCache>,
    indices: IndexNames,
    webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, settings: &Settings) -> Self {
        let indices = IndexNames {
            tasks: settings.store.tasks_index.clone(),
            organizations: settings.store.organizations_index.clone(),
        };
        let mapping_cache = Arc::new(MappingSummaryCache::new(indices.all()));

        Self {
            store,
            mapping_cache,
            indices,
            webhook_secret: settings.application.webhook_secret.clone(),
        }
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn mapping_cache(&self) -> &MappingSummaryCache {
        &self.mapping_cache
    }

    pub fn indices(&self) -> &IndexNames {
        &self.indices
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook_secret.as_deref()
    }

    pub fn reconciler(&self) -> DocumentReconciler<Arc<dyn DocumentStore>> {
        DocumentReconciler::new(self.store.clone(), self.indices.clone())
    }

    pub fn search_service(&self) -> SearchService<Arc<dyn DocumentStore>> {
        SearchService::new(
            self.store.clone(),
            self.mapping_cache.clone(),
            self.indices.clone(),
            SearchConfig::default(),
        )
    }
}
