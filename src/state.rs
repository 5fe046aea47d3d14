use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::TenantStore;
use crate::services::context::BusinessContextCache;
use crate::services::tenant::TenantResolver;

pub struct AppState {
    pub store: Arc<dyn TenantStore>,
    pub config: AppConfig,
    pub resolver: TenantResolver,
    pub contexts: BusinessContextCache,
}

impl AppState {
    pub fn new(store: Arc<dyn TenantStore>, config: AppConfig) -> Self {
        let resolver = TenantResolver::from_config(&config);
        let contexts = BusinessContextCache::new(Arc::clone(&store), config.context_cache_ttl);
        Self {
            store,
            config,
            resolver,
            contexts,
        }
    }
}
