use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::db::TenantStore;
use crate::models::BusinessContext;

struct CachedContext {
    context: Arc<BusinessContext>,
    fetched_at: Instant,
}

/// Pull-through cache of per-business context (profile, services, staff, hours).
///
/// Entries are refreshed once older than the TTL. Writes made elsewhere are not
/// seen until then; there is no invalidation.
pub struct BusinessContextCache {
    store: Arc<dyn TenantStore>,
    ttl: Duration,
    entries: DashMap<String, CachedContext>,
}

impl BusinessContextCache {
    pub fn new(store: Arc<dyn TenantStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Returns the context for `business_id`, or `None` when the business can't be loaded.
    pub async fn get(&self, business_id: &str) -> Option<Arc<BusinessContext>> {
        let cached = self
            .entries
            .get(business_id)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.context));

        if let Some(context) = cached {
            tracing::debug!(business_id, "business context cache hit");
            return Some(context);
        }

        tracing::debug!(business_id, "business context cache miss");
        match self.fetch(business_id).await {
            Ok(Some(context)) => {
                let context = Arc::new(context);
                self.entries.insert(
                    business_id.to_string(),
                    CachedContext {
                        context: Arc::clone(&context),
                        fetched_at: Instant::now(),
                    },
                );
                Some(context)
            }
            Ok(None) => {
                tracing::warn!(business_id, "business not found while loading context");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, business_id, "failed to load business context");
                None
            }
        }
    }

    async fn fetch(&self, business_id: &str) -> anyhow::Result<Option<BusinessContext>> {
        let Some(business) = self.store.get_business(business_id).await? else {
            return Ok(None);
        };
        let services = self.store.active_services(business_id).await?;
        let staff = self.store.active_staff(business_id).await?;
        let business_hours = self.store.business_hours(business_id).await?;

        Ok(Some(BusinessContext {
            business,
            services,
            staff,
            business_hours,
        }))
    }
}
