use std::collections::HashMap;

use crate::config::AppConfig;
use crate::db::TenantStore;
use crate::phone::normalize_phone;

/// Maps the number a call was placed to onto the business that owns it.
///
/// Resolution order, first hit wins:
/// 1. a business whose registered phone matches (after E.164 normalization)
/// 2. the configured routing table
/// 3. the configured demo number, which routes to the newest business
/// 4. the configured default business
///
/// Store errors never escape; they fall through to the default.
#[derive(Debug, Clone, Default)]
pub struct TenantResolver {
    routes: HashMap<String, String>,
    demo_number: Option<String>,
    default_business_id: Option<String>,
}

impl TenantResolver {
    pub fn new(
        routes: HashMap<String, String>,
        demo_number: Option<&str>,
        default_business_id: Option<String>,
    ) -> Self {
        Self {
            routes,
            demo_number: demo_number.and_then(normalize_phone),
            default_business_id,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.tenant_routes.clone(),
            config.demo_phone_number.as_deref(),
            config.default_business_id.clone(),
        )
    }

    pub async fn resolve(&self, store: &dyn TenantStore, phone: Option<&str>) -> Option<String> {
        let Some(phone) = phone.and_then(normalize_phone) else {
            tracing::info!("no usable destination number, using default business");
            return self.fallback();
        };

        match store.find_business_by_phone(&phone).await {
            Ok(Some(business)) => {
                tracing::info!(phone = %phone, business_id = %business.id, "resolved business by phone");
                return Some(business.id);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, phone = %phone, "business phone lookup failed");
                return self.fallback();
            }
        }

        if let Some(business_id) = self.routes.get(&phone) {
            tracing::info!(phone = %phone, business_id = %business_id, "resolved business from routing table");
            return Some(business_id.clone());
        }

        if self.demo_number.as_deref() == Some(phone.as_str()) {
            match store.latest_business().await {
                Ok(Some(business)) => {
                    tracing::info!(business_id = %business.id, "demo number routed to latest business");
                    return Some(business.id);
                }
                Ok(None) => {}
                Err(e) => tracing::error!(error = %e, "latest business lookup failed"),
            }
        }

        tracing::info!(phone = %phone, "no business matched, using default business");
        self.fallback()
    }

    fn fallback(&self) -> Option<String> {
        if self.default_business_id.is_none() {
            tracing::warn!("no default business configured");
        }
        self.default_business_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_business, setup_db};
    use crate::db::SqliteStore;

    fn store_with(businesses: &[(&str, Option<&str>)]) -> SqliteStore {
        let conn = setup_db();
        for (id, phone) in businesses {
            seed_business(&conn, id, id, *phone);
        }
        SqliteStore::new(conn)
    }

    fn resolver() -> TenantResolver {
        let mut routes = HashMap::new();
        routes.insert("+15555550177".to_string(), "biz-routed".to_string());
        TenantResolver::new(routes, Some("+1 555 555 0199"), Some("biz-default".to_string()))
    }

    #[tokio::test]
    async fn test_exact_phone_match_wins() {
        let store = store_with(&[("biz-1", Some("+15555550100"))]);
        let id = resolver().resolve(&store, Some("+15555550100")).await;
        assert_eq!(id.as_deref(), Some("biz-1"));
    }

    #[tokio::test]
    async fn test_formatting_differences_still_match() {
        let store = store_with(&[("biz-1", Some("555-555-0100"))]);
        let id = resolver().resolve(&store, Some("+1 (555) 555-0100")).await;
        assert_eq!(id.as_deref(), Some("biz-1"));
    }

    #[tokio::test]
    async fn test_routing_table() {
        let store = store_with(&[]);
        let id = resolver().resolve(&store, Some("5555550177")).await;
        assert_eq!(id.as_deref(), Some("biz-routed"));
    }

    #[tokio::test]
    async fn test_demo_number_routes_to_latest_business() {
        let store = store_with(&[("biz-a", None), ("biz-b", None)]);
        let id = resolver().resolve(&store, Some("+15555550199")).await;
        assert_eq!(id.as_deref(), Some("biz-b"));
    }

    #[tokio::test]
    async fn test_unmatched_number_uses_default() {
        let store = store_with(&[("biz-1", Some("+15555550100"))]);
        let id = resolver().resolve(&store, Some("+15555550123")).await;
        assert_eq!(id.as_deref(), Some("biz-default"));
    }

    #[tokio::test]
    async fn test_missing_phone_uses_default() {
        let store = store_with(&[("biz-1", Some("+15555550100"))]);
        assert_eq!(resolver().resolve(&store, None).await.as_deref(), Some("biz-default"));
        assert_eq!(resolver().resolve(&store, Some("  ")).await.as_deref(), Some("biz-default"));
    }

    #[tokio::test]
    async fn test_no_default_configured() {
        let store = store_with(&[]);
        let resolver = TenantResolver::new(HashMap::new(), None, None);
        assert!(resolver.resolve(&store, Some("+15555550123")).await.is_none());
    }
}
