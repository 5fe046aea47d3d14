use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::phone::normalize_phone;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub webhook_secret: Option<String>,
    /// Inbound number (E.164) to business id.
    pub tenant_routes: HashMap<String, String>,
    pub demo_phone_number: Option<String>,
    pub default_business_id: Option<String>,
    pub context_cache_ttl: Duration,
    pub response_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "callrouter.db".to_string()),
            webhook_secret: non_empty_var("WEBHOOK_SECRET"),
            tenant_routes: env::var("TENANT_ROUTES")
                .map(|v| parse_tenant_routes(&v))
                .unwrap_or_default(),
            demo_phone_number: non_empty_var("DEMO_PHONE_NUMBER"),
            default_business_id: non_empty_var("DEFAULT_BUSINESS_ID"),
            context_cache_ttl: Duration::from_secs(
                env::var("CONTEXT_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(300),
            ),
            response_timeout: Duration::from_millis(
                env::var("RESPONSE_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(4000),
            ),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parses `+15555550100=biz-1,+15555550101=biz-2`. Malformed entries are skipped with a warning.
pub fn parse_tenant_routes(raw: &str) -> HashMap<String, String> {
    let mut routes = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((phone, business_id)) = entry.split_once('=') else {
            tracing::warn!(entry, "ignoring tenant route without '='");
            continue;
        };
        let business_id = business_id.trim();
        match normalize_phone(phone) {
            Some(phone) if !business_id.is_empty() => {
                routes.insert(phone, business_id.to_string());
            }
            _ => tracing::warn!(entry, "ignoring malformed tenant route"),
        }
    }
    routes
}
