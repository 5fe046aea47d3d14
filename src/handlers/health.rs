use axum::Json;
use serde_json::{json, Value};

pub const FEATURES: [&str; 5] = [
    "multi_tenant_routing",
    "business_context_injection",
    "appointment_booking",
    "availability_check",
    "appointment_lookup",
];

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "features": FEATURES,
    }))
}
