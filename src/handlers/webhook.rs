use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha1::Sha1;

use crate::errors::AppError;
use crate::models::WebhookEnvelope;
use crate::services::{dispatcher, template};
use crate::state::AppState;

const GREETING_TEMPLATE: &str = "Hello! Thank you for calling {BUSINESS_NAME}. How can I help you today?";
const GENERIC_GREETING: &str = "Hello! Thank you for calling. How can I help you today?";

/// base64(HMAC-SHA1(secret, body)), compared in constant time.
fn validate_signature(secret: &str, signature: &str, body: &[u8]) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        return false;
    };
    let mut mac = match Hmac::<Sha1>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

fn verify_request(secret: Option<&str>, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    // No secret configured: accept everything (local development).
    let Some(secret) = secret else {
        return Ok(());
    };

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if header("x-vapi-secret").is_some_and(|provided| constant_time_eq(provided, secret)) {
        return Ok(());
    }
    if header("x-vapi-signature").is_some_and(|sig| validate_signature(secret, sig, body)) {
        return Ok(());
    }

    tracing::warn!("webhook request failed authentication");
    Err(AppError::Unauthorized)
}

pub async fn vapi_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    verify_request(state.config.webhook_secret.as_deref(), &headers, &body)?;

    let envelope: WebhookEnvelope =
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidPayload(e.to_string()))?;

    let kind = envelope
        .message
        .as_ref()
        .and_then(|m| m.kind.as_deref())
        .unwrap_or("unknown");
    let call_id = envelope.call().and_then(|c| c.id.as_deref()).unwrap_or("");
    let phone = envelope.destination_phone();
    tracing::info!(kind, call_id, phone = ?phone, "incoming voice webhook");

    // 1. Resolve tenant
    let business_id = state
        .resolver
        .resolve(state.store.as_ref(), phone)
        .await
        .ok_or(AppError::TenantUnresolved)?;

    // 2. Validate it exists
    match state.store.get_business(&business_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(AppError::BusinessNotFound(business_id)),
        Err(e) => {
            tracing::error!(error = %e, business_id = %business_id, "business validation lookup failed");
            return Err(AppError::BusinessNotFound(business_id));
        }
    }

    let Some(mut message) = envelope.message else {
        return Ok(acknowledge(&business_id));
    };

    // 3. Tool calls, in request order
    let tool_calls = message.tool_calls();
    if !tool_calls.is_empty() {
        let mut results = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            let result = dispatcher::dispatch(
                &state,
                &call.function.name,
                call.function.arguments.clone(),
                &business_id,
            )
            .await;
            results.push(json!({ "toolCallId": call.id, "result": result }));
        }
        return Ok(Json(json!({ "results": results })).into_response());
    }

    // 4. Legacy single function call
    if let Some(function_call) = message.function_call.take() {
        let result = dispatcher::dispatch(
            &state,
            &function_call.name,
            function_call.parameters,
            &business_id,
        )
        .await;
        return Ok(Json(json!({ "result": result })).into_response());
    }

    // 5. Greeting
    if message.is_greeting() {
        let greeting = match state.contexts.get(&business_id).await {
            Some(ctx) => template::render(GREETING_TEMPLATE, &ctx).into_owned(),
            None => GENERIC_GREETING.to_string(),
        };
        return Ok(Json(json!({ "message": greeting })).into_response());
    }

    Ok(acknowledge(&business_id))
}

fn acknowledge(business_id: &str) -> Response {
    Json(json!({ "status": "received", "businessId": business_id })).into_response()
}
