use serde_json::Value;

use crate::services::context::BusinessContextCache;
use crate::services::template;

/// Fills business placeholders into a function result before it goes back to the
/// voice platform. Strings are rendered directly; objects have their `message`
/// field rendered. Anything else, or a business whose context can't be loaded,
/// passes through unchanged.
pub async fn inject(cache: &BusinessContextCache, response: Value, business_id: &str) -> Value {
    let needs_context = match &response {
        Value::String(text) => text.contains('{'),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|m| m.contains('{')),
        _ => false,
    };
    if !needs_context {
        return response;
    }

    let Some(ctx) = cache.get(business_id).await else {
        tracing::warn!(business_id, "no business context, returning response unmodified");
        return response;
    };

    match response {
        Value::String(text) => Value::String(template::render(&text, &ctx).into_owned()),
        Value::Object(mut map) => {
            if let Some(Value::String(message)) = map.get_mut("message") {
                let rendered = template::render(message, &ctx).into_owned();
                *message = rendered;
            }
            Value::Object(map)
        }
        other => other,
    }
}
