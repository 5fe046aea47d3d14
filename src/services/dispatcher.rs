use serde_json::{json, Map, Value};

use crate::services::appointments::{self, CancelArgs, LookupArgs};
use crate::services::availability::{self, AvailabilityArgs};
use crate::services::booking::{self, BookingArgs};
use crate::services::injector;
use crate::state::AppState;

/// A function invocation from the voice platform, resolved to a known handler.
#[derive(Debug)]
pub enum FunctionCall {
    CheckAvailability(AvailabilityArgs),
    BookAppointment(BookingArgs),
    CheckAppointments(LookupArgs),
    CancelAppointment(CancelArgs),
    Unknown(String),
}

impl FunctionCall {
    /// Arguments may arrive as an object or as a JSON-encoded string.
    pub fn parse(name: &str, arguments: Value) -> Result<Self, serde_json::Error> {
        let arguments = normalize_arguments(arguments);
        let call = match name {
            "check_availability" => Self::CheckAvailability(serde_json::from_value(arguments)?),
            "book_appointment" => Self::BookAppointment(serde_json::from_value(arguments)?),
            "check_appointments" => Self::CheckAppointments(serde_json::from_value(arguments)?),
            "cancel_appointment" => Self::CancelAppointment(serde_json::from_value(arguments)?),
            other => Self::Unknown(other.to_string()),
        };
        Ok(call)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::CheckAvailability(_) => "check_availability",
            Self::BookAppointment(_) => "book_appointment",
            Self::CheckAppointments(_) => "check_appointments",
            Self::CancelAppointment(_) => "cancel_appointment",
            Self::Unknown(name) => name.as_str(),
        }
    }
}

fn normalize_arguments(arguments: Value) -> Value {
    match arguments {
        Value::Null => Value::Object(Map::new()),
        Value::String(raw) if raw.trim().is_empty() => Value::Object(Map::new()),
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        other => other,
    }
}

/// Runs one function call for the business and fills business placeholders into
/// the result. Never fails: handler errors and timeouts become spoken failures,
/// returned without placeholder injection.
pub async fn dispatch(state: &AppState, name: &str, arguments: Value, business_id: &str) -> Value {
    let call = match FunctionCall::parse(name, arguments) {
        Ok(call) => call,
        Err(e) => {
            tracing::warn!(error = %e, function = name, business_id, "invalid function arguments");
            return json!({
                "success": false,
                "error": "invalid_arguments",
                "message": "I'm sorry, I didn't quite get those details. Could you say them again?",
            });
        }
    };

    tracing::info!(function = call.name(), business_id, "dispatching function call");

    let outcome =
        tokio::time::timeout(state.config.response_timeout, execute(state, call, business_id)).await;

    match outcome {
        Ok(Ok(result)) => injector::inject(&state.contexts, result, business_id).await,
        Ok(Err(e)) => {
            tracing::error!(error = ?e, function = name, business_id, "function handler failed");
            json!({
                "success": false,
                "error": "handler_error",
                "message": "I'm sorry, something went wrong on my end. Could you try that again?",
            })
        }
        Err(_) => {
            tracing::warn!(function = name, business_id, timeout = ?state.config.response_timeout, "function call timed out");
            json!({
                "success": false,
                "error": "timeout",
                "message": "I'm sorry, that's taking longer than expected. Could you give me a moment and ask again?",
            })
        }
    }
}

async fn execute(state: &AppState, call: FunctionCall, business_id: &str) -> anyhow::Result<Value> {
    let store = state.store.as_ref();
    match call {
        FunctionCall::CheckAvailability(args) => {
            availability::check_availability(store, &state.contexts, args, business_id).await
        }
        FunctionCall::BookAppointment(args) => {
            let result = booking::book_appointment(store, args, business_id).await;
            Ok(serde_json::to_value(result)?)
        }
        FunctionCall::CheckAppointments(args) => {
            appointments::check_appointments(store, &state.contexts, args, business_id).await
        }
        FunctionCall::CancelAppointment(args) => Ok(appointments::cancel_appointment(args, business_id)),
        FunctionCall::Unknown(name) => {
            tracing::warn!(function = %name, business_id, "unknown function");
            Ok(json!({ "error": "Unknown function" }))
        }
    }
}
