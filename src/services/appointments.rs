use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::TenantStore;
use crate::phone::normalize_phone;
use crate::services::context::BusinessContextCache;
use crate::services::scheduling;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LookupArgs {
    #[serde(alias = "phone")]
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CancelArgs {
    #[serde(alias = "booking_id")]
    pub appointment_id: Option<String>,
    pub customer_phone: Option<String>,
}

/// Reads back a caller's upcoming appointments with this business. "Upcoming"
/// starts from today in the business's own timezone.
pub async fn check_appointments(
    store: &dyn TenantStore,
    contexts: &BusinessContextCache,
    args: LookupArgs,
    business_id: &str,
) -> anyhow::Result<Value> {
    let Some(raw_phone) = args.customer_phone.as_deref().filter(|p| !p.trim().is_empty()) else {
        return Ok(json!({
            "success": false,
            "error": "missing_fields",
            "message": "I can look that up for you. What phone number is the appointment under?",
        }));
    };
    let Some(phone) = normalize_phone(raw_phone) else {
        return Ok(json!({
            "success": false,
            "error": "invalid_phone",
            "message": "I'm sorry, I didn't get a valid phone number. Could you repeat it for me, including the area code?",
        }));
    };

    let now = chrono::Utc::now();
    let today = match contexts.get(business_id).await {
        Some(ctx) => scheduling::today_in(&ctx.business.timezone, now),
        None => now.date_naive(),
    };
    let upcoming = store.upcoming_appointments(business_id, &phone, today).await?;

    let message = if upcoming.is_empty() {
        "I don't see any upcoming appointments under that number. Would you like to book one?".to_string()
    } else {
        let described: Vec<String> = upcoming
            .iter()
            .map(|a| {
                let what = a
                    .service_name
                    .as_deref()
                    .map(|s| format!("your {s} appointment"))
                    .unwrap_or_else(|| "an appointment".to_string());
                let at = scheduling::parse_time(&a.start_time)
                    .map(scheduling::spoken_time)
                    .unwrap_or_else(|_| a.start_time.clone());
                format!("{what} on {} at {at}", scheduling::spoken_date(a.date))
            })
            .collect();
        let noun = if upcoming.len() == 1 { "appointment" } else { "appointments" };
        format!(
            "I found {} upcoming {noun}: {}.",
            upcoming.len(),
            described.join("; ")
        )
    };

    Ok(json!({
        "success": true,
        "appointments": upcoming,
        "message": message,
    }))
}

/// Cancellation over the phone isn't supported; the caller is pointed to the business.
pub fn cancel_appointment(args: CancelArgs, business_id: &str) -> Value {
    tracing::info!(
        business_id,
        appointment_id = ?args.appointment_id,
        "cancellation requested but not supported"
    );
    json!({
        "success": false,
        "error": "cancellation_unavailable",
        "message": "I'm sorry, I'm not able to cancel appointments over the phone yet. Please contact {BUSINESS_NAME} directly and they'll take care of it for you.",
    })
}
