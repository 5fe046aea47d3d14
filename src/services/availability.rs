use chrono::NaiveTime;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::TenantStore;
use crate::services::booking::resolve_service;
use crate::services::context::BusinessContextCache;
use crate::services::scheduling::{self, DEFAULT_DURATION_MINUTES};

const MAX_SUGGESTIONS: usize = 3;
const MAX_LISTED_SLOTS: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AvailabilityArgs {
    #[serde(alias = "appointment_date")]
    pub date: Option<String>,
    #[serde(alias = "start_time")]
    pub time: Option<String>,
    pub service_type: Option<String>,
}

/// Answers whether a day (and optionally a time) has room for an appointment,
/// using the business hours from the context cache and the day's bookings.
pub async fn check_availability(
    store: &dyn TenantStore,
    contexts: &BusinessContextCache,
    args: AvailabilityArgs,
    business_id: &str,
) -> anyhow::Result<Value> {
    let Some(raw_date) = args.date.as_deref().filter(|d| !d.trim().is_empty()) else {
        return Ok(json!({
            "success": false,
            "error": "missing_fields",
            "message": "Sure, I can check that. What day would you like to come in?",
        }));
    };
    let date = match scheduling::parse_date(raw_date) {
        Ok(d) => d,
        Err(e) => return Ok(invalid_datetime(e)),
    };
    let requested = match args.time.as_deref().filter(|t| !t.trim().is_empty()) {
        Some(raw) => match scheduling::parse_time(raw) {
            Ok(t) => Some(t),
            Err(e) => return Ok(invalid_datetime(e)),
        },
        None => None,
    };

    let ctx = contexts
        .get(business_id)
        .await
        .ok_or_else(|| anyhow::anyhow!("business context unavailable for {business_id}"))?;

    let service = match args.service_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => resolve_service(store, business_id, term).await,
        None => None,
    };
    let duration = service
        .as_ref()
        .map(|s| s.duration_minutes)
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_DURATION_MINUTES);

    let spoken_date = scheduling::spoken_date(date);
    let date_str = date.format("%Y-%m-%d").to_string();

    let Some(window) = scheduling::opening_window(&ctx, date) else {
        return Ok(json!({
            "success": true,
            "available": false,
            "date": date_str,
            "available_slots": [],
            "message": format!("I'm sorry, we're closed on {}. Would another day work for you?", date.format("%A")),
        }));
    };

    // The previous day's late appointments can run past midnight into this one.
    let mut appointments = match date.pred_opt() {
        Some(previous) => store.appointments_on(business_id, previous).await?,
        None => vec![],
    };
    appointments.extend(store.appointments_on(business_id, date).await?);
    let slots = scheduling::open_slots(date, window, duration, &appointments);
    let slot_strings: Vec<String> = slots.iter().copied().map(scheduling::format_hhmm).collect();

    let (available, message) = match requested {
        Some(time) => {
            let fits = time >= window.0
                && scheduling::end_time(date, time, duration) <= date.and_time(window.1)
                && !scheduling::conflicts(date, time, duration, &appointments);
            let message = if fits {
                format!(
                    "Good news! {} on {spoken_date} is available. Would you like me to book it for you?",
                    scheduling::spoken_time(time)
                )
            } else if slots.is_empty() {
                format!("I'm sorry, we're fully booked on {spoken_date}. Would another day work for you?")
            } else {
                format!(
                    "I'm sorry, {} isn't available on {spoken_date}. I do have {}. Would any of those work?",
                    scheduling::spoken_time(time),
                    spoken_list(&suggestions(&slots, time), "or")
                )
            };
            (fits, message)
        }
        None => {
            let message = if slots.is_empty() {
                format!("I'm sorry, we're fully booked on {spoken_date}. Would another day work for you?")
            } else {
                let listed: Vec<NaiveTime> = slots.iter().copied().take(MAX_LISTED_SLOTS).collect();
                format!(
                    "On {spoken_date} we have openings at {}. What time works best for you?",
                    spoken_list(&listed, "and")
                )
            };
            (!slots.is_empty(), message)
        }
    };

    let mut result = json!({
        "success": true,
        "available": available,
        "date": date_str,
        "duration_minutes": duration,
        "available_slots": slot_strings,
        "message": message,
    });
    if let Some(time) = requested {
        result["requested_time"] = json!(scheduling::format_hhmm(time));
    }
    if let Some(service) = service {
        result["service"] = json!(service.name);
    }
    Ok(result)
}

/// Closest open slots at or after the requested time, then earlier ones.
fn suggestions(slots: &[NaiveTime], requested: NaiveTime) -> Vec<NaiveTime> {
    let mut picked: Vec<NaiveTime> = slots
        .iter()
        .copied()
        .filter(|s| *s >= requested)
        .take(MAX_SUGGESTIONS)
        .collect();
    if picked.len() < MAX_SUGGESTIONS {
        let earlier: Vec<NaiveTime> = slots.iter().copied().filter(|s| *s < requested).collect();
        let need = MAX_SUGGESTIONS - picked.len();
        picked.extend(earlier.into_iter().rev().take(need));
        picked.sort();
    }
    picked
}

fn spoken_list(times: &[NaiveTime], conjunction: &str) -> String {
    let spoken: Vec<String> = times.iter().copied().map(scheduling::spoken_time).collect();
    match spoken.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} {conjunction} {last}", init.join(", ")),
    }
}

fn invalid_datetime(e: scheduling::SchedulingError) -> Value {
    json!({
        "success": false,
        "error": "invalid_datetime",
        "message": e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::db::test_support::{seed_business, seed_hours, seed_service, setup_db};
    use crate::db::SqliteStore;
    use crate::services::booking::{book_appointment, BookingArgs};

    // 2025-06-15 is a Sunday, 2025-06-16 a Monday.
    fn setup() -> (Arc<SqliteStore>, BusinessContextCache) {
        let conn = setup_db();
        seed_business(&conn, "biz-1", "Glow Studio", None);
        seed_service(&conn, "svc-1", "biz-1", "Gel Manicure", 45, 45.0);
        seed_hours(&conn, "biz-1", 0, None, None);
        seed_hours(&conn, "biz-1", 1, Some("09:00"), Some("12:00"));
        let store = Arc::new(SqliteStore::new(conn));
        let cache = BusinessContextCache::new(store.clone(), Duration::from_secs(300));
        (store, cache)
    }

    fn args(date: &str, time: Option<&str>) -> AvailabilityArgs {
        AvailabilityArgs {
            date: Some(date.to_string()),
            time: time.map(str::to_string),
            service_type: None,
        }
    }

    async fn book(store: &SqliteStore, time: &str) {
        let result = book_appointment(
            store,
            BookingArgs {
                customer_name: Some("Jane Doe".to_string()),
                customer_phone: Some("+15551234567".to_string()),
                appointment_date: Some("2025-06-16".to_string()),
                start_time: Some(time.to_string()),
                ..Default::default()
            },
            "biz-1",
        )
        .await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_closed_day() {
        let (store, cache) = setup();
        let result = check_availability(store.as_ref(), &cache, args("2025-06-15", None), "biz-1")
            .await
            .unwrap();
        assert_eq!(result["available"], false);
        assert!(result["message"].as_str().unwrap().contains("closed on Sunday"));
    }

    #[tokio::test]
    async fn test_lists_open_slots() {
        let (store, cache) = setup();
        book(&store, "10:00").await;

        let result = check_availability(store.as_ref(), &cache, args("2025-06-16", None), "biz-1")
            .await
            .unwrap();
        assert_eq!(result["available"], true);
        assert_eq!(result["available_slots"], json!(["09:00", "11:00"]));
        assert_eq!(
            result["message"],
            "On Monday, June 16 we have openings at 9:00 AM and 11:00 AM. What time works best for you?"
        );
    }

    #[tokio::test]
    async fn test_requested_time_available() {
        let (store, cache) = setup();
        let result = check_availability(store.as_ref(), &cache, args("2025-06-16", Some("11:00")), "biz-1")
            .await
            .unwrap();
        assert_eq!(result["available"], true);
        assert_eq!(result["requested_time"], "11:00");
    }

    #[tokio::test]
    async fn test_requested_time_taken_offers_alternatives() {
        let (store, cache) = setup();
        book(&store, "10:00").await;

        let result = check_availability(store.as_ref(), &cache, args("2025-06-16", Some("10:30")), "biz-1")
            .await
            .unwrap();
        assert_eq!(result["available"], false);
        let message = result["message"].as_str().unwrap();
        assert!(message.contains("11:00 AM"));
        assert!(message.contains("9:00 AM"));
    }

    #[tokio::test]
    async fn test_service_duration_used() {
        let (store, cache) = setup();
        let result = check_availability(
            store.as_ref(),
            &cache,
            AvailabilityArgs {
                service_type: Some("manicure".to_string()),
                ..args("2025-06-16", Some("11:15"))
            },
            "biz-1",
        )
        .await
        .unwrap();
        // 11:15 + 45 minutes ends exactly at closing
        assert_eq!(result["available"], true);
        assert_eq!(result["duration_minutes"], 45);
        assert_eq!(result["service"], "Gel Manicure");
    }

    #[tokio::test]
    async fn test_missing_and_invalid_date() {
        let (store, cache) = setup();
        let missing = check_availability(store.as_ref(), &cache, AvailabilityArgs::default(), "biz-1")
            .await
            .unwrap();
        assert_eq!(missing["error"], "missing_fields");

        let invalid = check_availability(store.as_ref(), &cache, args("someday", None), "biz-1")
            .await
            .unwrap();
        assert_eq!(invalid["error"], "invalid_datetime");
    }

    #[tokio::test]
    async fn test_late_booking_blocks_early_next_day() {
        let conn = setup_db();
        seed_business(&conn, "biz-1", "Night Owl Tattoo", None);
        seed_hours(&conn, "biz-1", 1, Some("20:00"), Some("23:59"));
        seed_hours(&conn, "biz-1", 2, Some("00:00"), Some("02:00"));
        let store = Arc::new(SqliteStore::new(conn));
        let cache = BusinessContextCache::new(store.clone(), Duration::from_secs(300));

        // Monday 23:30 for the default hour ends 00:30 on Tuesday.
        book(&store, "23:30").await;

        let result = check_availability(store.as_ref(), &cache, args("2025-06-17", Some("00:00")), "biz-1")
            .await
            .unwrap();
        assert_eq!(result["available"], false);
        assert_eq!(result["available_slots"], json!(["00:30", "01:00"]));
    }

    #[tokio::test]
    async fn test_unknown_business_is_an_error() {
        let (store, cache) = setup();
        let result = check_availability(store.as_ref(), &cache, args("2025-06-16", None), "nope").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_suggestions_prefer_later_slots() {
        let t = |s: &str| scheduling::parse_time(s).unwrap();
        let slots = vec![t("09:00"), t("09:30"), t("13:00"), t("13:30"), t("14:00"), t("14:30")];
        assert_eq!(
            suggestions(&slots, t("12:00")),
            vec![t("13:00"), t("13:30"), t("14:00")]
        );
        assert_eq!(
            suggestions(&slots, t("14:15")),
            vec![t("13:30"), t("14:00"), t("14:30")]
        );
    }
}
