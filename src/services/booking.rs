use serde::{Deserialize, Serialize};

use crate::db::TenantStore;
use crate::models::{BookingRecord, Customer, NewBooking, Service};
use crate::phone::normalize_phone;
use crate::services::scheduling::{self, DEFAULT_DURATION_MINUTES};

/// Arguments of `book_appointment`. Everything is optional on the wire so that
/// missing fields can be asked for in conversation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingArgs {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub appointment_date: Option<String>,
    pub start_time: Option<String>,
    pub service_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment: Option<AppointmentSummary>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub id: String,
    pub customer_name: String,
    pub date: String,
    pub time: String,
    pub end_time: String,
    pub duration_minutes: i32,
    pub service: Option<String>,
    pub price: Option<f64>,
    pub status: String,
}

impl BookingResult {
    fn failure(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            booking_id: None,
            message: message.into(),
            appointment: None,
            duplicate: false,
            error: Some(error),
            details: None,
        }
    }
}

/// Books a pending appointment for the caller.
///
/// Validation and date/time problems come back as spoken prompts; persistence
/// failures are logged and replaced with a generic apology.
pub async fn book_appointment(
    store: &dyn TenantStore,
    args: BookingArgs,
    business_id: &str,
) -> BookingResult {
    let missing = missing_fields(&args);
    if !missing.is_empty() {
        tracing::info!(business_id, ?missing, "booking request missing fields");
        return BookingResult::failure("missing_fields", missing_fields_prompt(&missing));
    }

    let name = args.customer_name.as_deref().unwrap_or_default().trim();
    let raw_phone = args.customer_phone.as_deref().unwrap_or_default();
    let Some(phone) = normalize_phone(raw_phone) else {
        return BookingResult::failure(
            "invalid_phone",
            "I'm sorry, I didn't get a valid phone number. Could you repeat it for me, including the area code?",
        );
    };

    let date = match scheduling::parse_date(args.appointment_date.as_deref().unwrap_or_default()) {
        Ok(d) => d,
        Err(e) => return BookingResult::failure("invalid_datetime", e.to_string()),
    };
    let start = match scheduling::parse_time(args.start_time.as_deref().unwrap_or_default()) {
        Ok(t) => t,
        Err(e) => return BookingResult::failure("invalid_datetime", e.to_string()),
    };

    let service = match args.service_type.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(requested) => resolve_service(store, business_id, requested).await,
        None => None,
    };

    let duration = service
        .as_ref()
        .map(|s| s.duration_minutes)
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_DURATION_MINUTES);
    let end = scheduling::end_time(date, start, duration);

    let (first_name, last_name) = Customer::split_name(name);
    let booking = NewBooking {
        business_id: business_id.to_string(),
        customer_phone: phone,
        customer_first_name: first_name,
        customer_last_name: last_name,
        customer_email: args
            .customer_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
        service_id: service.as_ref().map(|s| s.id.clone()),
        appointment_date: date,
        start_time: scheduling::format_hhmm(start),
        end_time: scheduling::format_hhmm(end.time()),
        duration_minutes: duration,
    };

    match store.create_booking(&booking).await {
        Ok(record) => {
            tracing::info!(
                business_id,
                appointment_id = %record.appointment.id,
                customer_id = %record.customer_id,
                customer_created = record.customer_created,
                duplicate = record.duplicate,
                "appointment booked"
            );
            success_result(name, &record)
        }
        Err(e) => {
            tracing::error!(error = ?e, business_id, "failed to persist booking");
            BookingResult {
                details: Some("The appointment could not be saved.".to_string()),
                ..BookingResult::failure(
                    "booking_system_error",
                    "I'm sorry, I wasn't able to complete your booking just now. \
                     Please try again in a moment, or call {BUSINESS_NAME} directly and we'll get you scheduled.",
                )
            }
        }
    }
}

fn missing_fields(args: &BookingArgs) -> Vec<&'static str> {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    [
        ("customer_name", &args.customer_name),
        ("customer_phone", &args.customer_phone),
        ("appointment_date", &args.appointment_date),
        ("start_time", &args.start_time),
    ]
    .into_iter()
    .filter(|(_, value)| !present(*value))
    .map(|(field, _)| field)
    .collect()
}

fn missing_fields_prompt(missing: &[&str]) -> String {
    let spoken: Vec<&str> = missing
        .iter()
        .map(|field| match *field {
            "customer_name" => "your name",
            "customer_phone" => "a phone number",
            "appointment_date" => "the date you'd like",
            _ => "the time you'd like",
        })
        .collect();

    let list = match spoken.as_slice() {
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
        [] => String::new(),
    };
    format!("I'd be happy to book that for you. I just need {list} to complete the booking.")
}

/// Partial, case-insensitive match of the requested service. Underscores from
/// tool arguments (`gel_manicure`) are read as spaces. No match is not an error.
pub(crate) async fn resolve_service(store: &dyn TenantStore, business_id: &str, requested: &str) -> Option<Service> {
    let term = requested.replace('_', " ");
    match store.find_service_by_name(business_id, &term).await {
        Ok(Some(service)) => Some(service),
        Ok(None) => {
            tracing::info!(business_id, service_type = %term, "no matching service, using default duration");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, business_id, "service lookup failed, using default duration");
            None
        }
    }
}

fn success_result(name: &str, record: &BookingRecord) -> BookingResult {
    let appt = &record.appointment;
    let service = record.service.as_ref();
    let when = match scheduling::parse_time(&appt.start_time) {
        Ok(t) => format!(
            "{} at {}",
            scheduling::spoken_date(appt.appointment_date),
            scheduling::spoken_time(t)
        ),
        Err(_) => format!("{} at {}", scheduling::spoken_date(appt.appointment_date), appt.start_time),
    };

    let message = if record.duplicate {
        format!("It looks like you already have an appointment booked for {when}, so you're all set. We look forward to seeing you at {{BUSINESS_NAME}}!")
    } else {
        let what = match service {
            Some(s) => format!("your {} appointment", s.name),
            None => "your appointment".to_string(),
        };
        let price = match service {
            Some(s) if s.base_price > 0.0 => format!(" The price is ${:.2}.", s.base_price),
            _ => String::new(),
        };
        format!(
            "Perfect! I've booked {what} for {when}.{price} You'll receive a confirmation shortly. Thank you for choosing {{BUSINESS_NAME}}!"
        )
    };

    BookingResult {
        success: true,
        booking_id: Some(appt.id.clone()),
        message,
        appointment: Some(AppointmentSummary {
            id: appt.id.clone(),
            customer_name: name.to_string(),
            date: appt.appointment_date.format("%Y-%m-%d").to_string(),
            time: appt.start_time.clone(),
            end_time: appt.end_time.clone(),
            duration_minutes: appt.duration_minutes,
            service: service.map(|s| s.name.clone()),
            price: service.map(|s| s.base_price),
            status: appt.status.as_str().to_string(),
        }),
        duplicate: record.duplicate,
        error: None,
        details: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{seed_business, seed_service, setup_db};
    use crate::db::SqliteStore;

    fn store() -> SqliteStore {
        let conn = setup_db();
        seed_business(&conn, "biz-1", "Glow Studio", None);
        seed_service(&conn, "svc-1", "biz-1", "Gel Manicure", 45, 45.0);
        SqliteStore::new(conn)
    }

    fn args() -> BookingArgs {
        BookingArgs {
            customer_name: Some("Jane Doe".to_string()),
            customer_phone: Some("+15551234567".to_string()),
            customer_email: None,
            appointment_date: Some("2025-03-01".to_string()),
            start_time: Some("14:00".to_string()),
            service_type: Some("gel_manicure".to_string()),
        }
    }

    async fn counts(store: &SqliteStore) -> (usize, usize) {
        let customers = store
            .find_customer_by_phone("biz-1", "+15551234567")
            .await
            .unwrap()
            .map_or(0, |_| 1);
        let appointments = store
            .appointments_on("biz-1", scheduling::parse_date("2025-03-01").unwrap())
            .await
            .unwrap()
            .len();
        (customers, appointments)
    }

    #[tokio::test]
    async fn test_books_with_matched_service() {
        let store = store();
        let result = book_appointment(&store, args(), "biz-1").await;

        assert!(result.success);
        let appt = result.appointment.unwrap();
        assert_eq!(appt.time, "14:00");
        assert_eq!(appt.end_time, "14:45");
        assert_eq!(appt.duration_minutes, 45);
        assert_eq!(appt.service.as_deref(), Some("Gel Manicure"));
        assert_eq!(appt.status, "pending");
        assert!(result.message.contains("Gel Manicure"));
        assert!(result.message.contains("$45.00"));
        assert!(result.message.contains("{BUSINESS_NAME}"));
    }

    #[tokio::test]
    async fn test_unmatched_service_defaults_to_sixty_minutes() {
        let store = store();
        let result = book_appointment(
            &store,
            BookingArgs {
                service_type: Some("balayage".to_string()),
                ..args()
            },
            "biz-1",
        )
        .await;

        assert!(result.success);
        let appt = result.appointment.unwrap();
        assert_eq!(appt.duration_minutes, 60);
        assert_eq!(appt.end_time, "15:00");
        assert!(appt.service.is_none());
    }

    #[tokio::test]
    async fn test_missing_fields_write_nothing() {
        let store = store();
        let cases = [
            BookingArgs { customer_name: None, ..args() },
            BookingArgs { customer_phone: Some("  ".to_string()), ..args() },
            BookingArgs { appointment_date: None, ..args() },
            BookingArgs { start_time: None, ..args() },
        ];

        for case in cases {
            let result = book_appointment(&store, case, "biz-1").await;
            assert!(!result.success);
            assert_eq!(result.error, Some("missing_fields"));
            assert!(result.message.starts_with("I'd be happy to book that for you"));
        }
        assert_eq!(counts(&store).await, (0, 0));
    }

    #[tokio::test]
    async fn test_missing_fields_prompt_lists_everything() {
        let result = book_appointment(&store(), BookingArgs::default(), "biz-1").await;
        assert_eq!(
            result.message,
            "I'd be happy to book that for you. I just need your name, a phone number, \
             the date you'd like and the time you'd like to complete the booking."
        );
    }

    #[tokio::test]
    async fn test_invalid_date_is_conversational() {
        let store = store();
        let result = book_appointment(
            &store,
            BookingArgs {
                appointment_date: Some("next tuesday".to_string()),
                ..args()
            },
            "biz-1",
        )
        .await;
        assert!(!result.success);
        assert_eq!(result.error, Some("invalid_datetime"));
        assert_eq!(counts(&store).await, (0, 0));
    }

    #[tokio::test]
    async fn test_repeat_caller_reuses_customer() {
        let store = store();
        book_appointment(&store, args(), "biz-1").await;
        let customer = store
            .find_customer_by_phone("biz-1", "+15551234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.first_name, "Jane");
        assert_eq!(customer.last_name, "Doe");

        let second = book_appointment(
            &store,
            BookingArgs {
                customer_phone: Some("(555) 123-4567".to_string()),
                start_time: Some("16:00".to_string()),
                ..args()
            },
            "biz-1",
        )
        .await;
        assert!(second.success);

        let again = store
            .find_customer_by_phone("biz-1", "+15551234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.id, customer.id);
        assert_eq!(counts(&store).await, (1, 2));
    }

    #[tokio::test]
    async fn test_duplicate_booking_is_coalesced() {
        let store = store();
        let first = book_appointment(&store, args(), "biz-1").await;
        let second = book_appointment(&store, args(), "biz-1").await;

        assert!(second.success);
        assert!(second.duplicate);
        assert_eq!(second.booking_id, first.booking_id);
        assert!(second.message.contains("already have an appointment"));
        assert_eq!(counts(&store).await, (1, 1));
    }

    #[tokio::test]
    async fn test_duplicate_describes_the_stored_service() {
        let conn = setup_db();
        seed_business(&conn, "biz-1", "Glow Studio", None);
        seed_service(&conn, "svc-1", "biz-1", "Gel Manicure", 45, 45.0);
        seed_service(&conn, "svc-2", "biz-1", "Haircut", 90, 80.0);
        let store = SqliteStore::new(conn);

        book_appointment(&store, args(), "biz-1").await;
        let retry = book_appointment(
            &store,
            BookingArgs {
                service_type: Some("haircut".to_string()),
                ..args()
            },
            "biz-1",
        )
        .await;

        assert!(retry.duplicate);
        let appt = retry.appointment.unwrap();
        assert_eq!(appt.service.as_deref(), Some("Gel Manicure"));
        assert_eq!(appt.price, Some(45.0));
        assert_eq!(appt.duration_minutes, 45);
        assert_eq!(appt.end_time, "14:45");
    }

    #[tokio::test]
    async fn test_persistence_failure_hides_database_error() {
        // Unknown business: the insert fails on the foreign key.
        let result = book_appointment(&store(), args(), "no-such-business").await;

        assert!(!result.success);
        assert_eq!(result.error, Some("booking_system_error"));
        let details = result.details.unwrap();
        assert!(!details.to_lowercase().contains("foreign key"));
        assert!(!result.message.to_lowercase().contains("constraint"));
    }

    #[tokio::test]
    async fn test_serialized_shape() {
        let result = book_appointment(&store(), args(), "biz-1").await;
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["appointment"]["time"], "14:00");
        assert!(json["booking_id"].is_string());
        assert!(json.get("error").is_none());
        assert!(json.get("duplicate").is_none());
    }
}
