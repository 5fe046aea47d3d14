use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::business::Service;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub business_id: String,
    pub customer_id: String,
    pub service_id: Option<String>,
    pub appointment_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => AppointmentStatus::Confirmed,
            "completed" => AppointmentStatus::Completed,
            "cancelled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Pending,
        }
    }
}

/// Input to the booking transaction. The customer is found by
/// (business, phone) or created from the name fields.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub business_id: String,
    pub customer_phone: String,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_email: Option<String>,
    pub service_id: Option<String>,
    pub appointment_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i32,
}

#[derive(Debug, Clone)]
pub struct BookingRecord {
    pub appointment: Appointment,
    pub customer_id: String,
    pub customer_created: bool,
    /// Service of the stored appointment. For a duplicate this is the original
    /// booking's service, not the one asked for on the retry.
    pub service: Option<Service>,
    /// True when an identical booking already existed and was returned instead.
    pub duplicate: bool,
}

/// An upcoming appointment joined with its service name, for read-back to a caller.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentOverview {
    pub id: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub status: AppointmentStatus,
    pub service_name: Option<String>,
}
