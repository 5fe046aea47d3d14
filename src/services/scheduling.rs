use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::models::{Appointment, BusinessContext};

pub const DEFAULT_DURATION_MINUTES: i32 = 60;
pub const SLOT_STEP_MINUTES: i64 = 30;

const DEFAULT_OPEN: (u32, u32) = (9, 0);
const DEFAULT_CLOSE: (u32, u32) = (17, 0);

#[derive(Debug, PartialEq)]
pub enum SchedulingError {
    InvalidDate(String),
    InvalidTime(String),
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::InvalidDate(raw) => write!(
                f,
                "I didn't quite catch the date \"{raw}\". Could you tell me the day you'd like, for example March 1st?"
            ),
            SchedulingError::InvalidTime(raw) => write!(
                f,
                "I didn't quite catch the time \"{raw}\". What time would you like to come in?"
            ),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, SchedulingError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| SchedulingError::InvalidDate(raw.to_string()))
}

/// Accepts `14:00`, `14:00:00`, `2:00 PM` and `2:00pm`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, SchedulingError> {
    let trimmed = raw.trim();
    let upper = trimmed.to_uppercase();
    ["%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            ["%I:%M %p", "%I:%M%p"]
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(&upper, fmt).ok())
        })
        .ok_or_else(|| SchedulingError::InvalidTime(raw.to_string()))
}

/// Wall-clock end of an appointment. Wraps past midnight onto the next day.
pub fn end_time(date: NaiveDate, start: NaiveTime, duration_minutes: i32) -> NaiveDateTime {
    date.and_time(start) + Duration::minutes(duration_minutes as i64)
}

/// Calendar date at `now` in the business's IANA timezone. Unknown zone names
/// fall back to UTC.
pub fn today_in(timezone: &str, now: DateTime<Utc>) -> NaiveDate {
    match timezone.parse::<Tz>() {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => {
            tracing::warn!(timezone, "unknown business timezone, using UTC");
            now.date_naive()
        }
    }
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// `2:00 PM`
pub fn spoken_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// `Saturday, March 1`
pub fn spoken_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

/// Opening window for a date. `None` means closed. A business without any
/// configured hours is treated as open during default office hours.
pub fn opening_window(ctx: &BusinessContext, date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
    use chrono::Datelike;

    if ctx.business_hours.is_empty() {
        return Some((
            NaiveTime::from_hms_opt(DEFAULT_OPEN.0, DEFAULT_OPEN.1, 0)?,
            NaiveTime::from_hms_opt(DEFAULT_CLOSE.0, DEFAULT_CLOSE.1, 0)?,
        ));
    }

    let hours = ctx.hours_for(date.weekday())?;
    if hours.is_closed {
        return None;
    }
    let open = parse_time(hours.open_time.as_deref()?).ok()?;
    let close = parse_time(hours.close_time.as_deref()?).ok()?;
    (open < close).then_some((open, close))
}

/// True when `[start, start + duration)` overlaps any of the appointments.
pub fn conflicts(
    date: NaiveDate,
    start: NaiveTime,
    duration_minutes: i32,
    appointments: &[Appointment],
) -> bool {
    let proposed_start = date.and_time(start);
    let proposed_end = end_time(date, start, duration_minutes);

    appointments.iter().any(|appt| {
        let Ok(appt_start_time) = parse_time(&appt.start_time) else {
            return false;
        };
        let appt_start = appt.appointment_date.and_time(appt_start_time);
        let appt_end = appt_start + Duration::minutes(appt.duration_minutes as i64);
        // Overlap: existing starts before proposed ends AND existing ends after proposed starts
        appt_start < proposed_end && appt_end > proposed_start
    })
}

/// Start times within the window, every [`SLOT_STEP_MINUTES`], that fit the
/// duration before closing and don't overlap an existing appointment.
pub fn open_slots(
    date: NaiveDate,
    window: (NaiveTime, NaiveTime),
    duration_minutes: i32,
    appointments: &[Appointment],
) -> Vec<NaiveTime> {
    let (open, close) = window;
    let closing = date.and_time(close);
    let mut slots = vec![];
    let mut cursor = date.and_time(open);

    while cursor + Duration::minutes(duration_minutes as i64) <= closing {
        if !conflicts(date, cursor.time(), duration_minutes, appointments) {
            slots.push(cursor.time());
        }
        cursor += Duration::minutes(SLOT_STEP_MINUTES);
    }
    slots
}
