use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentOverview, AppointmentStatus, BookingRecord, Business, BusinessHours,
    Customer, NewBooking, NewBusiness, Service, Staff,
};
use crate::phone::normalize_phone;

const BUSINESS_COLUMNS: &str =
    "id, name, phone, address, city, state, zip_code, subscription_tier, timezone, created_at";

const SERVICE_COLUMNS: &str = "id, business_id, name, description, duration_minutes, base_price, \
     category, requires_deposit, deposit_amount, is_active, display_order";

const APPOINTMENT_COLUMNS: &str = "id, business_id, customer_id, service_id, appointment_date, \
     start_time, end_time, duration_minutes, status, notes";

// ── Businesses ──

pub fn get_business(conn: &Connection, id: &str) -> anyhow::Result<Option<Business>> {
    let business = conn
        .query_row(
            &format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = ?1"),
            params![id],
            parse_business_row,
        )
        .optional()?;
    Ok(business)
}

/// Registers a business. Its phone is normalized into `phone_e164`; a number
/// already routed to another business is rejected.
pub fn insert_business(conn: &Connection, business: &NewBusiness) -> anyhow::Result<()> {
    let phone_e164 = business.phone.as_deref().and_then(normalize_phone);
    if business.phone.is_some() && phone_e164.is_none() {
        tracing::warn!(business_id = %business.id, "business phone is not routable, storing without routing key");
    }

    if let Some(phone) = &phone_e164 {
        let owner: Option<String> = conn
            .query_row(
                "SELECT id FROM businesses WHERE phone_e164 = ?1",
                params![phone],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(owner) = owner {
            anyhow::bail!("phone {phone} is already registered to business {owner}");
        }
    }

    conn.execute(
        "INSERT INTO businesses (id, name, phone, phone_e164, address, city, state, zip_code, timezone)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, COALESCE(?9, 'America/New_York'))",
        params![
            business.id,
            business.name,
            business.phone,
            phone_e164,
            business.address,
            business.city,
            business.state,
            business.zip_code,
            business.timezone,
        ],
    )?;
    Ok(())
}

/// Finds the business routed to `phone`, compared in E.164 form.
pub fn find_business_by_phone(conn: &Connection, phone: &str) -> anyhow::Result<Option<Business>> {
    let Some(wanted) = normalize_phone(phone) else {
        return Ok(None);
    };

    let business = conn
        .query_row(
            &format!("SELECT {BUSINESS_COLUMNS} FROM businesses WHERE phone_e164 = ?1"),
            params![wanted],
            parse_business_row,
        )
        .optional()?;
    Ok(business)
}

pub fn get_latest_business(conn: &Connection) -> anyhow::Result<Option<Business>> {
    let business = conn
        .query_row(
            &format!(
                "SELECT {BUSINESS_COLUMNS} FROM businesses ORDER BY created_at DESC, rowid DESC LIMIT 1"
            ),
            [],
            parse_business_row,
        )
        .optional()?;
    Ok(business)
}

fn parse_business_row(row: &rusqlite::Row) -> rusqlite::Result<Business> {
    Ok(Business {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        address: row.get(3)?,
        city: row.get(4)?,
        state: row.get(5)?,
        zip_code: row.get(6)?,
        subscription_tier: row.get(7)?,
        timezone: row.get(8)?,
        created_at: row.get(9)?,
    })
}

// ── Services, Staff, Hours ──

pub fn get_active_services(conn: &Connection, business_id: &str) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services
         WHERE business_id = ?1 AND is_active = 1
         ORDER BY display_order ASC, name ASC"
    ))?;
    let rows = stmt.query_map(params![business_id], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

/// First active service of the business whose name contains `term`,
/// ASCII case-insensitively.
pub fn find_service_by_name(
    conn: &Connection,
    business_id: &str,
    term: &str,
) -> anyhow::Result<Option<Service>> {
    let pattern = format!("%{}%", escape_like(term));
    let service = conn
        .query_row(
            &format!(
                "SELECT {SERVICE_COLUMNS} FROM services
                 WHERE business_id = ?1 AND is_active = 1 AND name LIKE ?2 ESCAPE '\\'
                 ORDER BY display_order ASC, name ASC LIMIT 1"
            ),
            params![business_id, pattern],
            parse_service_row,
        )
        .optional()?;
    Ok(service)
}

/// Looks a service up by id regardless of `is_active`, so existing appointments
/// keep describing the service they were booked for.
pub fn get_service(conn: &Connection, business_id: &str, id: &str) -> anyhow::Result<Option<Service>> {
    let service = conn
        .query_row(
            &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE business_id = ?1 AND id = ?2"),
            params![business_id, id],
            parse_service_row,
        )
        .optional()?;
    Ok(service)
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        duration_minutes: row.get(4)?,
        base_price: row.get(5)?,
        category: row.get(6)?,
        requires_deposit: row.get::<_, i32>(7)? != 0,
        deposit_amount: row.get(8)?,
        is_active: row.get::<_, i32>(9)? != 0,
        display_order: row.get(10)?,
    })
}

pub fn get_active_staff(conn: &Connection, business_id: &str) -> anyhow::Result<Vec<Staff>> {
    let mut stmt = conn.prepare(
        "SELECT id, business_id, first_name, last_name, role, specialties, is_active
         FROM staff WHERE business_id = ?1 AND is_active = 1
         ORDER BY first_name ASC",
    )?;
    let rows = stmt.query_map(params![business_id], |row| {
        let specialties_json: String = row.get(5)?;
        Ok(Staff {
            id: row.get(0)?,
            business_id: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            role: row.get(4)?,
            specialties: serde_json::from_str(&specialties_json).unwrap_or_default(),
            is_active: row.get::<_, i32>(6)? != 0,
        })
    })?;

    let mut staff = vec![];
    for row in rows {
        staff.push(row?);
    }
    Ok(staff)
}

pub fn get_business_hours(conn: &Connection, business_id: &str) -> anyhow::Result<Vec<BusinessHours>> {
    let mut stmt = conn.prepare(
        "SELECT business_id, day_of_week, open_time, close_time, is_closed
         FROM business_hours WHERE business_id = ?1
         ORDER BY day_of_week ASC",
    )?;
    let rows = stmt.query_map(params![business_id], |row| {
        Ok(BusinessHours {
            business_id: row.get(0)?,
            day_of_week: row.get(1)?,
            open_time: row.get(2)?,
            close_time: row.get(3)?,
            is_closed: row.get::<_, i32>(4)? != 0,
        })
    })?;

    let mut hours = vec![];
    for row in rows {
        hours.push(row?);
    }
    Ok(hours)
}

// ── Customers ──

pub fn find_customer_by_phone(
    conn: &Connection,
    business_id: &str,
    phone: &str,
) -> anyhow::Result<Option<Customer>> {
    let customer = conn
        .query_row(
            "SELECT id, business_id, first_name, last_name, phone, email
             FROM customers WHERE business_id = ?1 AND phone = ?2",
            params![business_id, phone],
            |row| {
                Ok(Customer {
                    id: row.get(0)?,
                    business_id: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                    phone: row.get(4)?,
                    email: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(customer)
}

// ── Appointments ──

/// Finds or creates the customer and inserts a pending appointment, all in one
/// transaction. An existing active appointment for the same customer, date and
/// start time is returned as a duplicate instead of inserting a second row.
pub fn create_booking(conn: &mut Connection, booking: &NewBooking) -> anyhow::Result<BookingRecord> {
    let tx = conn.transaction()?;

    let existing = find_customer_by_phone(&tx, &booking.business_id, &booking.customer_phone)?;
    let (customer_id, customer_created) = match existing {
        Some(customer) => (customer.id, false),
        None => {
            let id = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO customers (id, business_id, first_name, last_name, phone, email)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    booking.business_id,
                    booking.customer_first_name,
                    booking.customer_last_name,
                    booking.customer_phone,
                    booking.customer_email,
                ],
            )?;
            (id, true)
        }
    };

    let date = booking.appointment_date.format("%Y-%m-%d").to_string();

    if !customer_created {
        let duplicate = tx
            .query_row(
                &format!(
                    "SELECT {APPOINTMENT_COLUMNS} FROM appointments
                     WHERE business_id = ?1 AND customer_id = ?2 AND appointment_date = ?3
                       AND start_time = ?4 AND status != 'cancelled'"
                ),
                params![booking.business_id, customer_id, date, booking.start_time],
                |row| Ok(parse_appointment_row(row)),
            )
            .optional()?;

        if let Some(appointment) = duplicate {
            let appointment = appointment?;
            let service = match appointment.service_id.as_deref() {
                Some(id) => get_service(&tx, &booking.business_id, id)?,
                None => None,
            };
            tx.commit()?;
            return Ok(BookingRecord {
                appointment,
                customer_id,
                customer_created,
                service,
                duplicate: true,
            });
        }
    }

    let appointment = Appointment {
        id: Uuid::new_v4().to_string(),
        business_id: booking.business_id.clone(),
        customer_id: customer_id.clone(),
        service_id: booking.service_id.clone(),
        appointment_date: booking.appointment_date,
        start_time: booking.start_time.clone(),
        end_time: booking.end_time.clone(),
        duration_minutes: booking.duration_minutes,
        status: AppointmentStatus::Pending,
        notes: None,
    };

    tx.execute(
        "INSERT INTO appointments (id, business_id, customer_id, service_id, appointment_date, start_time, end_time, duration_minutes, status, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            appointment.id,
            appointment.business_id,
            appointment.customer_id,
            appointment.service_id,
            date,
            appointment.start_time,
            appointment.end_time,
            appointment.duration_minutes,
            appointment.status.as_str(),
            appointment.notes,
        ],
    )?;

    let service = match appointment.service_id.as_deref() {
        Some(id) => get_service(&tx, &booking.business_id, id)?,
        None => None,
    };

    tx.commit()?;

    Ok(BookingRecord {
        appointment,
        customer_id,
        customer_created,
        service,
        duplicate: false,
    })
}

pub fn get_appointments_on(
    conn: &Connection,
    business_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE business_id = ?1 AND appointment_date = ?2 AND status != 'cancelled'
         ORDER BY start_time ASC"
    ))?;
    let date = date.format("%Y-%m-%d").to_string();
    let rows = stmt.query_map(params![business_id, date], |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// Active appointments on or after `from` for the customer with this phone.
pub fn get_upcoming_for_phone(
    conn: &Connection,
    business_id: &str,
    phone: &str,
    from: NaiveDate,
) -> anyhow::Result<Vec<AppointmentOverview>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.appointment_date, a.start_time, a.end_time, a.status, s.name
         FROM appointments a
         INNER JOIN customers c ON c.id = a.customer_id AND c.business_id = a.business_id
         LEFT JOIN services s ON s.id = a.service_id AND s.business_id = a.business_id
         WHERE a.business_id = ?1 AND c.phone = ?2 AND a.appointment_date >= ?3
           AND a.status != 'cancelled'
         ORDER BY a.appointment_date ASC, a.start_time ASC",
    )?;
    let from = from.format("%Y-%m-%d").to_string();
    let rows = stmt.query_map(params![business_id, phone, from], |row| {
        let id: String = row.get(0)?;
        let date_str: String = row.get(1)?;
        let start_time: String = row.get(2)?;
        let end_time: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let service_name: Option<String> = row.get(5)?;
        Ok((id, date_str, start_time, end_time, status_str, service_name))
    })?;

    let mut appointments = vec![];
    for row in rows {
        let (id, date_str, start_time, end_time, status_str, service_name) = row?;
        appointments.push(AppointmentOverview {
            id,
            date: parse_date(&date_str)?,
            start_time,
            end_time,
            status: AppointmentStatus::parse(&status_str),
            service_name,
        });
    }
    Ok(appointments)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let date_str: String = row.get(4)?;
    let status_str: String = row.get(8)?;

    Ok(Appointment {
        id: row.get(0)?,
        business_id: row.get(1)?,
        customer_id: row.get(2)?,
        service_id: row.get(3)?,
        appointment_date: parse_date(&date_str)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        duration_minutes: row.get(7)?,
        status: AppointmentStatus::parse(&status_str),
        notes: row.get(9)?,
    })
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid appointment_date {s:?}: {e}"))
}
