pub mod migrations;
pub mod queries;

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::models::{
    Appointment, AppointmentOverview, BookingRecord, Business, BusinessHours, Customer,
    NewBooking, Service, Staff,
};

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// Multi-tenant data store. Every tenant-owned read or write takes the
/// `business_id` it is scoped to.
#[async_trait]
pub trait TenantStore: Send + Sync {
    async fn get_business(&self, id: &str) -> anyhow::Result<Option<Business>>;
    async fn find_business_by_phone(&self, phone: &str) -> anyhow::Result<Option<Business>>;
    async fn latest_business(&self) -> anyhow::Result<Option<Business>>;

    async fn active_services(&self, business_id: &str) -> anyhow::Result<Vec<Service>>;
    async fn find_service_by_name(
        &self,
        business_id: &str,
        term: &str,
    ) -> anyhow::Result<Option<Service>>;
    async fn active_staff(&self, business_id: &str) -> anyhow::Result<Vec<Staff>>;
    async fn business_hours(&self, business_id: &str) -> anyhow::Result<Vec<BusinessHours>>;

    async fn find_customer_by_phone(
        &self,
        business_id: &str,
        phone: &str,
    ) -> anyhow::Result<Option<Customer>>;

    async fn create_booking(&self, booking: &NewBooking) -> anyhow::Result<BookingRecord>;
    async fn appointments_on(
        &self,
        business_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Appointment>>;
    async fn upcoming_appointments(
        &self,
        business_id: &str,
        phone: &str,
        from: NaiveDate,
    ) -> anyhow::Result<Vec<AppointmentOverview>>;
}

/// SQLite-backed store. Queries run inline on the shared connection.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection mutex poisoned"))
    }
}

#[async_trait]
impl TenantStore for SqliteStore {
    async fn get_business(&self, id: &str) -> anyhow::Result<Option<Business>> {
        queries::get_business(&*self.lock()?, id)
    }

    async fn find_business_by_phone(&self, phone: &str) -> anyhow::Result<Option<Business>> {
        queries::find_business_by_phone(&*self.lock()?, phone)
    }

    async fn latest_business(&self) -> anyhow::Result<Option<Business>> {
        queries::get_latest_business(&*self.lock()?)
    }

    async fn active_services(&self, business_id: &str) -> anyhow::Result<Vec<Service>> {
        queries::get_active_services(&*self.lock()?, business_id)
    }

    async fn find_service_by_name(
        &self,
        business_id: &str,
        term: &str,
    ) -> anyhow::Result<Option<Service>> {
        queries::find_service_by_name(&*self.lock()?, business_id, term)
    }

    async fn active_staff(&self, business_id: &str) -> anyhow::Result<Vec<Staff>> {
        queries::get_active_staff(&*self.lock()?, business_id)
    }

    async fn business_hours(&self, business_id: &str) -> anyhow::Result<Vec<BusinessHours>> {
        queries::get_business_hours(&*self.lock()?, business_id)
    }

    async fn find_customer_by_phone(
        &self,
        business_id: &str,
        phone: &str,
    ) -> anyhow::Result<Option<Customer>> {
        queries::find_customer_by_phone(&*self.lock()?, business_id, phone)
    }

    async fn create_booking(&self, booking: &NewBooking) -> anyhow::Result<BookingRecord> {
        let mut conn = self.lock()?;
        queries::create_booking(&mut conn, booking)
    }

    async fn appointments_on(
        &self,
        business_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<Appointment>> {
        queries::get_appointments_on(&*self.lock()?, business_id, date)
    }

    async fn upcoming_appointments(
        &self,
        business_id: &str,
        phone: &str,
        from: NaiveDate,
    ) -> anyhow::Result<Vec<AppointmentOverview>> {
        queries::get_upcoming_for_phone(&*self.lock()?, business_id, phone, from)
    }
}
