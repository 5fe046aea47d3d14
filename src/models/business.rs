use chrono::Weekday;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub subscription_tier: String,
    pub timezone: String,
    pub created_at: String,
}

impl Business {
    /// Street, city, state and zip joined for speaking; empty parts are skipped.
    pub fn full_address(&self) -> String {
        let region = [self.state.as_deref(), self.zip_code.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        [self.address.as_deref(), self.city.as_deref(), Some(region.as_str())]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A business being registered. `phone` is kept as entered; its E.164 form is
/// the unique routing key.
#[derive(Debug, Clone, Default)]
pub struct NewBusiness {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub base_price: f64,
    pub category: Option<String>,
    pub requires_deposit: bool,
    pub deposit_amount: f64,
    pub is_active: bool,
    pub display_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub business_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub specialties: Vec<String>,
    pub is_active: bool,
}

/// One row per weekday. `day_of_week` counts from Sunday = 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHours {
    pub business_id: String,
    pub day_of_week: i32,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub is_closed: bool,
}

impl BusinessHours {
    pub fn weekday_index(day: Weekday) -> i32 {
        day.num_days_from_sunday() as i32
    }
}

/// Everything a call needs to know about a tenant, fetched together.
#[derive(Debug, Clone, Serialize)]
pub struct BusinessContext {
    pub business: Business,
    pub services: Vec<Service>,
    pub staff: Vec<Staff>,
    pub business_hours: Vec<BusinessHours>,
}

impl BusinessContext {
    pub fn hours_for(&self, day: Weekday) -> Option<&BusinessHours> {
        let index = BusinessHours::weekday_index(day);
        self.business_hours.iter().find(|h| h.day_of_week == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business() -> Business {
        Business {
            id: "biz-1".to_string(),
            name: "Glow Studio".to_string(),
            phone: Some("+15555550100".to_string()),
            address: Some("12 Main St".to_string()),
            city: Some("Austin".to_string()),
            state: Some("TX".to_string()),
            zip_code: Some("78701".to_string()),
            subscription_tier: "pro".to_string(),
            timezone: "America/Chicago".to_string(),
            created_at: "2025-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_full_address() {
        assert_eq!(business().full_address(), "12 Main St, Austin, TX 78701");
    }

    #[test]
    fn test_full_address_skips_missing_parts() {
        let mut b = business();
        b.city = None;
        b.zip_code = Some("  ".to_string());
        assert_eq!(b.full_address(), "12 Main St, TX");
    }

    #[test]
    fn test_hours_for_weekday() {
        let ctx = BusinessContext {
            business: business(),
            services: vec![],
            staff: vec![],
            business_hours: vec![BusinessHours {
                business_id: "biz-1".to_string(),
                day_of_week: 0,
                open_time: None,
                close_time: None,
                is_closed: true,
            }],
        };
        assert!(ctx.hours_for(Weekday::Sun).is_some_and(|h| h.is_closed));
        assert!(ctx.hours_for(Weekday::Mon).is_none());
    }
}
