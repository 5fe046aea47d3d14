use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub business_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
}

impl Customer {
    /// Splits a spoken full name into first name (first token) and last name (the rest).
    pub fn split_name(full_name: &str) -> (String, String) {
        let mut parts = full_name.split_whitespace();
        let first = parts.next().unwrap_or_default().to_string();
        let last = parts.collect::<Vec<_>>().join(" ");
        (first, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        assert_eq!(
            Customer::split_name("Jane Doe"),
            ("Jane".to_string(), "Doe".to_string())
        );
        assert_eq!(
            Customer::split_name("  Mary  Ann   Smith "),
            ("Mary".to_string(), "Ann Smith".to_string())
        );
        assert_eq!(
            Customer::split_name("Cher"),
            ("Cher".to_string(), String::new())
        );
    }
}
