//! Phone number normalization.
//!
//! Voice platforms and dashboards hand us numbers as `+1 (555) 555-0100`,
//! `5555550100`, `+15555550100` and so on. Everything is compared in E.164.

/// Normalizes a phone number to E.164 (`+` followed by digits).
///
/// Ten-digit numbers are assumed to be North American and get a `+1` prefix;
/// other lengths are taken to already carry a country code. Anything outside
/// 7..=15 digits is rejected.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 7 || digits.len() > 15 {
        return None;
    }

    if trimmed.starts_with('+') {
        return Some(format!("+{digits}"));
    }

    if digits.len() == 10 {
        Some(format!("+1{digits}"))
    } else {
        Some(format!("+{digits}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_e164() {
        assert_eq!(normalize_phone("+15555550123").as_deref(), Some("+15555550123"));
        assert_eq!(normalize_phone("+447700900123").as_deref(), Some("+447700900123"));
    }

    #[test]
    fn test_punctuation_stripped() {
        assert_eq!(normalize_phone("+1 (555) 555-0123").as_deref(), Some("+15555550123"));
        assert_eq!(normalize_phone(" 555.555.0123 ").as_deref(), Some("+15555550123"));
    }

    #[test]
    fn test_north_american_defaults() {
        assert_eq!(normalize_phone("5555550123").as_deref(), Some("+15555550123"));
        assert_eq!(normalize_phone("15555550123").as_deref(), Some("+15555550123"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(normalize_phone(""), None);
        assert_eq!(normalize_phone("call me"), None);
        assert_eq!(normalize_phone("12345"), None);
    }
}
