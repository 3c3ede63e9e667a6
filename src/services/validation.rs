use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::services::ServiceError;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Mood and stress answers
pub const FORM_SCALE: std::ops::RangeInclusive<i32> = 1..=5;
pub const WELL_BEING_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

/// Trimmed, non-empty value or `InvalidInput` naming the field
pub fn required(field: &str, value: Option<&str>) -> Result<String, ServiceError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ServiceError::InvalidInput(format!("{field} is required"))),
    }
}

pub fn email(value: &str) -> Result<(), ServiceError> {
    if EMAIL_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput("Invalid email format".to_string()))
    }
}

/// Optional 1-5 answer on the check-in form. `null` counts as unanswered; decimals,
/// strings and anything outside the scale are `InvalidPayload`.
pub fn form_scale(field: &str, value: Option<&Value>) -> Result<Option<i32>, ServiceError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    value
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .filter(|v| FORM_SCALE.contains(v))
        .map(Some)
        .ok_or_else(|| {
            ServiceError::InvalidPayload(format!(
                "{field} must be an integer between {} and {}",
                FORM_SCALE.start(),
                FORM_SCALE.end()
            ))
        })
}

pub fn well_being_score(value: i32) -> Result<(), ServiceError> {
    if WELL_BEING_RANGE.contains(&value) {
        Ok(())
    } else {
        Err(ServiceError::InvalidInput(format!(
            "well_being_score must be between {} and {}",
            WELL_BEING_RANGE.start(),
            WELL_BEING_RANGE.end()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_standard_addresses() {
        assert!(email("sarah@example.com").is_ok());
        assert!(email("first.last+tag@sub.example.co").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "sarah", "sarah@", "sarah@example", "sa rah@example.com", "@example.com"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("name", Some("  Sarah ")).unwrap(), "Sarah");
        assert!(matches!(required("name", Some("   ")), Err(ServiceError::InvalidInput(_))));
        assert!(matches!(required("name", None), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn form_scale_bounds() {
        assert_eq!(form_scale("mood", None).unwrap(), None);
        assert_eq!(form_scale("mood", Some(&Value::Null)).unwrap(), None);
        assert_eq!(form_scale("mood", Some(&json!(1))).unwrap(), Some(1));
        assert_eq!(form_scale("mood", Some(&json!(5))).unwrap(), Some(5));
        assert!(matches!(form_scale("mood", Some(&json!(6))), Err(ServiceError::InvalidPayload(_))));
        assert!(matches!(form_scale("stress", Some(&json!(0))), Err(ServiceError::InvalidPayload(_))));
    }

    #[test]
    fn form_scale_rejects_non_integers() {
        for bad in [json!(4.5), json!("4"), json!(true), json!([4]), json!(i64::MAX)] {
            assert!(
                matches!(form_scale("mood", Some(&bad)), Err(ServiceError::InvalidPayload(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn well_being_bounds() {
        assert!(well_being_score(1).is_ok());
        assert!(well_being_score(10).is_ok());
        assert!(well_being_score(0).is_err());
        assert!(well_being_score(11).is_err());
    }
}
