//! Calendar arithmetic shared by the velocity model and re-anchoring.
//!
//! All durations in this crate are expressed in fractional months. A month
//! is taken as the mean Gregorian month length so that month arithmetic is
//! independent of which calendar month a date falls in.

use chrono::NaiveDate;

/// Mean Gregorian month length in days.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Signed number of months from `from` to `to`. Positive when `to` is later.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> f64 {
    let days = (to - from).num_days() as f64;
    days / DAYS_PER_MONTH
}

/// Lenient date parsing for user- and collaborator-supplied fields.
///
/// Accepts ISO `YYYY-MM-DD`, US `MM/DD/YYYY`, and the visa-bulletin style
/// `01MAY12`. Anything else (including blank input) is treated as "no date
/// recorded" rather than an error.
pub fn parse_date_lenient(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(d);
    }
    // Bulletin cells like "01MAY12". chrono's %b matcher wants title case.
    let lowered = s.to_lowercase();
    if let Ok(d) = NaiveDate::parse_from_str(&lowered, "%d%b%y") {
        return Some(d);
    }
    None
}

/// Serde helpers for optional date fields that must never fail to
/// deserialize: malformed input becomes `None`.
pub mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_some(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(super::parse_date_lenient))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_months_between_forward() {
        let months = months_between(date(2024, 1, 1), date(2024, 7, 1));
        assert!((months - 5.98).abs() < 0.05);
    }

    #[test]
    fn test_months_between_backward_is_negative() {
        let months = months_between(date(2024, 7, 1), date(2024, 1, 1));
        assert!(months < 0.0);
    }

    #[test]
    fn test_months_between_same_day_is_zero() {
        assert_eq!(months_between(date(2024, 3, 15), date(2024, 3, 15)), 0.0);
    }

    #[test]
    fn test_parse_iso() {
        assert_eq!(parse_date_lenient("2012-05-01"), Some(date(2012, 5, 1)));
    }

    #[test]
    fn test_parse_us() {
        assert_eq!(parse_date_lenient("05/01/2012"), Some(date(2012, 5, 1)));
    }

    #[test]
    fn test_parse_bulletin_style() {
        assert_eq!(parse_date_lenient("01MAY12"), Some(date(2012, 5, 1)));
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_date_lenient("soon"), None);
        assert_eq!(parse_date_lenient(""), None);
        assert_eq!(parse_date_lenient("   "), None);
        assert_eq!(parse_date_lenient("2012-13-45"), None);
    }
}
