//! Lenient date deserialization.
//!
//! The API emits plain `YYYY-MM-DD` dates for most fields but full RFC 3339
//! timestamps on some endpoints. Both collapse to the calendar date.

use chrono::{DateTime, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serializer};

pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => super::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.is_empty() => Ok(None),
            Some(raw) => parse_calendar_date(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calendar_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(parse_calendar_date("2025-03-09"), Some(expected));
        assert_eq!(parse_calendar_date("2025-03-09T10:15:00Z"), Some(expected));
        assert_eq!(parse_calendar_date("2025-03-09T10:15:00.000-03:00"), Some(expected));
        assert_eq!(parse_calendar_date("09/03/2025"), None);
    }
}
