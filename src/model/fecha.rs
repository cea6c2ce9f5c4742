//! Lenient timestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// A point in (local, business) time.
///
/// Offsets are dropped: the backend reports times in the store's own timezone and date filters
/// compare against calendar days in that same timezone.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Fecha(NaiveDateTime);

impl Fecha {
    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    pub fn value(&self) -> NaiveDateTime {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Parses RFC 3339, a naive date-time, or a bare `YYYY-MM-DD` (midnight).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Fecha(dt.naive_local()));
        }
        for format in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(Fecha(dt));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Fecha)
    }
}

impl Display for Fecha {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%d-%m-%Y %H:%M"))
    }
}

impl Serialize for Fecha {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

/// Deserializes an optional `Fecha`, mapping `null`, non-strings and unparseable strings to `None`.
pub(crate) fn lenient<'de, D>(deserializer: D) -> Result<Option<Fecha>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Fecha::parse(&s),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_rfc3339_keeps_local_time() {
        let f = Fecha::parse("2025-03-10T14:05:00-03:00").unwrap();
        assert_eq!(f.value(), ymd_hms(2025, 3, 10, 14, 5, 0));
    }

    #[test]
    fn test_parse_naive_forms() {
        assert_eq!(
            Fecha::parse("2025-03-10T14:05:09.123456").unwrap().date(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert_eq!(
            Fecha::parse("2025-03-10T14:05").unwrap().value(),
            ymd_hms(2025, 3, 10, 14, 5, 0)
        );
        assert_eq!(
            Fecha::parse("2025-03-10").unwrap().value(),
            ymd_hms(2025, 3, 10, 0, 0, 0)
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Fecha::parse("").is_none());
        assert!(Fecha::parse("ayer").is_none());
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient")]
        fecha: Option<Fecha>,
    }

    #[test]
    fn test_lenient_deserialize() {
        let h: Holder = serde_json::from_str(r#"{"fecha": "2025-01-02T03:04:05Z"}"#).unwrap();
        assert_eq!(h.fecha.unwrap().value(), ymd_hms(2025, 1, 2, 3, 4, 5));
        let h: Holder = serde_json::from_str(r#"{"fecha": "not a date"}"#).unwrap();
        assert!(h.fecha.is_none());
        let h: Holder = serde_json::from_str(r#"{"fecha": 12}"#).unwrap();
        assert!(h.fecha.is_none());
        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert!(h.fecha.is_none());
    }

    #[test]
    fn test_display() {
        let f = Fecha::new(ymd_hms(2025, 1, 2, 3, 4, 5));
        assert_eq!(f.to_string(), "02-01-2025 03:04");
    }
}
