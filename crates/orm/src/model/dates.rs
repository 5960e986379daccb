//! Date casting
//!
//! Date-valued attributes are stored as `%Y-%m-%d %H:%M:%S` strings in UTC.
//! Storage and display formatting are separate transforms; display never
//! touches the stored value.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde_json::Value as JsonValue;

use crate::error::{ModelError, ModelResult};
use crate::model::core_trait::Model;

/// Fixed-width storage format for every date attribute
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_FORMATS: &[&str] = &[
    STORAGE_FORMAT,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse any accepted date representation into a UTC timestamp
pub fn parse_datetime(value: &JsonValue) -> Option<NaiveDateTime> {
    match value {
        JsonValue::String(s) => parse_str(s.trim()),
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

fn parse_str(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Render a timestamp in the storage format; sub-second precision is dropped
pub fn to_storage_string(dt: &NaiveDateTime) -> String {
    dt.with_nanosecond(0).unwrap_or(*dt).format(STORAGE_FORMAT).to_string()
}

/// Current time in the storage format
pub fn now_for_storage() -> JsonValue {
    JsonValue::String(to_storage_string(&Utc::now().naive_utc()))
}

/// Date casting for one model's date attributes
pub struct DateCaster;

impl DateCaster {
    /// Whether `field` is one of the model's date attributes
    pub fn is_date_field<M: Model>(field: &str) -> bool {
        M::date_fields().iter().any(|f| *f == field)
    }

    /// Normalize a value to the storage format. Applying it to its own
    /// output yields the same value.
    pub fn format_for_storage<M: Model>(field: &str, value: JsonValue) -> ModelResult<JsonValue> {
        if value.is_null() || !Self::is_date_field::<M>(field) {
            return Ok(value);
        }
        parse_datetime(&value)
            .map(|dt| JsonValue::String(to_storage_string(&dt)))
            .ok_or_else(|| ModelError::InvalidDate {
                field: field.to_string(),
                value: value.to_string(),
            })
    }

    /// Format a stored value for presentation. Unparsable values are shown as stored.
    pub fn format_for_display<M: Model>(field: &str, value: &JsonValue) -> JsonValue {
        if value.is_null() || !Self::is_date_field::<M>(field) {
            return value.clone();
        }
        match parse_datetime(value) {
            Some(dt) => M::format_date_for_display(field, &dt)
                .unwrap_or_else(|| JsonValue::String(to_storage_string(&dt))),
            None => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Event;

    impl Model for Event {
        fn dates() -> &'static [&'static str] {
            &["starts_at"]
        }

        fn format_date_for_display(field: &str, value: &NaiveDateTime) -> Option<JsonValue> {
            match field {
                "starts_at" => Some(json!(value.format("%d/%m/%Y").to_string())),
                _ => None,
            }
        }
    }

    #[test]
    fn test_accepted_inputs_normalize_to_storage() {
        let cases = [
            json!("2024-03-01 10:20:30"),
            json!("2024-03-01T10:20:30"),
            json!("2024-03-01T10:20:30.123456"),
            json!("2024-03-01T12:20:30+02:00"),
            json!("2024-03-01T10:20:30Z"),
            json!(1709288430),
        ];
        for input in cases {
            assert_eq!(
                DateCaster::format_for_storage::<Event>("starts_at", input.clone()).unwrap(),
                json!("2024-03-01 10:20:30"),
                "input {}",
                input
            );
        }
        assert_eq!(
            DateCaster::format_for_storage::<Event>("created_at", json!("2024-03-01")).unwrap(),
            json!("2024-03-01 00:00:00")
        );
    }

    #[test]
    fn test_storage_is_idempotent() {
        let once = DateCaster::format_for_storage::<Event>("updated_at", json!("2023-12-31T23:59:59.999Z")).unwrap();
        let twice = DateCaster::format_for_storage::<Event>("updated_at", once.clone()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, json!("2023-12-31 23:59:59"));
    }

    #[test]
    fn test_invalid_and_passthrough_values() {
        let err = DateCaster::format_for_storage::<Event>("starts_at", json!("next tuesday")).unwrap_err();
        assert!(matches!(err, ModelError::InvalidDate { .. }));

        assert_eq!(
            DateCaster::format_for_storage::<Event>("title", json!("next tuesday")).unwrap(),
            json!("next tuesday")
        );
        assert_eq!(
            DateCaster::format_for_storage::<Event>("starts_at", JsonValue::Null).unwrap(),
            JsonValue::Null
        );
    }

    #[test]
    fn test_display_override_falls_back_to_default() {
        let stored = json!("2024-03-01 10:20:30");
        assert_eq!(DateCaster::format_for_display::<Event>("starts_at", &stored), json!("01/03/2024"));
        assert_eq!(DateCaster::format_for_display::<Event>("created_at", &stored), stored);
        assert_eq!(DateCaster::format_for_display::<Event>("title", &json!(3)), json!(3));
    }
}
