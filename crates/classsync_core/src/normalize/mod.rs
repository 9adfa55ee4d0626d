//! Raw payload → canonical entity normalizers.
//!
//! # Responsibility
//! - Map shape-ambiguous backend and cache records onto the fixed model.
//! - Keep every field fallback as a named, ordered probe list.
//!
//! # Invariants
//! - Normalizers never fail: invalid input yields a defaulted entity.
//! - A string input is a bare identifier of the expected kind.
//! - Normalizing the serialized output of a normalizer is a no-op.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

mod assessment;
mod course;
mod lesson_plan;
mod people;

pub use assessment::{normalize_assessment_batch, normalize_mark_entry, upsert_entries};
pub use course::{normalize_campus, normalize_course};
pub use lesson_plan::normalize_lesson_plan;
pub use people::{normalize_student, normalize_students, normalize_teacher};

static LEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(-?\d+(?:\.\d+)?)").expect("valid leading number regex"));

/// Returns the first probed field holding a usable value.
///
/// Nulls and blank strings count as absent so the next field is tried.
pub(crate) fn probe<'a>(map: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| map.get(*field))
        .find(|value| match value {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            _ => true,
        })
}

/// Probes `fields` for a text value; numbers are stringified.
pub(crate) fn probe_text(map: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match map.get(*field)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

/// Probes `fields` for a number; numeric prefixes of strings (`"40 marks"`)
/// are accepted.
pub(crate) fn probe_number(map: &Map<String, Value>, fields: &[&str]) -> Option<f64> {
    fields.iter().find_map(|field| match map.get(*field)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_leading_number(text),
        _ => None,
    })
}

/// Probes `fields` for a list, accepting `{data:[...]}` wrappers.
pub(crate) fn probe_list<'a>(map: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a [Value]> {
    fields
        .iter()
        .find_map(|field| map.get(*field).and_then(crate::aggregate::unwrap_list))
}

pub(crate) fn parse_leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Joins `firstName`/`lastName` style parts when no full name field exists.
pub(crate) fn composed_name(map: &Map<String, Value>) -> Option<String> {
    let first = probe_text(map, &["firstName", "first_name"]);
    let last = probe_text(map, &["lastName", "last_name"]);
    match (first, last) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (Some(part), None) | (None, Some(part)) => Some(part),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_leading_number, probe, probe_number, probe_text};
    use serde_json::json;

    #[test]
    fn probe_skips_null_and_blank_fields() {
        let raw = json!({"name": "", "fullName": null, "title": "Ada"});
        let map = raw.as_object().unwrap();
        assert_eq!(probe(map, &["name", "fullName", "title"]), Some(&json!("Ada")));
        assert_eq!(probe_text(map, &["name", "fullName"]), None);
    }

    #[test]
    fn numbers_parse_from_numeric_prefixes() {
        assert_eq!(parse_leading_number("40 marks"), Some(40.0));
        assert_eq!(parse_leading_number(" 12.5/20"), Some(12.5));
        assert_eq!(parse_leading_number("n/a"), None);

        let raw = json!({"maxMarks": "50", "total": 10});
        assert_eq!(
            probe_number(raw.as_object().unwrap(), &["totalMarks", "maxMarks", "total"]),
            Some(50.0)
        );
    }
}
