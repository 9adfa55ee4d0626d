//! Attendance payload classification and partitioning.
//!
//! Backends report attendance in four shapes. Each shape is a variant of
//! [`AttendanceShape`]; [`classify_attendance`] is the only place that probes
//! payload structure, and it tries shapes in a fixed priority order:
//!
//! 1. Labeled records: a list (bare, or wrapped under `records`/`attendance`/
//!    `students`/`data`) whose records carry a `status` label. Wrapped lists
//!    whose records only carry a boolean flag also land here.
//! 2. Present/absent lists: an object with `present`/`absent` arrays of
//!    students or bare ids.
//! 3. Flagged list: a bare list of records carrying only a boolean flag.
//! 4. Aggregate counts: an object with only present/absent counts. The first
//!    N roster members are marked present and the next M absent, in roster
//!    order. Count-only data cannot say who was present; this ordering is an
//!    approximation.
//!
//! Anything else resolves to an empty partition. Students are resolved
//! against the roster and ids the roster does not know are dropped, so the
//! union of both lists never exceeds the roster. Each list is then
//! deduplicated by student id and a student found in both lists is kept as
//! present only.

use crate::aggregate::dedup_by_id;
use crate::identity::explicit_id;
use crate::model::attendance::AttendanceRecord;
use crate::model::people::Student;
use crate::normalize::normalize_student;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const ENVELOPE_FIELDS: &[&str] = &["data", "result"];
const RECORD_LIST_FIELDS: &[&str] = &["records", "attendance", "students", "data"];
const STATUS_FIELDS: &[&str] = &["status", "attendanceStatus", "state"];
const FLAG_FIELDS: &[&str] = &["isPresent", "present", "attended"];
const PRESENT_LIST_FIELDS: &[&str] = &["present", "presentStudents"];
const ABSENT_LIST_FIELDS: &[&str] = &["absent", "absentStudents"];
const PRESENT_COUNT_FIELDS: &[&str] = &["presentCount", "totalPresent", "present"];
const ABSENT_COUNT_FIELDS: &[&str] = &["absentCount", "totalAbsent", "absent"];
const STUDENT_REF_FIELDS: &[&str] = &["student", "studentId"];
const PRESENT_LABELS: &[&str] = &["present", "p", "late", "attended"];

/// Recognized attendance payload shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceShape<'a> {
    LabeledRecords(&'a [Value]),
    PresentAbsentLists {
        present: &'a [Value],
        absent: &'a [Value],
    },
    FlaggedList(&'a [Value]),
    AggregateCounts {
        present: usize,
        absent: usize,
    },
    Unrecognized,
}

impl AttendanceShape<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LabeledRecords(_) => "labeled_records",
            Self::PresentAbsentLists { .. } => "present_absent_lists",
            Self::FlaggedList(_) => "flagged_list",
            Self::AggregateCounts { .. } => "aggregate_counts",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Classifies `payload` into exactly one shape.
pub fn classify_attendance(payload: &Value) -> AttendanceShape<'_> {
    let payload = peel_envelope(payload);

    if let Some((records, wrapped)) = record_list(payload) {
        let labeled = records.iter().any(|record| status_label(record).is_some());
        let flagged = records.iter().any(|record| presence_flag(record).is_some());
        if labeled || (wrapped && flagged) {
            return AttendanceShape::LabeledRecords(records);
        }
    }

    if let Value::Object(map) = payload {
        let present = list_field(map, PRESENT_LIST_FIELDS);
        let absent = list_field(map, ABSENT_LIST_FIELDS);
        if present.is_some() || absent.is_some() {
            return AttendanceShape::PresentAbsentLists {
                present: present.unwrap_or(&[]),
                absent: absent.unwrap_or(&[]),
            };
        }
    }

    if let Value::Array(records) = payload {
        if records.iter().any(|record| presence_flag(record).is_some()) {
            return AttendanceShape::FlaggedList(records);
        }
    }

    if let Value::Object(map) = payload {
        let present = count_field(map, PRESENT_COUNT_FIELDS);
        let absent = count_field(map, ABSENT_COUNT_FIELDS);
        if present.is_some() || absent.is_some() {
            return AttendanceShape::AggregateCounts {
                present: present.unwrap_or(0),
                absent: absent.unwrap_or(0),
            };
        }
    }

    AttendanceShape::Unrecognized
}

/// Classifies `payload` and partitions it against `roster`.
///
/// Students referenced by id are resolved to the matching roster record so
/// every shape yields the same canonical students. Students missing from the
/// roster are dropped.
pub fn resolve_attendance(payload: &Value, roster: &[Student]) -> AttendanceRecord {
    let roster_index: HashMap<&str, &Student> = roster
        .iter()
        .map(|student| (student.id.as_str(), student))
        .collect();
    let lookup = |record: &Value| record_student(record, &roster_index);

    let (present, absent) = match classify_attendance(payload) {
        AttendanceShape::LabeledRecords(records) | AttendanceShape::FlaggedList(records) => {
            let mut present = Vec::new();
            let mut absent = Vec::new();
            for record in records {
                let Some(student) = lookup(record) else {
                    continue;
                };
                if record_is_present(record) {
                    present.push(student);
                } else {
                    absent.push(student);
                }
            }
            (present, absent)
        }
        AttendanceShape::PresentAbsentLists { present, absent } => (
            present.iter().filter_map(lookup).collect(),
            absent.iter().filter_map(lookup).collect(),
        ),
        AttendanceShape::AggregateCounts { present, absent } => {
            let present_len = present.min(roster.len());
            let absent_len = absent.min(roster.len() - present_len);
            (
                roster[..present_len].to_vec(),
                roster[present_len..present_len + absent_len].to_vec(),
            )
        }
        AttendanceShape::Unrecognized => (Vec::new(), Vec::new()),
    };

    finalize_partition(present, absent)
}

/// Dedups both partitions by id; present wins when a student is in both.
pub fn finalize_partition(present: Vec<Student>, absent: Vec<Student>) -> AttendanceRecord {
    let present = dedup_by_id(present, |student| student.id.as_str());
    let present_ids: HashSet<&str> = present.iter().map(|student| student.id.as_str()).collect();
    let absent = dedup_by_id(
        absent
            .into_iter()
            .filter(|student| !present_ids.contains(student.id.as_str())),
        |student| student.id.as_str(),
    );
    AttendanceRecord { present, absent }
}

fn peel_envelope(payload: &Value) -> &Value {
    let Value::Object(map) = payload else {
        return payload;
    };
    let own_shape = PRESENT_LIST_FIELDS
        .iter()
        .chain(ABSENT_LIST_FIELDS)
        .chain(ABSENT_COUNT_FIELDS)
        .chain(PRESENT_COUNT_FIELDS)
        .chain(RECORD_LIST_FIELDS.iter().filter(|field| **field != "data"))
        .any(|field| map.contains_key(*field));
    if own_shape {
        return payload;
    }
    ENVELOPE_FIELDS
        .iter()
        .find_map(|field| map.get(*field).filter(|inner| inner.is_object()))
        .unwrap_or(payload)
}

fn record_list(payload: &Value) -> Option<(&[Value], bool)> {
    match payload {
        Value::Array(records) => Some((records.as_slice(), false)),
        Value::Object(map) => list_field(map, RECORD_LIST_FIELDS).map(|records| (records, true)),
        _ => None,
    }
}

fn list_field<'a>(map: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a [Value]> {
    fields.iter().find_map(|field| match map.get(*field) {
        Some(Value::Array(items)) => Some(items.as_slice()),
        _ => None,
    })
}

fn count_field(map: &Map<String, Value>, fields: &[&str]) -> Option<usize> {
    fields.iter().find_map(|field| match map.get(*field)? {
        Value::Number(number) => number.as_f64().map(|count| count.max(0.0) as usize),
        Value::String(text) => crate::normalize::parse_leading_number(text)
            .map(|count| count.max(0.0) as usize),
        _ => None,
    })
}

fn status_label(record: &Value) -> Option<&str> {
    let map = record.as_object()?;
    STATUS_FIELDS
        .iter()
        .find_map(|field| map.get(*field).and_then(Value::as_str))
}

fn presence_flag(record: &Value) -> Option<bool> {
    let map = record.as_object()?;
    FLAG_FIELDS
        .iter()
        .find_map(|field| map.get(*field).and_then(Value::as_bool))
}

/// Status label first, then boolean flag; records with neither count as absent.
fn record_is_present(record: &Value) -> bool {
    if let Some(label) = status_label(record) {
        let label = label.trim().to_ascii_lowercase();
        return PRESENT_LABELS.contains(&label.as_str());
    }
    presence_flag(record).unwrap_or(false)
}

fn record_student(record: &Value, roster_index: &HashMap<&str, &Student>) -> Option<Student> {
    let candidate = match record {
        Value::Object(map) => match STUDENT_REF_FIELDS
            .iter()
            .find_map(|field| map.get(*field).filter(|value| !value.is_null()))
        {
            Some(reference) => normalize_student(reference),
            None => normalize_student(record),
        },
        Value::Null => return None,
        other => Student::bare(explicit_id(other)?),
    };
    if candidate.id.is_empty() {
        return None;
    }

    roster_index
        .get(candidate.id.as_str())
        .map(|known| (*known).clone())
}
