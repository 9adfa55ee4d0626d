use super::{composed_name, probe, probe_text};
use crate::aggregate::dedup_by_id;
use crate::identity::{canonical_id, explicit_id};
use crate::model::people::{Student, Teacher};
use crate::model::PLACEHOLDER_GLYPH;
use serde_json::Value;

pub(crate) const STUDENT_WRAPPER_FIELDS: &[&str] = &["student", "user"];
const STUDENT_NAME_FIELDS: &[&str] = &["name", "fullName", "studentName", "username"];
const STUDENT_EMAIL_FIELDS: &[&str] = &["email", "emailAddress", "mail"];
const STUDENT_PHONE_FIELDS: &[&str] = &["phone", "phoneNumber", "mobile", "contact"];
const TEACHER_NAME_FIELDS: &[&str] = &["name", "fullName", "teacherName", "username"];

/// Normalizes one raw student.
///
/// Enrollment rows that embed the student (`{student: {...}, enrolledAt}`)
/// are unwrapped first. Object students without any id get a structural
/// digest id so they stay deduplicable.
pub fn normalize_student(raw: &Value) -> Student {
    match raw {
        Value::Object(map) => {
            if !map.contains_key("name") {
                if let Some(inner) = probe(map, STUDENT_WRAPPER_FIELDS) {
                    return normalize_student(inner);
                }
            }

            Student {
                id: canonical_id(raw),
                name: probe_text(map, STUDENT_NAME_FIELDS)
                    .or_else(|| composed_name(map))
                    .unwrap_or_else(|| PLACEHOLDER_GLYPH.to_string()),
                email: probe_text(map, STUDENT_EMAIL_FIELDS).unwrap_or_default(),
                phone: probe_text(map, STUDENT_PHONE_FIELDS).unwrap_or_default(),
            }
        }
        Value::Null => Student::bare(String::new()),
        other => Student::bare(explicit_id(other).unwrap_or_default()),
    }
}

/// Normalizes a raw list, dropping nulls and keeping the first record per id.
pub fn normalize_students(raw: &[Value]) -> Vec<Student> {
    dedup_by_id(
        raw.iter()
            .filter(|value| !value.is_null())
            .map(normalize_student)
            .filter(|student| !student.id.is_empty()),
        |student| student.id.as_str(),
    )
}

/// Normalizes a teacher reference or record.
///
/// `"t1"` becomes `{id:"t1", name:"—"}`; null or id-less input becomes the
/// unassigned sentinel.
pub fn normalize_teacher(raw: &Value) -> Teacher {
    match raw {
        Value::Object(map) => Teacher {
            id: explicit_id(raw).unwrap_or_default(),
            name: probe_text(map, TEACHER_NAME_FIELDS)
                .or_else(|| composed_name(map))
                .unwrap_or_else(|| PLACEHOLDER_GLYPH.to_string()),
        },
        Value::Null | Value::Array(_) => Teacher::unassigned(),
        other => match explicit_id(other) {
            Some(id) => Teacher::bare(id),
            None => Teacher::unassigned(),
        },
    }
}
