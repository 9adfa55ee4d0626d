use super::people::{normalize_students, normalize_teacher};
use super::{probe, probe_list, probe_text};
use crate::identity::canonical_id;
use crate::model::course::{Campus, Course};
use crate::model::people::Teacher;
use crate::model::PLACEHOLDER_GLYPH;
use serde_json::Value;

const COURSE_NAME_FIELDS: &[&str] = &["name", "title", "courseName"];
const COURSE_CODE_FIELDS: &[&str] = &["code", "courseCode", "shortCode"];
const COURSE_DESCRIPTION_FIELDS: &[&str] = &["description", "summary", "details"];
const COURSE_TEACHER_FIELDS: &[&str] = &["teacher", "teacherId", "instructor", "assignedTeacher"];
const COURSE_ROSTER_FIELDS: &[&str] = &["students", "roster", "enrolledStudents", "enrollments"];
const CAMPUS_NAME_FIELDS: &[&str] = &["name", "campusName", "title"];

/// Normalizes one raw course.
///
/// The teacher may be embedded as a record or referenced by id; the roster
/// may be absent, a bare list, or a `{data:[...]}` wrapper.
pub fn normalize_course(raw: &Value) -> Course {
    match raw {
        Value::Object(map) => Course {
            id: canonical_id(raw),
            name: probe_text(map, COURSE_NAME_FIELDS)
                .unwrap_or_else(|| PLACEHOLDER_GLYPH.to_string()),
            code: probe_text(map, COURSE_CODE_FIELDS).unwrap_or_default(),
            description: probe_text(map, COURSE_DESCRIPTION_FIELDS).unwrap_or_default(),
            teacher: probe(map, COURSE_TEACHER_FIELDS)
                .map(normalize_teacher)
                .unwrap_or_else(Teacher::unassigned),
            students: probe_list(map, COURSE_ROSTER_FIELDS)
                .map(normalize_students)
                .unwrap_or_default(),
        },
        Value::Null => bare_course(String::new()),
        other => bare_course(canonical_id(other)),
    }
}

fn bare_course(id: String) -> Course {
    Course {
        id,
        name: PLACEHOLDER_GLYPH.to_string(),
        code: String::new(),
        description: String::new(),
        teacher: Teacher::unassigned(),
        students: Vec::new(),
    }
}

pub fn normalize_campus(raw: &Value) -> Campus {
    let name = raw
        .as_object()
        .and_then(|map| probe_text(map, CAMPUS_NAME_FIELDS))
        .unwrap_or_else(|| PLACEHOLDER_GLYPH.to_string());
    let id = if raw.is_null() {
        String::new()
    } else {
        canonical_id(raw)
    };
    Campus { id, name }
}
