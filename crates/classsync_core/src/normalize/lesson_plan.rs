use super::{probe, probe_text};
use crate::identity::{canonical_id, explicit_id};
use crate::model::lesson_plan::LessonPlan;
use crate::model::PLACEHOLDER_GLYPH;
use serde_json::Value;

const PLAN_COURSE_FIELDS: &[&str] = &["courseId", "course"];
const PLAN_TITLE_FIELDS: &[&str] = &["title", "topic", "name"];
const PLAN_DATE_FIELDS: &[&str] = &["date", "plannedFor", "scheduledDate"];
const PLAN_CONTENT_FIELDS: &[&str] = &["content", "body", "description", "notes"];

/// Normalizes one lesson plan; `fallback_course_id` fills plans listed under
/// a course endpoint that omit their own course reference.
pub fn normalize_lesson_plan(raw: &Value, fallback_course_id: &str) -> LessonPlan {
    let map = raw.as_object();
    let text = |fields: &[&str]| map.and_then(|map| probe_text(map, fields));

    LessonPlan {
        id: canonical_id(raw),
        course_id: map
            .and_then(|map| probe(map, PLAN_COURSE_FIELDS))
            .and_then(explicit_id)
            .unwrap_or_else(|| fallback_course_id.to_string()),
        title: text(PLAN_TITLE_FIELDS).unwrap_or_else(|| PLACEHOLDER_GLYPH.to_string()),
        date: text(PLAN_DATE_FIELDS).unwrap_or_default(),
        content: text(PLAN_CONTENT_FIELDS).unwrap_or_default(),
    }
}
