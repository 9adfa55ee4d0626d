use super::{probe, probe_list, probe_number, probe_text};
use crate::identity::{canonical_id, explicit_id};
use crate::model::assessment::{AssessmentBatch, MarkEntry};
use crate::model::PLACEHOLDER_GLYPH;
use serde_json::Value;

const BATCH_ID_FIELDS: &[&str] = &["batchId", "_id", "id"];
const BATCH_COURSE_FIELDS: &[&str] = &["courseId", "course"];
const BATCH_KIND_FIELDS: &[&str] = &["type", "assessmentType", "kind"];
const BATCH_TITLE_FIELDS: &[&str] = &["title", "name"];
const BATCH_DESCRIPTION_FIELDS: &[&str] = &["description", "notes"];
const BATCH_DATE_FIELDS: &[&str] = &["date", "assessmentDate", "heldOn"];
const BATCH_TOTAL_FIELDS: &[&str] = &["totalMarks", "maxMarks", "total", "outOf"];
const BATCH_ENTRY_FIELDS: &[&str] = &["entries", "marks", "results", "students"];
const ENTRY_STUDENT_FIELDS: &[&str] = &["studentId", "student"];
const ENTRY_MARK_FIELDS: &[&str] = &["marks", "score", "obtainedMarks", "mark"];
const ENTRY_REMARK_FIELDS: &[&str] = &["remarks", "remark", "comment", "comments"];

/// Normalizes one raw batch.
///
/// Entries without a resolvable student are dropped; repeated students are
/// merged with [`upsert_entries`].
pub fn normalize_assessment_batch(raw: &Value) -> AssessmentBatch {
    let Some(map) = raw.as_object() else {
        return AssessmentBatch {
            batch_id: explicit_id(raw).unwrap_or_default(),
            course_id: String::new(),
            kind: String::new(),
            title: PLACEHOLDER_GLYPH.to_string(),
            description: String::new(),
            date: String::new(),
            total_marks: 0.0,
            entries: Vec::new(),
        };
    };

    let entries = probe_list(map, BATCH_ENTRY_FIELDS)
        .map(|raw_entries| {
            upsert_entries(
                Vec::new(),
                raw_entries.iter().filter_map(normalize_mark_entry),
            )
        })
        .unwrap_or_default();

    AssessmentBatch {
        batch_id: probe(map, BATCH_ID_FIELDS)
            .and_then(explicit_id)
            .unwrap_or_else(|| canonical_id(raw)),
        course_id: probe(map, BATCH_COURSE_FIELDS)
            .and_then(explicit_id)
            .unwrap_or_default(),
        kind: probe_text(map, BATCH_KIND_FIELDS).unwrap_or_default(),
        title: probe_text(map, BATCH_TITLE_FIELDS).unwrap_or_else(|| PLACEHOLDER_GLYPH.to_string()),
        description: probe_text(map, BATCH_DESCRIPTION_FIELDS).unwrap_or_default(),
        date: probe_text(map, BATCH_DATE_FIELDS).unwrap_or_default(),
        total_marks: probe_number(map, BATCH_TOTAL_FIELDS).unwrap_or(0.0),
        entries,
    }
}

/// Normalizes one mark entry; `None` when no student can be identified.
///
/// A record with no student reference is itself taken as the student
/// (`students: [{_id, name, marks}]` payloads).
pub fn normalize_mark_entry(raw: &Value) -> Option<MarkEntry> {
    let map = match raw {
        Value::Object(map) => map,
        other => return explicit_id(other).map(MarkEntry::blank),
    };

    let student_id = match probe(map, ENTRY_STUDENT_FIELDS) {
        Some(reference) => explicit_id(reference),
        None => explicit_id(raw),
    }?;

    Some(MarkEntry {
        student_id,
        marks: probe_number(map, ENTRY_MARK_FIELDS).unwrap_or(0.0),
        remarks: probe_text(map, ENTRY_REMARK_FIELDS).unwrap_or_default(),
    })
}

/// Merges `updates` into `existing`, keyed by student id.
///
/// An update replaces the stored entry for its student in place; students
/// not seen before are appended in update order.
pub fn upsert_entries(
    mut existing: Vec<MarkEntry>,
    updates: impl IntoIterator<Item = MarkEntry>,
) -> Vec<MarkEntry> {
    for update in updates {
        match existing
            .iter_mut()
            .find(|entry| entry.student_id == update.student_id)
        {
            Some(slot) => *slot = update,
            None => existing.push(update),
        }
    }
    existing
}

#[cfg(test)]
mod tests {
    use super::{normalize_assessment_batch, normalize_mark_entry, upsert_entries};
    use crate::model::assessment::MarkEntry;
    use serde_json::json;

    #[test]
    fn batch_probes_alternative_fields() {
        let batch = normalize_assessment_batch(&json!({
            "_id": "b1",
            "course": {"_id": "c1", "name": "Algebra"},
            "assessmentType": "quiz",
            "name": "Quiz 1",
            "maxMarks": "20",
            "results": [
                {"student": {"_id": "s1"}, "score": 15, "comment": "good"},
                {"studentId": "s2", "marks": "12.5"}
            ]
        }));
        assert_eq!(batch.batch_id, "b1");
        assert_eq!(batch.course_id, "c1");
        assert_eq!(batch.kind, "quiz");
        assert_eq!(batch.title, "Quiz 1");
        assert_eq!(batch.total_marks, 20.0);
        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.entry_for("s1").unwrap().remarks, "good");
        assert_eq!(batch.entry_for("s2").unwrap().marks, 12.5);
    }

    #[test]
    fn repeated_students_keep_one_entry() {
        let batch = normalize_assessment_batch(&json!({
            "batchId": "b2",
            "entries": [
                {"studentId": "s1", "marks": 1},
                {"studentId": "s2", "marks": 2},
                {"studentId": "s1", "marks": 3},
                {"marks": 9}
            ]
        }));
        let ids: Vec<&str> = batch.entries.iter().map(|e| e.student_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
        assert_eq!(batch.entries[0].marks, 3.0);
    }

    #[test]
    fn batch_normalization_is_idempotent() {
        let once = normalize_assessment_batch(&json!({
            "_id": "b3",
            "courseId": "c1",
            "type": "exam",
            "title": "Final",
            "date": "2024-05-01",
            "totalMarks": 100,
            "entries": [{"studentId": "s1", "marks": 88, "remarks": ""}]
        }));
        let twice = normalize_assessment_batch(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }

    #[test]
    fn entries_from_bare_ids_are_blank() {
        assert_eq!(normalize_mark_entry(&json!("s9")), Some(MarkEntry::blank("s9")));
        assert_eq!(normalize_mark_entry(&json!(null)), None);
    }

    #[test]
    fn upsert_replaces_in_place_and_appends_new() {
        let merged = upsert_entries(
            vec![MarkEntry::blank("s1"), MarkEntry::blank("s2")],
            vec![
                MarkEntry {
                    student_id: "s2".to_string(),
                    marks: 7.0,
                    remarks: "late".to_string(),
                },
                MarkEntry::blank("s3"),
            ],
        );
        let ids: Vec<&str> = merged.iter().map(|e| e.student_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
        assert_eq!(merged[1].marks, 7.0);
    }
}
