//! Assessment batches and their per-student mark entries.

use serde::{Deserialize, Serialize};

/// One student's result inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEntry {
    pub student_id: String,
    pub marks: f64,
    #[serde(default)]
    pub remarks: String,
}

impl MarkEntry {
    /// Entry seeded for a student who has not been graded yet.
    pub fn blank(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            marks: 0.0,
            remarks: String::new(),
        }
    }
}

/// One assessment instance (quiz, exam, ...) for a course.
///
/// # Invariants
/// - At most one entry per `student_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentBatch {
    pub batch_id: String,
    pub course_id: String,
    /// Serialized as `type` to match the backend schema.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Calendar date as sent by the backend, usually `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    pub total_marks: f64,
    #[serde(default)]
    pub entries: Vec<MarkEntry>,
}

impl AssessmentBatch {
    pub fn entry_for(&self, student_id: &str) -> Option<&MarkEntry> {
        self.entries
            .iter()
            .find(|entry| entry.student_id == student_id)
    }
}

/// Metadata supplied by the teacher when creating or editing a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDraft {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    pub total_marks: f64,
}
