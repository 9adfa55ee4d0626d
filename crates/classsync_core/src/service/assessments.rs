//! Assessment batch screen: listing, creation and mark entry.
//!
//! Every write is followed by a targeted re-read of the batch it touched.
//! Batches are not cached; a failed list read degrades to an empty list.

use super::orchestrator::{unwrap_record, Hydrated, Orchestrator, OrchestratorError, OrchestratorResult};
use crate::aggregate::{dedup_by_id, list_or_empty};
use crate::identity::DIGEST_ID_PREFIX;
use crate::model::assessment::{AssessmentBatch, BatchDraft, MarkEntry};
use crate::normalize::{normalize_assessment_batch, upsert_entries};
use crate::remote::{Endpoint, Method, RemoteError};
use log::{info, warn};
use serde_json::json;
use uuid::Uuid;

/// Prefix of batch ids minted locally when the backend does not echo one.
pub const PROVISIONAL_BATCH_PREFIX: &str = "local-";

impl Orchestrator {
    /// Lists the batches of one course.
    pub async fn load_batches(&self, course_id: &str) -> OrchestratorResult<Hydrated<Vec<AssessmentBatch>>> {
        let credential = self.credential()?;
        let payload = match self
            .remote
            .get(Some(&credential), &Endpoint::course_batches(course_id))
            .await
        {
            Ok(payload) => payload,
            Err(RemoteError::MissingCredential) => return Err(OrchestratorError::MissingCredential),
            Err(err) => {
                info!(
                    "event=screen_load module=orchestrator screen=assessments status=degraded course_id={} error_code={}",
                    course_id,
                    err.code()
                );
                return Ok(Hydrated::stale(Vec::new(), err));
            }
        };

        let raw = list_or_empty(&payload);
        let batches = raw
            .iter()
            .map(normalize_assessment_batch)
            .map(|mut batch| {
                if batch.course_id.is_empty() {
                    batch.course_id = course_id.to_string();
                }
                batch
            });
        let batches = dedup_by_id(batches, |batch| batch.batch_id.as_str());
        info!(
            "event=screen_load module=orchestrator screen=assessments status=ok origin=remote course_id={} batches={}",
            course_id,
            batches.len()
        );
        Ok(Hydrated::remote(batches))
    }

    /// Reads one batch.
    pub async fn load_batch(&self, batch_id: &str) -> OrchestratorResult<AssessmentBatch> {
        let credential = self.credential()?;
        self.read_batch(&credential, batch_id).await
    }

    /// Creates a batch seeded with one blank entry per roster student.
    ///
    /// The roster is the course's own or, when that is empty, the campus
    /// roster. If the backend does not return an id the batch keeps a
    /// provisional one and the re-read is skipped.
    pub async fn create_batch(&self, course_id: &str, draft: &BatchDraft) -> OrchestratorResult<AssessmentBatch> {
        let credential = self.credential()?;
        let roster = self.course_roster(course_id).await?;
        let entries: Vec<MarkEntry> = roster
            .students
            .iter()
            .map(|student| MarkEntry::blank(student.id.clone()))
            .collect();

        let body = json!({
            "courseId": course_id,
            "type": draft.kind,
            "title": draft.title,
            "description": draft.description,
            "date": draft.date,
            "totalMarks": draft.total_marks,
            "entries": entries,
        });
        let created = self
            .remote
            .fetch(Some(&credential), Method::Post, &Endpoint::batches(), Some(body))
            .await?;

        let echoed = normalize_assessment_batch(unwrap_record(&created));
        let seeded = AssessmentBatch {
            batch_id: echoed.batch_id,
            course_id: course_id.to_string(),
            kind: draft.kind.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            date: draft.date.clone(),
            total_marks: draft.total_marks,
            entries,
        };
        info!(
            "event=batch_create module=orchestrator status=ok course_id={} roster_source={} entries={}",
            course_id,
            roster.source.as_str(),
            seeded.entries.len()
        );

        if seeded.batch_id.is_empty() || seeded.batch_id.starts_with(DIGEST_ID_PREFIX) {
            let provisional = format!("{PROVISIONAL_BATCH_PREFIX}{}", Uuid::new_v4());
            warn!(
                "event=batch_create module=orchestrator status=degraded course_id={} error_code=missing_batch_id batch_id={}",
                course_id, provisional
            );
            return Ok(AssessmentBatch {
                batch_id: provisional,
                ..seeded
            });
        }

        match self.read_batch(&credential, &seeded.batch_id).await {
            Ok(mut fetched) => {
                if fetched.entries.is_empty() {
                    fetched.entries = seeded.entries;
                }
                if fetched.course_id.is_empty() {
                    fetched.course_id = seeded.course_id;
                }
                Ok(fetched)
            }
            Err(OrchestratorError::Remote(err)) => {
                warn!(
                    "event=batch_reread module=orchestrator status=degraded batch_id={} error_code={}",
                    seeded.batch_id,
                    err.code()
                );
                Ok(seeded)
            }
            Err(err) => Err(err),
        }
    }

    /// Updates batch metadata; entries are left untouched.
    pub async fn update_batch_metadata(&self, batch_id: &str, draft: &BatchDraft) -> OrchestratorResult<AssessmentBatch> {
        let credential = self.credential()?;
        let body = json!({
            "type": draft.kind,
            "title": draft.title,
            "description": draft.description,
            "date": draft.date,
            "totalMarks": draft.total_marks,
        });
        self.remote
            .fetch(Some(&credential), Method::Put, &Endpoint::batch(batch_id), Some(body))
            .await?;
        info!(
            "event=batch_update module=orchestrator status=ok batch_id={}",
            batch_id
        );
        self.read_batch(&credential, batch_id).await
    }

    /// Bulk-upserts mark entries.
    ///
    /// Submitted entries are laid over the re-read so a lagging backend
    /// does not show the old marks.
    pub async fn upsert_marks(&self, batch_id: &str, entries: Vec<MarkEntry>) -> OrchestratorResult<AssessmentBatch> {
        let credential = self.credential()?;
        let entries = upsert_entries(Vec::new(), entries);
        let body = json!({ "entries": entries });
        self.remote
            .fetch(Some(&credential), Method::Put, &Endpoint::batch_marks(batch_id), Some(body))
            .await?;
        info!(
            "event=marks_upsert module=orchestrator status=ok batch_id={} entries={}",
            batch_id,
            entries.len()
        );

        let mut batch = self.read_batch(&credential, batch_id).await?;
        batch.entries = upsert_entries(batch.entries, entries);
        Ok(batch)
    }

    pub async fn remove_student_from_batch(&self, batch_id: &str, student_id: &str) -> OrchestratorResult<AssessmentBatch> {
        let credential = self.credential()?;
        self.remote
            .fetch(
                Some(&credential),
                Method::Delete,
                &Endpoint::batch_student(batch_id, student_id),
                None,
            )
            .await?;
        info!(
            "event=batch_remove_student module=orchestrator status=ok batch_id={} student_id={}",
            batch_id, student_id
        );

        let mut batch = self.read_batch(&credential, batch_id).await?;
        batch.entries.retain(|entry| entry.student_id != student_id);
        Ok(batch)
    }

    async fn read_batch(&self, credential: &str, batch_id: &str) -> OrchestratorResult<AssessmentBatch> {
        let payload = self.remote.get(Some(credential), &Endpoint::batch(batch_id)).await?;
        let record = unwrap_record(&payload);
        if record.is_null() {
            return Err(OrchestratorError::NotFound(format!("batch `{batch_id}`")));
        }
        let mut batch = normalize_assessment_batch(record);
        if batch.batch_id.is_empty() || batch.batch_id.starts_with(DIGEST_ID_PREFIX) {
            batch.batch_id = batch_id.to_string();
        }
        Ok(batch)
    }
}
