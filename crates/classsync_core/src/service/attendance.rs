//! Attendance screens: one course on one date, and the per-campus report.

use super::orchestrator::{Orchestrator, OrchestratorError, OrchestratorResult};
use crate::model::attendance::AttendanceRecord;
use crate::model::course::Course;
use crate::model::people::Student;
use crate::remote::{Endpoint, RemoteError};
use crate::resolve::{classify_attendance, resolve_attendance, resolve_roster, ResolvedRoster, RosterSource};
use crate::settle::{settle_all, tally};
use log::{debug, info};

/// One course's attendance on the report date.
///
/// A course whose fetch failed keeps the whole roster absent and carries the
/// failure in `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRow {
    pub course_id: String,
    pub course_label: String,
    pub roster_source: RosterSource,
    pub record: AttendanceRecord,
    pub error: Option<RemoteError>,
}

impl AttendanceRow {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceReport {
    pub campus_id: String,
    pub date: String,
    pub rows: Vec<AttendanceRow>,
}

impl AttendanceReport {
    pub fn failed_courses(&self) -> usize {
        self.rows.iter().filter(|row| row.is_degraded()).count()
    }
}

impl Orchestrator {
    /// Attendance of one course on `date`.
    pub async fn course_attendance(&self, course_id: &str, date: &str) -> OrchestratorResult<AttendanceRecord> {
        let credential = self.credential()?;
        let ticket = self.selection.ticket();
        let roster = self.course_roster(course_id).await?;
        let record = self
            .fetch_attendance(&credential, course_id, date, &roster.students)
            .await?;
        self.ensure_current(&ticket, "attendance")?;
        Ok(record)
    }

    /// Attendance of every course of the current campus on `date`.
    ///
    /// An empty course cache is filled from the backend first. Courses are
    /// fetched concurrently and independently; a failed course becomes a
    /// degraded row instead of failing the report.
    pub async fn attendance_report(&self, date: &str) -> OrchestratorResult<AttendanceReport> {
        let ticket = self.selection.ticket();
        let campus_id = self.require_campus(&ticket)?;
        let credential = self.credential()?;
        let courses: Vec<Course> = self.hydrated_courses(&campus_id, None).await?;
        self.ensure_current(&ticket, "attendance_report")?;
        let campus_roster = self.cached_campus_roster(&campus_id);

        let rosters: Vec<ResolvedRoster> = courses
            .iter()
            .map(|course| resolve_roster(&course.students, &campus_roster))
            .collect();

        let tasks = courses.iter().zip(rosters.iter()).map(|(course, roster)| {
            let fut = self.fetch_attendance(&credential, &course.id, date, &roster.students);
            ((course, roster), fut)
        });
        let settled = settle_all(tasks).await;
        self.ensure_current(&ticket, "attendance_report")?;
        let (_, failed) = tally(&settled);

        let mut rows = Vec::with_capacity(settled.len());
        for task in settled {
            let (course, roster) = task.key;
            let (record, error) = match task.outcome {
                Ok(record) => (record, None),
                Err(RemoteError::MissingCredential) => return Err(OrchestratorError::MissingCredential),
                Err(err) => (AttendanceRecord::all_absent(&roster.students), Some(err)),
            };
            rows.push(AttendanceRow {
                course_id: course.id.clone(),
                course_label: course.label(),
                roster_source: roster.source,
                record,
                error,
            });
        }

        info!(
            "event=screen_load module=orchestrator screen=attendance_report status={} campus_id={} courses={} failed={}",
            if failed == 0 { "ok" } else { "degraded" },
            campus_id,
            rows.len(),
            failed
        );
        Ok(AttendanceReport {
            campus_id,
            date: date.to_string(),
            rows,
        })
    }

    async fn fetch_attendance(
        &self,
        credential: &str,
        course_id: &str,
        date: &str,
        roster: &[Student],
    ) -> Result<AttendanceRecord, RemoteError> {
        let payload = self
            .remote
            .get(Some(credential), &Endpoint::course_attendance(course_id, date))
            .await?;
        debug!(
            "event=attendance_resolve module=orchestrator status=ok course_id={} shape={} roster={}",
            course_id,
            classify_attendance(&payload).name(),
            roster.len()
        );
        Ok(resolve_attendance(&payload, roster))
    }
}
