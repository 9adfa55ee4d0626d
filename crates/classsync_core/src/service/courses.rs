//! Course list screen, campus rosters and registrations.

use super::orchestrator::{Hydrated, Orchestrator, OrchestratorError, OrchestratorResult};
use crate::aggregate::{aggregate_from_cache, dedup_by_id, list_or_empty};
use crate::cache::{self, CacheKey};
use crate::model::course::Course;
use crate::model::people::{Student, Teacher};
use crate::normalize::{normalize_course, normalize_students};
use crate::reconcile::{merge_courses, merge_student_index, merge_teacher_index, resolve_teacher_names};
use crate::remote::{Endpoint, Method, RemoteError};
use crate::resolve::{resolve_roster, ResolvedRoster};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// New student registration submitted from the roster screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDraft {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub course_ids: Vec<String>,
}

impl Orchestrator {
    /// Campus-wide student list from cache: fetched students first, then
    /// the roster embedded in the dashboard's campus record.
    pub fn cached_campus_roster(&self, campus_id: &str) -> Vec<Student> {
        let raw = aggregate_from_cache(
            self.cache(),
            &[
                CacheKey::CampusStudents(campus_id.to_string()),
                CacheKey::CampusRoster(campus_id.to_string()),
            ],
        );
        normalize_students(&raw)
    }

    /// Courses as stored for `campus_id`, without roster fallback.
    ///
    /// The legacy unscoped list is only consulted when the campus has no
    /// list of its own.
    pub(super) fn stored_courses(&self, campus_id: &str) -> Vec<Course> {
        let mut raw = aggregate_from_cache(self.cache(), &[CacheKey::CourseList(campus_id.to_string())]);
        if raw.is_empty() {
            raw = aggregate_from_cache(self.cache(), &[CacheKey::LegacyCourseList]);
        }
        let mut courses = dedup_by_id(raw.iter().map(normalize_course), |course| course.id.as_str());
        courses.retain(|course| !course.id.is_empty());

        let teachers: Vec<Teacher> = cache::get_or_default(self.cache(), &CacheKey::TeacherIndex);
        resolve_teacher_names(&mut courses, &teachers);
        courses
    }

    /// Course list for the current campus from cache, rosters resolved.
    pub fn cached_courses(&self) -> OrchestratorResult<Vec<Course>> {
        let campus_id = self.require_campus(&self.selection.ticket())?;
        Ok(self.course_view(&campus_id, self.stored_courses(&campus_id)))
    }

    /// Stored courses of `campus_id`, fetching them first when the cache
    /// has none (or lacks `wanted`).
    ///
    /// A degraded fetch still returns whatever the cache holds.
    pub(super) async fn hydrated_courses(
        &self,
        campus_id: &str,
        wanted: Option<&str>,
    ) -> OrchestratorResult<Vec<Course>> {
        let stored = self.stored_courses(campus_id);
        let satisfied = match wanted {
            Some(course_id) => stored.iter().any(|course| course.id == course_id),
            None => !stored.is_empty(),
        };
        if satisfied {
            return Ok(stored);
        }

        let hydrated = self.load_courses(true).await?;
        if let Some(err) = &hydrated.refresh_error {
            warn!(
                "event=course_hydrate module=orchestrator status=degraded campus_id={} error_code={}",
                campus_id,
                err.code()
            );
        }
        Ok(self.stored_courses(campus_id))
    }

    /// Best available roster for one course of the current campus.
    ///
    /// Fetches the course list when the course is not cached yet.
    pub async fn course_roster(&self, course_id: &str) -> OrchestratorResult<ResolvedRoster> {
        let campus_id = self.require_campus(&self.selection.ticket())?;
        let course = self
            .hydrated_courses(&campus_id, Some(course_id))
            .await?
            .into_iter()
            .find(|course| course.id == course_id)
            .ok_or_else(|| OrchestratorError::NotFound(format!("course `{course_id}`")))?;
        Ok(resolve_roster(&course.students, &self.cached_campus_roster(&campus_id)))
    }

    /// Hydrates the course list of the current campus.
    ///
    /// Courses and campus students are fetched together. A failed student
    /// fetch keeps the cached campus roster; a failed course fetch degrades
    /// the whole screen to the cached list.
    pub async fn load_courses(&self, refresh: bool) -> OrchestratorResult<Hydrated<Vec<Course>>> {
        let ticket = self.selection.ticket();
        let campus_id = self.require_campus(&ticket)?;
        let stored = self.stored_courses(&campus_id);
        if !refresh && !stored.is_empty() {
            info!(
                "event=screen_load module=orchestrator screen=courses status=ok origin=cache campus_id={} courses={}",
                campus_id,
                stored.len()
            );
            return Ok(Hydrated::cached(self.course_view(&campus_id, stored)));
        }

        let credential = self.credential()?;
        let courses_endpoint = Endpoint::courses(&campus_id);
        let students_endpoint = Endpoint::campus_students(&campus_id);
        let (courses_result, students_result) = futures::join!(
            self.remote.get(Some(&credential), &courses_endpoint),
            self.remote.get(Some(&credential), &students_endpoint),
        );
        self.ensure_current(&ticket, "courses")?;

        let payload = match courses_result {
            Ok(payload) => payload,
            Err(RemoteError::MissingCredential) => return Err(OrchestratorError::MissingCredential),
            Err(err) => {
                info!(
                    "event=screen_load module=orchestrator screen=courses status=degraded origin=cache campus_id={} error_code={}",
                    campus_id,
                    err.code()
                );
                return Ok(Hydrated::stale(self.course_view(&campus_id, stored), err));
            }
        };

        let campus_students = match students_result {
            Ok(students) => {
                let students = normalize_students(&list_or_empty(&students));
                self.write_back(&CacheKey::CampusStudents(campus_id.clone()), &students);
                students
            }
            Err(err) => {
                warn!(
                    "event=campus_students module=orchestrator status=degraded campus_id={} error_code={}",
                    campus_id,
                    err.code()
                );
                self.cached_campus_roster(&campus_id)
            }
        };

        let fetched: Vec<Course> = list_or_empty(&payload)
            .iter()
            .map(normalize_course)
            .filter(|course| !course.id.is_empty())
            .collect();
        let mut merged = merge_courses(fetched, &stored);

        let previous_teachers: Vec<Teacher> = cache::get_or_default(self.cache(), &CacheKey::TeacherIndex);
        let teachers = merge_teacher_index(merged.iter().map(|course| &course.teacher), &previous_teachers);
        resolve_teacher_names(&mut merged, &teachers);

        let previous_students: Vec<Student> = cache::get_or_default(self.cache(), &CacheKey::StudentIndex);
        let students = merge_student_index(
            merged
                .iter()
                .flat_map(|course| course.students.iter())
                .chain(campus_students.iter()),
            &previous_students,
        );

        if self.write_back(&CacheKey::CourseList(campus_id.clone()), &merged) {
            self.retire_legacy_course_list();
        }
        self.write_back(&CacheKey::TeacherIndex, &teachers);
        self.write_back(&CacheKey::StudentIndex, &students);

        info!(
            "event=screen_load module=orchestrator screen=courses status=ok origin=remote campus_id={} courses={} campus_students={}",
            campus_id,
            merged.len(),
            campus_students.len()
        );
        Ok(Hydrated::remote(self.course_view(&campus_id, merged)))
    }

    /// Submits a registration, then re-reads the campus student list.
    pub async fn create_registration(
        &self,
        draft: &RegistrationDraft,
    ) -> OrchestratorResult<Vec<Student>> {
        let ticket = self.selection.ticket();
        let campus_id = self.require_campus(&ticket)?;
        let credential = self.credential()?;

        let body = json!({
            "name": draft.name,
            "email": draft.email,
            "phone": draft.phone,
            "courseIds": draft.course_ids,
            "campusId": campus_id,
        });
        self.remote
            .fetch(Some(&credential), Method::Post, &Endpoint::registrations(), Some(body))
            .await?;
        info!(
            "event=registration_create module=orchestrator status=ok campus_id={} courses={}",
            campus_id,
            draft.course_ids.len()
        );

        let refreshed = self
            .remote
            .get(Some(&credential), &Endpoint::campus_students(&campus_id))
            .await?;
        self.ensure_current(&ticket, "registration")?;
        let students = normalize_students(&list_or_empty(&refreshed));
        self.write_back(&CacheKey::CampusStudents(campus_id), &students);
        Ok(students)
    }

    /// Drops the unscoped course list once a campus-scoped list is stored.
    fn retire_legacy_course_list(&self) {
        match self.cache().remove(&CacheKey::LegacyCourseList) {
            Ok(true) => info!(
                "event=legacy_course_list module=orchestrator status=ok action=retired"
            ),
            Ok(false) => {}
            Err(err) => warn!(
                "event=legacy_course_list module=orchestrator status=error error={}",
                err
            ),
        }
    }

    /// Applies the roster fallback to every course for display.
    fn course_view(&self, campus_id: &str, courses: Vec<Course>) -> Vec<Course> {
        let campus_roster = self.cached_campus_roster(campus_id);
        courses
            .into_iter()
            .map(|mut course| {
                let resolved = resolve_roster(&course.students, &campus_roster);
                course.students = resolved.students;
                course
            })
            .collect()
    }
}
