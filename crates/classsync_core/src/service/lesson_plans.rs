use super::orchestrator::{Hydrated, Orchestrator, OrchestratorError, OrchestratorResult};
use crate::aggregate::{dedup_by_id, list_or_empty};
use crate::model::lesson_plan::LessonPlan;
use crate::normalize::normalize_lesson_plan;
use crate::remote::{Endpoint, RemoteError};
use log::info;

impl Orchestrator {
    /// Lesson plans of one course, deduplicated in payload order.
    pub async fn load_lesson_plans(&self, course_id: &str) -> OrchestratorResult<Hydrated<Vec<LessonPlan>>> {
        let credential = self.credential()?;
        let payload = match self
            .remote
            .get(Some(&credential), &Endpoint::lesson_plans(course_id))
            .await
        {
            Ok(payload) => payload,
            Err(RemoteError::MissingCredential) => return Err(OrchestratorError::MissingCredential),
            Err(err) => {
                info!(
                    "event=screen_load module=orchestrator screen=lesson_plans status=degraded course_id={} error_code={}",
                    course_id,
                    err.code()
                );
                return Ok(Hydrated::stale(Vec::new(), err));
            }
        };

        let plans = dedup_by_id(
            list_or_empty(&payload)
                .iter()
                .map(|raw| normalize_lesson_plan(raw, course_id)),
            |plan| plan.id.as_str(),
        );
        info!(
            "event=screen_load module=orchestrator screen=lesson_plans status=ok course_id={} plans={}",
            course_id,
            plans.len()
        );
        Ok(Hydrated::remote(plans))
    }
}
