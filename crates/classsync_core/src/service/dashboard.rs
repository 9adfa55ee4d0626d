//! Dashboard screen: teacher profile and campus list.

use super::orchestrator::{Hydrated, Orchestrator, OrchestratorResult};
use crate::aggregate::{dedup_by_id, unwrap_list};
use crate::cache::CacheKey;
use crate::model::course::Campus;
use crate::model::people::{Student, Teacher};
use crate::normalize::{normalize_campus, normalize_students, normalize_teacher};
use crate::remote::{Endpoint, RemoteError};
use log::info;
use serde_json::{Map, Value};

const PROFILE_FIELDS: &[&str] = &["teacher", "profile", "user"];
const CAMPUS_LIST_FIELDS: &[&str] = &["campuses", "campusList", "campus"];
const CAMPUS_ROSTER_FIELDS: &[&str] = &["students", "roster"];

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub teacher: Teacher,
    pub campuses: Vec<Campus>,
    pub current_campus: Option<String>,
}

impl Dashboard {
    pub fn is_empty(&self) -> bool {
        self.teacher.is_unassigned() && self.campuses.is_empty()
    }
}

/// Normalized dashboard payload plus rosters embedded in campus records.
struct DashboardPayload {
    teacher: Teacher,
    campuses: Vec<Campus>,
    rosters: Vec<(String, Vec<Student>)>,
}

impl Orchestrator {
    /// Reads the dashboard from cache only.
    pub fn cached_dashboard(&self) -> Dashboard {
        let teacher = self
            .cache
            .get(&CacheKey::TeacherProfile)
            .map(|raw| normalize_teacher(&raw))
            .unwrap_or_default();
        let campuses = self
            .cache
            .get(&CacheKey::CampusList)
            .as_ref()
            .and_then(unwrap_list)
            .map(|list| dedup_by_id(list.iter().map(normalize_campus), |campus| campus.id.as_str()))
            .unwrap_or_default();
        Dashboard {
            teacher,
            campuses,
            current_campus: self.current_campus(),
        }
    }

    /// Hydrates the dashboard, refreshing when the cache is empty or
    /// `refresh` is set.
    ///
    /// The first listed campus becomes current when none is selected or the
    /// selected one disappeared.
    pub async fn load_dashboard(&self, refresh: bool) -> OrchestratorResult<Hydrated<Dashboard>> {
        let cached = self.cached_dashboard();
        if !refresh && !cached.is_empty() {
            info!(
                "event=screen_load module=orchestrator screen=dashboard status=ok origin=cache campuses={}",
                cached.campuses.len()
            );
            return Ok(Hydrated::cached(cached));
        }

        let credential = self.credential()?;
        let payload = match self.remote.get(Some(&credential), &Endpoint::dashboard()).await {
            Ok(payload) => payload,
            Err(RemoteError::MissingCredential) => return Err(RemoteError::MissingCredential.into()),
            Err(err) => {
                info!(
                    "event=screen_load module=orchestrator screen=dashboard status=degraded origin=cache error_code={}",
                    err.code()
                );
                return Ok(Hydrated::stale(cached, err));
            }
        };

        let fresh = parse_dashboard(&payload);
        let teacher = if fresh.teacher.is_unassigned() {
            cached.teacher
        } else {
            fresh.teacher
        };

        self.write_back(&CacheKey::TeacherProfile, &teacher);
        self.write_back(&CacheKey::CampusList, &fresh.campuses);
        for campus in &fresh.campuses {
            self.write_back(&CacheKey::CampusInfo(campus.id.clone()), campus);
        }
        for (campus_id, roster) in &fresh.rosters {
            self.write_back(&CacheKey::CampusRoster(campus_id.clone()), roster);
        }

        let selected = self.current_campus();
        let still_listed = selected
            .as_deref()
            .is_some_and(|id| fresh.campuses.iter().any(|campus| campus.id == id));
        if !still_listed {
            if let Some(first) = fresh.campuses.first() {
                self.select_campus(&first.id)?;
            }
        }

        info!(
            "event=screen_load module=orchestrator screen=dashboard status=ok origin=remote campuses={}",
            fresh.campuses.len()
        );
        Ok(Hydrated::remote(Dashboard {
            teacher,
            campuses: fresh.campuses,
            current_campus: self.current_campus(),
        }))
    }
}

fn parse_dashboard(payload: &Value) -> DashboardPayload {
    let empty = Map::new();
    let map = match payload.get("data") {
        Some(Value::Object(inner)) => inner,
        _ => payload.as_object().unwrap_or(&empty),
    };

    let teacher = PROFILE_FIELDS
        .iter()
        .filter_map(|field| map.get(*field))
        .map(normalize_teacher)
        .find(|teacher| !teacher.is_unassigned())
        .unwrap_or_default();

    let raw_campuses: Vec<&Value> = CAMPUS_LIST_FIELDS
        .iter()
        .find_map(|field| map.get(*field).and_then(unwrap_list))
        .map(|list| list.iter().collect())
        .or_else(|| map.get("campus").filter(|value| value.is_object()).map(|value| vec![value]))
        .unwrap_or_default();

    let mut campuses = Vec::new();
    let mut rosters = Vec::new();
    for raw in raw_campuses {
        let campus = normalize_campus(raw);
        if campus.id.is_empty() || campuses.iter().any(|known: &Campus| known.id == campus.id) {
            continue;
        }
        let roster = raw
            .as_object()
            .and_then(|object| {
                CAMPUS_ROSTER_FIELDS
                    .iter()
                    .find_map(|field| object.get(*field).and_then(unwrap_list))
            })
            .map(normalize_students)
            .unwrap_or_default();
        if !roster.is_empty() {
            rosters.push((campus.id.clone(), roster));
        }
        campuses.push(campus);
    }

    DashboardPayload {
        teacher,
        campuses,
        rosters,
    }
}
