mod support;

use classsync_core::cache::{self, CacheKey};
use classsync_core::model::assessment::{BatchDraft, MarkEntry};
use classsync_core::model::course::Course;
use classsync_core::model::people::{Student, Teacher};
use classsync_core::remote::{Method, RemoteError};
use classsync_core::resolve::RosterSource;
use classsync_core::{DataOrigin, OrchestratorError, RegistrationDraft};
use serde_json::json;
use support::{anonymous_engine, read, seed, signed_in_engine, ScriptedTransport};

fn quiz() -> BatchDraft {
    BatchDraft {
        kind: "quiz".to_string(),
        title: "Quiz 1".to_string(),
        description: String::new(),
        date: "2024-03-01".to_string(),
        total_marks: 10.0,
    }
}

fn ids(students: &[Student]) -> Vec<&str> {
    students.iter().map(|student| student.id.as_str()).collect()
}

fn north(key: fn(String) -> CacheKey) -> CacheKey {
    key("north".to_string())
}

#[tokio::test]
async fn batch_on_empty_course_roster_is_seeded_from_campus_students() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(&store, north(CacheKey::CourseList), json!([{"_id": "c1", "name": "Algebra", "students": []}]));
    seed(&store, north(CacheKey::CampusStudents), json!(["s1", "s2", "s3"]));
    transport.on(Method::Post, "/assessments/batches", 201, json!({"data": {"_id": "b1"}}));
    transport.on(Method::Get, "/assessments/batches/b1", 200, json!({"_id": "b1", "title": "Quiz 1"}));

    let batch = engine.create_batch("c1", &quiz()).await.unwrap();

    assert_eq!(batch.batch_id, "b1");
    assert_eq!(batch.course_id, "c1");
    assert_eq!(batch.entries.len(), 3);
    for (entry, expected) in batch.entries.iter().zip(["s1", "s2", "s3"]) {
        assert_eq!(entry, &MarkEntry::blank(expected));
        assert_eq!(entry.marks, 0.0);
        assert_eq!(entry.remarks, "");
    }

    let posted = transport.requests_to(Method::Post, "/assessments/batches");
    let body = posted[0].body.as_ref().unwrap();
    assert_eq!(body["entries"].as_array().unwrap().len(), 3);
    assert_eq!(body["type"], "quiz");
    assert!(posted[0].url.query().is_none());
}

#[tokio::test]
async fn batch_without_echoed_id_gets_provisional_id() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(&store, north(CacheKey::CourseList), json!([{"_id": "c1", "students": ["s1"]}]));
    transport.on(Method::Post, "/assessments/batches", 204, serde_json::Value::Null);

    let batch = engine.create_batch("c1", &quiz()).await.unwrap();

    assert!(batch.batch_id.starts_with(classsync_core::service::PROVISIONAL_BATCH_PREFIX));
    assert_eq!(batch.entries, vec![MarkEntry::blank("s1")]);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn attendance_report_isolates_failed_course() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(
        &store,
        north(CacheKey::CourseList),
        json!([
            {"_id": "c1", "name": "One"},
            {"_id": "c2", "name": "Two"},
            {"_id": "c3", "name": "Three"}
        ]),
    );
    seed(&store, north(CacheKey::CampusStudents), json!(["s1", "s2", "s3"]));
    transport.on(
        Method::Get,
        "/attendance/course/c1",
        200,
        json!({"present": ["s1"], "absent": ["s2", "s3"]}),
    );
    transport.on(Method::Get, "/attendance/course/c2", 500, json!({"message": "boom"}));
    transport.on(
        Method::Get,
        "/attendance/course/c3",
        200,
        json!([{"id": "s3", "status": "present"}]),
    );

    let report = engine.attendance_report("2024-03-01").await.unwrap();

    assert_eq!(report.rows.len(), 3);
    assert_eq!(report.failed_courses(), 1);

    let c1 = &report.rows[0];
    assert!(c1.error.is_none());
    assert_eq!(ids(&c1.record.present), vec!["s1"]);

    let c2 = &report.rows[1];
    assert_eq!(c2.course_id, "c2");
    assert!(c2.record.present.is_empty());
    assert_eq!(ids(&c2.record.absent), vec!["s1", "s2", "s3"]);
    assert_eq!(c2.roster_source, RosterSource::Campus);
    assert!(matches!(c2.error, Some(RemoteError::Status { code: 500, .. })));

    let c3 = &report.rows[2];
    assert!(c3.error.is_none());
    assert_eq!(ids(&c3.record.present), vec!["s3"]);

    let attendance_calls = transport
        .requests()
        .iter()
        .filter(|request| request.url.path().contains("/attendance/"))
        .count();
    assert_eq!(attendance_calls, 3);
}

#[tokio::test]
async fn attendance_report_on_cold_cache_fetches_courses_first() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    transport.on(Method::Get, "/courses", 200, json!([{"_id": "c1", "name": "Algebra"}]));
    transport.on(Method::Get, "/campuses/north/students", 200, json!(["s1", "s2", "s3"]));
    transport.on(
        Method::Get,
        "/attendance/course/c1",
        200,
        json!({"present": ["s1"], "absent": ["s2", "s3", "x9"]}),
    );

    let report = engine.attendance_report("2024-03-01").await.unwrap();

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert!(row.error.is_none());
    assert_eq!(row.roster_source, RosterSource::Campus);
    assert_eq!(ids(&row.record.present), vec!["s1"]);
    assert_eq!(ids(&row.record.absent), vec!["s2", "s3"]);
    assert!(read(&store, &north(CacheKey::CourseList)).is_some());
}

#[tokio::test]
async fn batch_on_cold_cache_is_seeded_after_fetching_courses() {
    let transport = ScriptedTransport::new();
    let (engine, _store) = signed_in_engine(&transport);
    transport.on(Method::Get, "/courses", 200, json!([{"_id": "c1", "students": []}]));
    transport.on(Method::Get, "/campuses/north/students", 200, json!(["s1", "s2", "s3"]));
    transport.on(Method::Post, "/assessments/batches", 201, json!({"_id": "b1"}));
    transport.on(Method::Get, "/assessments/batches/b1", 200, json!({"_id": "b1"}));

    let batch = engine.create_batch("c1", &quiz()).await.unwrap();

    assert_eq!(batch.entries.len(), 3);
    assert_eq!(batch.entries[0], MarkEntry::blank("s1"));
    assert_eq!(transport.requests_to(Method::Get, "/courses").len(), 1);
}

#[tokio::test]
async fn unknown_course_is_not_found_after_course_fetch() {
    let transport = ScriptedTransport::new();
    let (engine, _store) = signed_in_engine(&transport);
    transport.on(Method::Get, "/courses", 200, json!([{"_id": "c1"}]));

    let err = engine.course_attendance("c9", "2024-03-01").await.unwrap_err();

    assert!(matches!(err, OrchestratorError::NotFound(_)));
    assert_eq!(transport.requests_to(Method::Get, "/courses").len(), 1);
    assert!(transport.requests_to(Method::Get, "/attendance/course/c9").is_empty());
}

#[tokio::test]
async fn single_course_attendance_uses_course_roster() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(
        &store,
        north(CacheKey::CourseList),
        json!([{"_id": "c1", "students": [{"_id": "s1", "name": "Ada"}, "s2"]}]),
    );
    transport.on(Method::Get, "/attendance/course/c1", 200, json!({"presentCount": 1, "absentCount": 1}));

    let record = engine.course_attendance("c1", "2024-03-01").await.unwrap();

    assert_eq!(record.present[0].name, "Ada");
    assert_eq!(record.absent[0].id, "s2");
    let request = &transport.requests()[0];
    assert!(request.url.query().unwrap().contains("date=2024-03-01"));
}

#[tokio::test]
async fn refresh_keeps_cached_teacher_and_resolves_bare_ids() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(
        &store,
        north(CacheKey::CourseList),
        json!([{
            "_id": "c1",
            "name": "Algebra",
            "teacher": {"_id": "t1", "name": "Grace"},
            "students": ["s1"]
        }]),
    );
    seed(&store, CacheKey::TeacherIndex, json!([{"id": "t2", "name": "Linus"}]));
    transport.on(
        Method::Get,
        "/courses",
        200,
        json!({"data": [{"_id": "c1", "name": "Algebra II"}, {"_id": "c2", "teacher": "t2"}]}),
    );
    transport.on(Method::Get, "/campuses/north/students", 200, json!([{"_id": "s5", "name": "Eve"}]));

    let hydrated = engine.load_courses(true).await.unwrap();

    assert_eq!(hydrated.origin, DataOrigin::Remote);
    let courses = &hydrated.data;
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].name, "Algebra II");
    assert_eq!(courses[0].teacher.name, "Grace");
    assert_eq!(courses[0].students, vec![Student::bare("s1")]);
    assert_eq!(courses[1].teacher.name, "Linus");
    // c2 has no roster of its own; the screen sees the campus list.
    assert_eq!(courses[1].students[0].name, "Eve");

    let stored: Vec<Course> = cache::get_or_default(&*store, &north(CacheKey::CourseList));
    assert_eq!(stored[0].teacher.id, "t1");
    assert!(stored[1].students.is_empty());

    let teachers: Vec<Teacher> = cache::get_or_default(&*store, &CacheKey::TeacherIndex);
    assert!(teachers.iter().any(|t| t.id == "t1" && t.name == "Grace"));
    let students: Vec<Student> = cache::get_or_default(&*store, &CacheKey::StudentIndex);
    let student_ids: Vec<&str> = students.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(student_ids, vec!["s1", "s5"]);
}

#[tokio::test]
async fn failed_refresh_falls_back_to_cache() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(&store, north(CacheKey::CourseList), json!([{"_id": "c1", "name": "Algebra"}]));
    transport.unreachable(Method::Get, "/courses", "connection refused");

    let hydrated = engine.load_courses(true).await.unwrap();

    assert!(hydrated.is_stale());
    assert_eq!(hydrated.origin, DataOrigin::Cache);
    assert_eq!(hydrated.data[0].name, "Algebra");
    assert!(matches!(hydrated.refresh_error, Some(RemoteError::Transport(_))));
}

#[tokio::test]
async fn legacy_course_list_is_read_when_campus_list_is_missing() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(&store, CacheKey::LegacyCourseList, json!([{"id": "old1", "courseName": "Legacy"}]));

    let hydrated = engine.load_courses(false).await.unwrap();

    assert_eq!(hydrated.origin, DataOrigin::Cache);
    assert_eq!(hydrated.data[0].id, "old1");
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn refresh_retires_legacy_course_list() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(&store, CacheKey::LegacyCourseList, json!([{"id": "old1", "courseName": "Legacy"}]));
    transport.on(Method::Get, "/courses", 200, json!([{"_id": "c1", "name": "Algebra"}]));

    let hydrated = engine.load_courses(true).await.unwrap();

    assert_eq!(hydrated.origin, DataOrigin::Remote);
    assert!(read(&store, &CacheKey::LegacyCourseList).is_none());
    let stored: Vec<Course> = cache::get_or_default(&*store, &north(CacheKey::CourseList));
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "c1");
}

#[tokio::test]
async fn results_for_superseded_campus_are_discarded() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    transport.on(Method::Get, "/courses", 200, json!([{"_id": "c1"}]));
    transport.on(Method::Get, "/campuses/north/students", 200, json!([]));
    let gate = transport.gate("/courses");

    let (result, _) = tokio::join!(engine.load_courses(true), async {
        engine.select_campus("south").unwrap();
        gate.notify_one();
    });

    assert!(matches!(
        result,
        Err(OrchestratorError::Superseded { launched_for: Some(ref campus) }) if campus == "north"
    ));
    assert!(read(&store, &north(CacheKey::CourseList)).is_none());
    assert_eq!(engine.current_campus().as_deref(), Some("south"));
}

#[tokio::test]
async fn missing_credential_is_terminal_without_network() {
    let transport = ScriptedTransport::new();
    let (engine, _store) = anonymous_engine(&transport);
    engine.select_campus("north").unwrap();

    let err = engine.load_courses(true).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::MissingCredential));

    let err = engine.attendance_report("2024-03-01").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::MissingCredential));
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn dashboard_refresh_selects_first_campus() {
    let transport = ScriptedTransport::new();
    let (engine, store) = anonymous_engine(&transport);
    engine.set_credential("token-1").unwrap();
    transport.on(
        Method::Get,
        "/teacher/dashboard",
        200,
        json!({
            "teacher": {"_id": "t1", "name": "Grace"},
            "campuses": [
                {"_id": "north", "name": "North", "students": ["s1", "s2"]},
                {"_id": "south", "name": "South"}
            ]
        }),
    );

    let hydrated = engine.load_dashboard(false).await.unwrap();

    assert_eq!(hydrated.data.teacher.name, "Grace");
    assert_eq!(hydrated.data.current_campus.as_deref(), Some("north"));
    assert_eq!(engine.cached_campus_roster("north").len(), 2);
    assert!(read(&store, &CacheKey::CampusInfo("south".to_string())).is_some());

    let again = engine.load_dashboard(false).await.unwrap();
    assert_eq!(again.origin, DataOrigin::Cache);
    assert_eq!(again.data.campuses.len(), 2);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn batch_list_fills_course_and_drops_duplicates() {
    let transport = ScriptedTransport::new();
    let (engine, _store) = signed_in_engine(&transport);
    transport.on(
        Method::Get,
        "/assessments/batches",
        200,
        json!({"data": [
            {"_id": "b1", "title": "Quiz 1"},
            {"_id": "b1", "title": "Quiz 1 copy"},
            {"_id": "b2", "title": "Test", "courseId": "c1"}
        ]}),
    );

    let hydrated = engine.load_batches("c1").await.unwrap();

    assert_eq!(hydrated.origin, DataOrigin::Remote);
    let batches = &hydrated.data;
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].title, "Quiz 1");
    assert!(batches.iter().all(|batch| batch.course_id == "c1"));
    let request = &transport.requests()[0];
    assert!(request.url.query().unwrap().contains("courseId=c1"));
}

#[tokio::test]
async fn mark_upsert_overlays_submitted_entries_on_reread() {
    let transport = ScriptedTransport::new();
    let (engine, _store) = signed_in_engine(&transport);
    transport.on(Method::Put, "/assessments/batches/b1/marks", 200, json!({"ok": true}));
    transport.on(
        Method::Get,
        "/assessments/batches/b1",
        200,
        json!({"_id": "b1", "entries": [
            {"studentId": "s1", "marks": 3},
            {"studentId": "s2", "marks": 4}
        ]}),
    );

    let updates = vec![
        MarkEntry {
            student_id: "s2".to_string(),
            marks: 9.0,
            remarks: "retake".to_string(),
        },
        MarkEntry::blank("s3"),
    ];
    let batch = engine.upsert_marks("b1", updates).await.unwrap();

    assert_eq!(batch.entries.len(), 3);
    assert_eq!(batch.entry_for("s1").unwrap().marks, 3.0);
    assert_eq!(batch.entry_for("s2").unwrap().marks, 9.0);
    assert_eq!(batch.entries[1].student_id, "s2");
}

#[tokio::test]
async fn removing_student_rereads_batch() {
    let transport = ScriptedTransport::new();
    let (engine, _store) = signed_in_engine(&transport);
    transport.on(Method::Delete, "/assessments/batches/b1/students/s2", 204, serde_json::Value::Null);
    transport.on(
        Method::Get,
        "/assessments/batches/b1",
        200,
        json!({"_id": "b1", "entries": [{"studentId": "s1"}, {"studentId": "s2"}]}),
    );

    let batch = engine.remove_student_from_batch("b1", "s2").await.unwrap();

    assert!(batch.entry_for("s2").is_none());
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn registration_refreshes_campus_students() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    transport.on(Method::Post, "/registrations", 201, json!({"_id": "r1"}));
    transport.on(
        Method::Get,
        "/campuses/north/students",
        200,
        json!([{"_id": "s1"}, {"_id": "s9", "name": "New"}]),
    );

    let draft = RegistrationDraft {
        name: "New".to_string(),
        email: "new@example.com".to_string(),
        phone: String::new(),
        course_ids: vec!["c1".to_string()],
    };
    let students = engine.create_registration(&draft).await.unwrap();

    assert_eq!(students.len(), 2);
    let cached: Vec<Student> = cache::get_or_default(&*store, &north(CacheKey::CampusStudents));
    assert_eq!(cached, students);
    let posted = transport.requests_to(Method::Post, "/registrations");
    assert_eq!(posted[0].body.as_ref().unwrap()["campusId"], "north");
}

#[tokio::test]
async fn lesson_plans_fill_course_and_dedup() {
    let transport = ScriptedTransport::new();
    let (engine, _store) = signed_in_engine(&transport);
    transport.on(
        Method::Get,
        "/lesson-plans",
        200,
        json!([
            {"_id": "p1", "topic": "Fractions"},
            {"_id": "p1", "topic": "Fractions again"},
            {"_id": "p2", "title": "Decimals", "courseId": "c1"}
        ]),
    );

    let plans = engine.load_lesson_plans("c1").await.unwrap().data;

    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].title, "Fractions");
    assert!(plans.iter().all(|plan| plan.course_id == "c1"));
}

#[tokio::test]
async fn reset_keeps_credential_and_clears_selection() {
    let transport = ScriptedTransport::new();
    let (engine, store) = signed_in_engine(&transport);
    seed(&store, north(CacheKey::CourseList), json!([]));

    let removed = engine.reset_cache().unwrap();

    assert_eq!(removed, 2);
    assert!(engine.current_campus().is_none());
    assert_eq!(cache::read_credential(&*store).as_deref(), Some("token-1"));
}
