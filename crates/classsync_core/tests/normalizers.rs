use classsync_core::aggregate::{aggregate_from_cache, merge_sources};
use classsync_core::cache::{CacheKey, CacheStore, MemoryCacheStore};
use classsync_core::identity::canonical_id;
use classsync_core::model::people::{Student, Teacher};
use classsync_core::normalize::{
    normalize_course, normalize_student, normalize_students, normalize_teacher,
};
use classsync_core::resolve::{resolve_roster, RosterSource};
use serde_json::{json, Value};

#[test]
fn canonical_id_is_idempotent_across_shapes() {
    let shapes = [
        json!({"_id": "s1", "id": "other"}),
        json!({"id": "s1"}),
        json!("s1"),
        json!({"_id": {"$oid": "s1"}}),
    ];
    for shape in shapes {
        let id = canonical_id(&shape);
        assert_eq!(id, "s1");
        assert_eq!(canonical_id(&Value::String(id.clone())), id);
    }
}

#[test]
fn id_less_records_get_stable_digests() {
    let record = json!({"name": "No Id", "email": "x@example.com"});
    let first = canonical_id(&record);
    assert_eq!(first, canonical_id(&record.clone()));
    assert_ne!(first, canonical_id(&json!({"name": "Someone Else"})));
}

#[test]
fn teacher_string_and_record_normalize_to_same_shape() {
    let from_string = normalize_teacher(&json!("t1"));
    assert_eq!(
        from_string,
        Teacher {
            id: "t1".to_string(),
            name: "—".to_string()
        }
    );
    let again = normalize_teacher(&serde_json::to_value(&from_string).unwrap());
    assert_eq!(again, from_string);
    assert!(normalize_teacher(&Value::Null).is_unassigned());
}

#[test]
fn student_renormalization_is_idempotent() {
    let raw = json!({"user": {"_id": "s7", "firstName": "Ada", "lastName": "Lovelace", "mail": "ada@x"}});
    let student = normalize_student(&raw);
    assert_eq!(student.name, "Ada Lovelace");
    let again = normalize_student(&serde_json::to_value(&student).unwrap());
    assert_eq!(again, student);
}

#[test]
fn course_renormalization_is_idempotent() {
    let course = normalize_course(&json!({
        "_id": "c1",
        "title": "Algebra",
        "courseCode": "MATH1",
        "instructor": "t1",
        "roster": {"data": ["s1", {"_id": "s2", "name": "Bo"}]}
    }));
    assert_eq!(course.teacher, Teacher::bare("t1"));
    assert_eq!(course.students.len(), 2);
    let again = normalize_course(&serde_json::to_value(&course).unwrap());
    assert_eq!(again, course);
}

#[test]
fn aggregator_dedups_in_first_seen_order_across_keys() {
    let store = MemoryCacheStore::new();
    store
        .set(
            &CacheKey::CampusStudents("north".to_string()),
            &json!({"data": [{"_id": "s1", "name": "First"}, {"_id": "s2"}]}),
        )
        .unwrap();
    store
        .set(
            &CacheKey::CampusRoster("north".to_string()),
            &json!([{"_id": "s2", "name": "Later"}, "s3", {"_id": "s1"}]),
        )
        .unwrap();

    let merged = aggregate_from_cache(
        &store,
        &[
            CacheKey::CampusStudents("north".to_string()),
            CacheKey::CampusRoster("north".to_string()),
            CacheKey::CampusRoster("missing".to_string()),
        ],
    );
    let students = normalize_students(&merged);
    let ids: Vec<&str> = students.iter().map(|student| student.id.as_str()).collect();
    assert_eq!(ids, vec!["s1", "s2", "s3"]);
    assert_eq!(students[0].name, "First");
    assert_eq!(students[1].name, "—");
}

#[test]
fn merge_sources_keeps_first_occurrence() {
    let first = vec![json!({"id": "a", "v": 1})];
    let second = vec![json!({"_id": "a", "v": 2}), json!({"id": "b"})];
    let merged = merge_sources([first.as_slice(), second.as_slice()]);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0]["v"], 1);
}

#[test]
fn roster_fallback_sizes() {
    let campus: Vec<Student> = ["s1", "s2", "s3"].into_iter().map(Student::bare).collect();
    let own: Vec<Student> = vec![Student::bare("s9")];

    let fallback = resolve_roster(&[], &campus);
    assert_eq!(fallback.len(), 3);
    assert_eq!(fallback.source, RosterSource::Campus);

    let preferred = resolve_roster(&own, &campus);
    assert_eq!(preferred.len(), 1);
    assert_eq!(preferred.source, RosterSource::Course);

    assert_eq!(resolve_roster(&[], &[]).source, RosterSource::Empty);
}
