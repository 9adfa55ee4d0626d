//! Merge rules for folding fetched data into cached data.
//!
//! # Responsibility
//! - Keep associations that only the cache still knows (a resolved teacher,
//!   a populated roster) when a fresh payload omits them.
//! - Maintain the flattened student and teacher indexes.
//!
//! # Invariants
//! - The fetched list decides membership and order; the cache only fills
//!   fields the fetch left empty.
//! - Pure functions: no cache or network access.

use crate::aggregate::dedup_by_id;
use crate::model::course::Course;
use crate::model::people::{Student, Teacher};
use crate::model::PLACEHOLDER_GLYPH;
use std::collections::HashMap;

/// Merges one fetched course with its cached counterpart.
pub fn merge_course(fetched: Course, cached: &Course) -> Course {
    let teacher = if fetched.teacher.is_unassigned() {
        cached.teacher.clone()
    } else if fetched.teacher.needs_name() && cached.teacher.id == fetched.teacher.id {
        cached.teacher.clone()
    } else {
        fetched.teacher
    };

    Course {
        id: fetched.id,
        name: display_or(fetched.name, &cached.name),
        code: text_or(fetched.code, &cached.code),
        description: text_or(fetched.description, &cached.description),
        teacher,
        students: if fetched.students.is_empty() {
            cached.students.clone()
        } else {
            fetched.students
        },
    }
}

/// Merges a fetched course list over the cached one, matching by id.
///
/// Courses missing from the fetch are dropped.
pub fn merge_courses(fetched: Vec<Course>, cached: &[Course]) -> Vec<Course> {
    let cached_by_id: HashMap<&str, &Course> = cached
        .iter()
        .map(|course| (course.id.as_str(), course))
        .collect();

    dedup_by_id(fetched, |course| course.id.as_str())
        .into_iter()
        .map(|course| match cached_by_id.get(course.id.as_str()) {
            Some(previous) => merge_course(course, previous),
            None => course,
        })
        .collect()
}

/// Fills placeholder teacher names from the flattened teacher index.
pub fn resolve_teacher_names(courses: &mut [Course], index: &[Teacher]) {
    let names: HashMap<&str, &str> = index
        .iter()
        .filter(|teacher| !teacher.needs_name() && !teacher.is_unassigned())
        .map(|teacher| (teacher.id.as_str(), teacher.name.as_str()))
        .collect();

    for course in courses.iter_mut() {
        if course.teacher.needs_name() {
            if let Some(name) = names.get(course.teacher.id.as_str()) {
                course.teacher.name = (*name).to_string();
            }
        }
    }
}

/// Rebuilds the student index: fresh records first, then previously indexed
/// students that no fresh source mentions.
pub fn merge_student_index<'a>(
    fresh: impl IntoIterator<Item = &'a Student>,
    previous: &[Student],
) -> Vec<Student> {
    let fresh: Vec<Student> = fresh
        .into_iter()
        .filter(|student| !student.id.is_empty())
        .cloned()
        .collect();
    let known: HashMap<&str, &Student> = previous
        .iter()
        .map(|student| (student.id.as_str(), student))
        .collect();

    // A bare fresh reference must not erase a name the index already has.
    let upgraded = fresh.into_iter().map(|student| match known.get(student.id.as_str()) {
        Some(previous) if student.is_bare() => (*previous).clone(),
        _ => student,
    });
    dedup_by_id(
        upgraded.chain(previous.iter().cloned()),
        |student| student.id.as_str(),
    )
}

/// Rebuilds the teacher index from course assignments; named entries win
/// over placeholders.
pub fn merge_teacher_index<'a>(
    fresh: impl IntoIterator<Item = &'a Teacher>,
    previous: &[Teacher],
) -> Vec<Teacher> {
    let candidates: Vec<Teacher> = fresh
        .into_iter()
        .cloned()
        .chain(previous.iter().cloned())
        .filter(|teacher| !teacher.is_unassigned())
        .collect();

    let mut merged: Vec<Teacher> = Vec::new();
    for teacher in candidates {
        match merged.iter_mut().find(|known| known.id == teacher.id) {
            Some(known) if known.needs_name() && !teacher.needs_name() => *known = teacher,
            Some(_) => {}
            None => merged.push(teacher),
        }
    }
    merged
}

fn display_or(value: String, fallback: &str) -> String {
    if value == PLACEHOLDER_GLYPH && !fallback.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn text_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
