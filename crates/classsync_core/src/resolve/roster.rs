//! Roster fallback resolution.
//!
//! A freshly created course often has no roster until an administrative
//! workflow fills it. Assessment and attendance still operate on such a
//! course using the campus-wide student list; that degraded roster is the
//! documented behavior, not an error.

use crate::model::people::Student;

/// Where a resolved roster came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSource {
    Course,
    Campus,
    /// Every source was empty.
    Empty,
}

impl RosterSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Campus => "campus",
            Self::Empty => "empty",
        }
    }
}

/// Roster precedence, highest priority first.
pub const ROSTER_PRECEDENCE: &[RosterSource] = &[RosterSource::Course, RosterSource::Campus];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoster {
    pub students: Vec<Student>,
    pub source: RosterSource,
}

impl ResolvedRoster {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Whether the roster is the campus-wide fallback rather than the course's own.
    pub fn is_fallback(&self) -> bool {
        self.source != RosterSource::Course
    }
}

/// Returns the first non-empty roster in [`ROSTER_PRECEDENCE`] order.
pub fn resolve_roster(course_roster: &[Student], campus_roster: &[Student]) -> ResolvedRoster {
    ROSTER_PRECEDENCE
        .iter()
        .map(|source| {
            let students: &[Student] = match source {
                RosterSource::Course => course_roster,
                RosterSource::Campus => campus_roster,
                RosterSource::Empty => &[],
            };
            (*source, students)
        })
        .find(|(_, students)| !students.is_empty())
        .map(|(source, students)| ResolvedRoster {
            students: students.to_vec(),
            source,
        })
        .unwrap_or(ResolvedRoster {
            students: Vec::new(),
            source: RosterSource::Empty,
        })
}
