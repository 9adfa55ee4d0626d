//! Course and campus records.

use super::people::{Student, Teacher};
use serde::{Deserialize, Serialize};

/// Canonical course with its assigned teacher and embedded roster.
///
/// `students` is the roster as published by the backend. Screens read the
/// roster through the fallback resolver, never this field directly, so an
/// empty roster does not blank assessment or attendance work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub teacher: Teacher,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl Course {
    /// Display label, e.g. `CS101 · Algorithms`.
    pub fn label(&self) -> String {
        if self.code.is_empty() {
            self.name.clone()
        } else {
            format!("{} · {}", self.code, self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Campus {
    pub id: String,
    pub name: String,
}
