//! Attendance partition for one course on one date.

use super::people::Student;
use serde::{Deserialize, Serialize};

/// Present/absent partition.
///
/// # Invariants
/// - Each list is deduplicated by student id.
/// - No id appears in both lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub present: Vec<Student>,
    pub absent: Vec<Student>,
}

impl AttendanceRecord {
    /// Partition marking the whole roster absent.
    pub fn all_absent(roster: &[Student]) -> Self {
        Self {
            present: Vec::new(),
            absent: roster.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty() && self.absent.is_empty()
    }

    pub fn total(&self) -> usize {
        self.present.len() + self.absent.len()
    }

    pub fn is_present(&self, student_id: &str) -> bool {
        self.present.iter().any(|student| student.id == student_id)
    }
}
