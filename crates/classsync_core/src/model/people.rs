//! Student and teacher records.

use super::PLACEHOLDER_GLYPH;
use serde::{Deserialize, Serialize};

/// Canonical student record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    /// Falls back to [`PLACEHOLDER_GLYPH`] when the source has no name.
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Student {
    /// Student known only by id.
    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: PLACEHOLDER_GLYPH.to_string(),
            email: String::new(),
            phone: String::new(),
        }
    }

    /// Whether this record carries more than an id.
    pub fn is_bare(&self) -> bool {
        self.name == PLACEHOLDER_GLYPH && self.email.is_empty() && self.phone.is_empty()
    }
}

/// Canonical teacher reference.
///
/// An embedded reference may only carry the id; the name is then the
/// placeholder until a teacher index lookup resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Teacher {
    pub id: String,
    pub name: String,
}

impl Teacher {
    /// Sentinel for a course with no assigned teacher.
    pub fn unassigned() -> Self {
        Self {
            id: String::new(),
            name: PLACEHOLDER_GLYPH.to_string(),
        }
    }

    pub fn bare(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: PLACEHOLDER_GLYPH.to_string(),
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.id.is_empty()
    }

    /// Assigned but still missing a display name.
    pub fn needs_name(&self) -> bool {
        !self.is_unassigned() && self.name == PLACEHOLDER_GLYPH
    }
}

impl Default for Teacher {
    fn default() -> Self {
        Self::unassigned()
    }
}
