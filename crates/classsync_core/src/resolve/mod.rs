//! "Best available" resolution over ambiguous or incomplete data.
//!
//! # Responsibility
//! - Pick the roster a course operates on when its own roster is empty.
//! - Classify attendance payload shapes and partition them into
//!   present/absent lists.
//!
//! # Invariants
//! - Resolvers are pure; they never read or write the cache.

pub mod attendance;
pub mod roster;

pub use attendance::{classify_attendance, resolve_attendance, AttendanceShape};
pub use roster::{resolve_roster, ResolvedRoster, RosterSource, ROSTER_PRECEDENCE};
