//! Per-screen reconciliation services.
//!
//! # Responsibility
//! - Hydrate each screen from the cache, refresh from the backend and fold
//!   fresh data back into the cache.
//! - Isolate per-course failures so one broken course never blanks a report.
//!
//! # Invariants
//! - [`Orchestrator`] is the only component that writes cache entries.
//! - Normalizers, resolvers and merge rules stay pure; services only wire
//!   them to storage and transport.

mod assessments;
mod attendance;
mod courses;
mod dashboard;
mod lesson_plans;
mod orchestrator;
mod selection;

pub use assessments::PROVISIONAL_BATCH_PREFIX;
pub use attendance::{AttendanceReport, AttendanceRow};
pub use courses::RegistrationDraft;
pub use dashboard::Dashboard;
pub use orchestrator::{DataOrigin, Hydrated, Orchestrator, OrchestratorError, OrchestratorResult};
pub use selection::{SelectionTicket, SelectionTracker};
