//! Canonical entity model shared by every screen.
//!
//! # Responsibility
//! - Define the fixed shapes raw payloads are normalized into.
//! - Keep one identity (`id`) per entity regardless of payload origin.
//!
//! # Invariants
//! - Entities are plain values; producing them never touches the cache.
//! - Serializing an entity and normalizing it again yields the same entity.

pub mod assessment;
pub mod attendance;
pub mod course;
pub mod lesson_plan;
pub mod people;

/// Display placeholder for missing human-readable fields.
pub const PLACEHOLDER_GLYPH: &str = "—";
