//! Namespaced cache key layout.
//!
//! Every persisted entry lives under a versioned prefix (`v1:`) followed by a
//! resource name and, for tenant-scoped resources, the owning id:
//! `v1:campus.roster:<campusId>`. Scoping by owner keeps one campus's roster
//! from being read as another's.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Version prefix shared by every key written by this crate.
pub const CACHE_KEY_VERSION: &str = "v1";

static CACHE_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v1:([a-z]+\.[a-z]+)(?::(.+))?$").expect("valid cache key regex")
});

/// Logical cache resource, optionally scoped by an owning id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// Already-issued bearer credential. Survives cache resets.
    AuthToken,
    /// Signed-in teacher profile.
    TeacherProfile,
    /// Campuses visible to the signed-in teacher.
    CampusList,
    /// Id of the campus currently selected by the user.
    CurrentCampus,
    CampusInfo(String),
    /// Roster as published by the campus administration workflow.
    CampusRoster(String),
    /// Student list returned by the campus students endpoint.
    CampusStudents(String),
    CourseList(String),
    /// Unscoped course list written by older clients.
    LegacyCourseList,
    /// Flattened index of every student seen in any course or campus.
    StudentIndex,
    /// Flattened index of every teacher seen in any course.
    TeacherIndex,
}

impl CacheKey {
    /// Namespace used to group entries for inspection and bulk removal.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::AuthToken => "auth",
            Self::TeacherProfile => "teacher",
            Self::CampusList
            | Self::CurrentCampus
            | Self::CampusInfo(_)
            | Self::CampusRoster(_)
            | Self::CampusStudents(_) => "campus",
            Self::CourseList(_) | Self::LegacyCourseList => "course",
            Self::StudentIndex | Self::TeacherIndex => "index",
        }
    }

    fn resource(&self) -> &'static str {
        match self {
            Self::AuthToken => "auth.token",
            Self::TeacherProfile => "teacher.profile",
            Self::CampusList => "campus.list",
            Self::CurrentCampus => "campus.current",
            Self::CampusInfo(_) => "campus.info",
            Self::CampusRoster(_) => "campus.roster",
            Self::CampusStudents(_) => "campus.students",
            Self::CourseList(_) | Self::LegacyCourseList => "course.list",
            Self::StudentIndex => "index.students",
            Self::TeacherIndex => "index.teachers",
        }
    }

    fn owner(&self) -> Option<&str> {
        match self {
            Self::CampusInfo(owner)
            | Self::CampusRoster(owner)
            | Self::CampusStudents(owner)
            | Self::CourseList(owner) => Some(owner.as_str()),
            _ => None,
        }
    }

    /// Renders the persisted key string.
    pub fn render(&self) -> String {
        match self.owner() {
            Some(owner) => format!("{CACHE_KEY_VERSION}:{}:{owner}", self.resource()),
            None => format!("{CACHE_KEY_VERSION}:{}", self.resource()),
        }
    }

    /// Parses a persisted key string back into its logical resource.
    ///
    /// Returns `None` for keys written under another version prefix or for
    /// unknown resources.
    pub fn parse(raw: &str) -> Option<Self> {
        let caps = CACHE_KEY_RE.captures(raw.trim())?;
        let resource = caps.get(1)?.as_str();
        let owner = caps.get(2).map(|m| m.as_str().to_string());

        match (resource, owner) {
            ("auth.token", None) => Some(Self::AuthToken),
            ("teacher.profile", None) => Some(Self::TeacherProfile),
            ("campus.list", None) => Some(Self::CampusList),
            ("campus.current", None) => Some(Self::CurrentCampus),
            ("campus.info", Some(owner)) => Some(Self::CampusInfo(owner)),
            ("campus.roster", Some(owner)) => Some(Self::CampusRoster(owner)),
            ("campus.students", Some(owner)) => Some(Self::CampusStudents(owner)),
            ("course.list", Some(owner)) => Some(Self::CourseList(owner)),
            ("course.list", None) => Some(Self::LegacyCourseList),
            ("index.students", None) => Some(Self::StudentIndex),
            ("index.teachers", None) => Some(Self::TeacherIndex),
            _ => None,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
