//! Backend resource paths.
//!
//! Ids are kept as separate segments so they are percent-encoded when the
//! url is built.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|segment| segment.to_string()).collect(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Unencoded path for log events, e.g. `/courses/c1`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn dashboard() -> Self {
        Self::new(&["teacher", "dashboard"])
    }

    pub fn campus_students(campus_id: &str) -> Self {
        Self::new(&["campuses", campus_id, "students"])
    }

    pub fn courses(campus_id: &str) -> Self {
        Self::new(&["courses"]).with_query("campusId", campus_id)
    }

    pub fn course_attendance(course_id: &str, date: &str) -> Self {
        Self::new(&["attendance", "course", course_id]).with_query("date", date)
    }

    pub fn batches() -> Self {
        Self::new(&["assessments", "batches"])
    }

    pub fn course_batches(course_id: &str) -> Self {
        Self::batches().with_query("courseId", course_id)
    }

    pub fn batch(batch_id: &str) -> Self {
        Self::new(&["assessments", "batches", batch_id])
    }

    pub fn batch_marks(batch_id: &str) -> Self {
        Self::new(&["assessments", "batches", batch_id, "marks"])
    }

    pub fn batch_student(batch_id: &str, student_id: &str) -> Self {
        Self::new(&["assessments", "batches", batch_id, "students", student_id])
    }

    pub fn lesson_plans(course_id: &str) -> Self {
        Self::new(&["lesson-plans"]).with_query("courseId", course_id)
    }

    pub fn registrations() -> Self {
        Self::new(&["registrations"])
    }
}
