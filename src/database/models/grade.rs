use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Period;

/// One score entry for a student, subject and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub course_id: Uuid,
    pub period: Period,
    pub cycle: i32,
    /// Classwork ("zona") score, 0-60
    pub classwork: f64,
    /// Exam score, 0-40
    pub exam: f64,
    /// Always classwork + exam
    pub total: f64,
    pub remarks: String,
    pub recorded_by: Uuid,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Selection over active grade records. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeFilter {
    pub student_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub period: Option<Period>,
    pub cycle: Option<i32>,
}

impl GradeFilter {
    pub fn matches(&self, grade: &GradeRecord) -> bool {
        grade.active
            && self.student_id.map_or(true, |id| grade.student_id == id)
            && self.subject_id.map_or(true, |id| grade.subject_id == id)
            && self.course_id.map_or(true, |id| grade.course_id == id)
            && self.period.map_or(true, |p| grade.period == p)
            && self.cycle.map_or(true, |c| grade.cycle == c)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}
