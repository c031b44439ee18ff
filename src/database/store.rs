use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Course, Enrollment, EnrollmentWithCourse, GradeFilter, GradeRecord, Page, RosterEntry,
    Subject, UserIdentity,
};
use crate::grading::GradeEdit;
use crate::types::Period;

/// Errors raised by a SchoolStore implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// An active grade already exists for (student, subject, period, cycle)
    #[error("Duplicate active grade record")]
    Duplicate,

    #[error("Stored value is unreadable: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence boundary for grade records and the read-only school data
/// the grading engine consumes (enrollments, subjects, users, courses).
///
/// Every grade lookup only sees active records unless stated otherwise.
#[async_trait]
pub trait SchoolStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Insert a new grade record. Fails with `StoreError::Duplicate` when an
    /// active record exists for the same (student, subject, period, cycle).
    async fn insert_grade(&self, grade: GradeRecord) -> Result<GradeRecord, StoreError>;

    /// Find a grade by id regardless of its active flag
    async fn find_grade(&self, id: Uuid) -> Result<Option<GradeRecord>, StoreError>;

    async fn find_active_grade(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        period: Period,
        cycle: i32,
    ) -> Result<Option<GradeRecord>, StoreError>;

    /// Merge `edit` into the active record with this id and re-derive its
    /// total, as one atomic step. `None` when no active record matches.
    async fn edit_active_grade(
        &self,
        id: Uuid,
        edit: &GradeEdit,
        now: DateTime<Utc>,
    ) -> Result<Option<GradeRecord>, StoreError>;

    /// Soft delete: clears the active flag, never removes the row
    async fn deactivate_grade(&self, id: Uuid) -> Result<Option<GradeRecord>, StoreError>;

    async fn count_grades(&self, filter: &GradeFilter) -> Result<i64, StoreError>;

    /// Active grades matching `filter`, newest first
    async fn list_grades(
        &self,
        filter: &GradeFilter,
        page: Option<Page>,
    ) -> Result<Vec<GradeRecord>, StoreError>;

    /// Active enrollment for exactly this student, course and cycle
    async fn find_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        cycle: i32,
    ) -> Result<Option<Enrollment>, StoreError>;

    /// The student's newest active enrollment in a cycle, joined with its course
    async fn find_student_enrollment(
        &self,
        student_id: Uuid,
        cycle: i32,
    ) -> Result<Option<EnrollmentWithCourse>, StoreError>;

    /// Actively enrolled students of a course in a cycle, unordered
    async fn roster(&self, course_id: Uuid, cycle: i32) -> Result<Vec<RosterEntry>, StoreError>;

    /// Active subjects of a course, ordered by name
    async fn course_subjects(&self, course_id: Uuid) -> Result<Vec<Subject>, StoreError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<UserIdentity>, StoreError>;

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError>;

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>, StoreError>;
}
