use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Course, UserIdentity};

/// Student-course assignment for one school cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub cycle: i32,
    pub active: bool,
}

/// Active enrollment resolved together with its course
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentWithCourse {
    pub enrollment: Enrollment,
    pub course: Course,
}

/// One member of a course roster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub enrollment_id: Uuid,
    pub student: UserIdentity,
}
