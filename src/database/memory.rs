use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Course, Enrollment, EnrollmentWithCourse, GradeFilter, GradeRecord, Page, RosterEntry,
    Subject, UserIdentity,
};
use super::store::{SchoolStore, StoreError};
use crate::grading::GradeEdit;
use crate::types::Period;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserIdentity>,
    courses: HashMap<Uuid, Course>,
    subjects: HashMap<Uuid, Subject>,
    enrollments: Vec<Enrollment>,
    grades: Vec<GradeRecord>,
}

/// School data an in-memory store can start from. Grades are never seeded.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub users: Vec<UserIdentity>,
    pub courses: Vec<Course>,
    pub subjects: Vec<Subject>,
    pub enrollments: Vec<Enrollment>,
}

/// In-process store backed by a single RwLock.
///
/// Grade uniqueness is checked and the insert applied under the same write
/// guard, so concurrent registrations for one key yield exactly one success.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let tables = Tables {
            users: seed.users.into_iter().map(|u| (u.id, u)).collect(),
            courses: seed.courses.into_iter().map(|c| (c.id, c)).collect(),
            subjects: seed.subjects.into_iter().map(|s| (s.id, s)).collect(),
            enrollments: seed.enrollments,
            grades: Vec::new(),
        };
        Self { tables: RwLock::new(tables) }
    }

    pub async fn add_user(&self, user: UserIdentity) {
        self.tables.write().await.users.insert(user.id, user);
    }

    pub async fn add_course(&self, course: Course) {
        self.tables.write().await.courses.insert(course.id, course);
    }

    pub async fn add_subject(&self, subject: Subject) {
        self.tables.write().await.subjects.insert(subject.id, subject);
    }

    pub async fn add_enrollment(&self, enrollment: Enrollment) {
        self.tables.write().await.enrollments.push(enrollment);
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_grade(&self, grade: GradeRecord) -> Result<GradeRecord, StoreError> {
        let mut tables = self.tables.write().await;
        let clash = tables.grades.iter().any(|g| {
            g.active
                && g.student_id == grade.student_id
                && g.subject_id == grade.subject_id
                && g.period == grade.period
                && g.cycle == grade.cycle
        });
        if clash {
            return Err(StoreError::Duplicate);
        }
        tables.grades.push(grade.clone());
        Ok(grade)
    }

    async fn find_grade(&self, id: Uuid) -> Result<Option<GradeRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.grades.iter().find(|g| g.id == id).cloned())
    }

    async fn find_active_grade(
        &self,
        student_id: Uuid,
        subject_id: Uuid,
        period: Period,
        cycle: i32,
    ) -> Result<Option<GradeRecord>, StoreError> {
        let filter = GradeFilter {
            student_id: Some(student_id),
            subject_id: Some(subject_id),
            period: Some(period),
            cycle: Some(cycle),
            ..Default::default()
        };
        let tables = self.tables.read().await;
        Ok(tables.grades.iter().find(|g| filter.matches(g)).cloned())
    }

    async fn edit_active_grade(
        &self,
        id: Uuid,
        edit: &GradeEdit,
        now: DateTime<Utc>,
    ) -> Result<Option<GradeRecord>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.grades.iter_mut().find(|g| g.id == id && g.active) else {
            return Ok(None);
        };
        edit.apply(stored, now);
        Ok(Some(stored.clone()))
    }

    async fn deactivate_grade(&self, id: Uuid) -> Result<Option<GradeRecord>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(stored) = tables.grades.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        stored.active = false;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn count_grades(&self, filter: &GradeFilter) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.grades.iter().filter(|g| filter.matches(g)).count() as i64)
    }

    async fn list_grades(
        &self,
        filter: &GradeFilter,
        page: Option<Page>,
    ) -> Result<Vec<GradeRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut grades: Vec<GradeRecord> = tables
            .grades
            .iter()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        grades.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(match page {
            Some(page) => grades
                .into_iter()
                .skip(page.offset.max(0) as usize)
                .take(page.limit.max(0) as usize)
                .collect(),
            None => grades,
        })
    }

    async fn find_enrollment(
        &self,
        student_id: Uuid,
        course_id: Uuid,
        cycle: i32,
    ) -> Result<Option<Enrollment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .find(|e| e.active && e.student_id == student_id && e.course_id == course_id && e.cycle == cycle)
            .cloned())
    }

    async fn find_student_enrollment(
        &self,
        student_id: Uuid,
        cycle: i32,
    ) -> Result<Option<EnrollmentWithCourse>, StoreError> {
        let tables = self.tables.read().await;
        let found = tables
            .enrollments
            .iter()
            .rev()
            .filter(|e| e.active && e.student_id == student_id && e.cycle == cycle)
            .find_map(|e| {
                tables.courses.get(&e.course_id).map(|course| EnrollmentWithCourse {
                    enrollment: e.clone(),
                    course: course.clone(),
                })
            });
        Ok(found)
    }

    async fn roster(&self, course_id: Uuid, cycle: i32) -> Result<Vec<RosterEntry>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .enrollments
            .iter()
            .filter(|e| e.active && e.course_id == course_id && e.cycle == cycle)
            .filter_map(|e| {
                tables.users.get(&e.student_id).map(|student| RosterEntry {
                    enrollment_id: e.id,
                    student: student.clone(),
                })
            })
            .collect())
    }

    async fn course_subjects(&self, course_id: Uuid) -> Result<Vec<Subject>, StoreError> {
        let tables = self.tables.read().await;
        let mut subjects: Vec<Subject> = tables
            .subjects
            .values()
            .filter(|s| s.active && s.course_id == course_id)
            .cloned()
            .collect();
        subjects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(subjects)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<UserIdentity>, StoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_course(&self, id: Uuid) -> Result<Option<Course>, StoreError> {
        Ok(self.tables.read().await.courses.get(&id).cloned())
    }

    async fn find_subject(&self, id: Uuid) -> Result<Option<Subject>, StoreError> {
        Ok(self.tables.read().await.subjects.get(&id).cloned())
    }
}
