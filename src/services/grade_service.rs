use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{AppConfig, SchoolConfig};
use crate::database::models::{Course, GradeFilter, GradeRecord, Page, UserIdentity};
use crate::database::{SchoolStore, StoreError};
use crate::grading::normalizer::{check_components, total};
use crate::grading::{
    accumulate, aggregate_by_subject, build_roster_grid, period_statistics, summarize_averages,
    AverageSummary, GradeEdit, GradeError, GradingPolicy, RosterGrid, SubjectPeriods, Validator,
};
use crate::transcript::{RenderError, ReportCard};
use crate::types::Period;

/// Settings the grade service reads on every call
#[derive(Debug, Clone)]
pub struct GradeServiceConfig {
    pub grading: GradingPolicy,
    pub school: SchoolConfig,
    pub default_page_limit: i64,
    pub max_page_limit: i64,
}

impl GradeServiceConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            grading: config.grading.clone(),
            school: config.school.clone(),
            default_page_limit: config.api.default_page_limit,
            max_page_limit: config.api.max_page_limit,
        }
    }
}

impl Default for GradeServiceConfig {
    fn default() -> Self {
        Self {
            grading: GradingPolicy::default(),
            school: SchoolConfig::default(),
            default_page_limit: 50,
            max_page_limit: 1000,
        }
    }
}

/// Body of a grade registration. Numeric fields stay raw so that range
/// problems surface as field errors rather than decode failures.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterGrade {
    pub student_id: Uuid,
    pub subject_id: Uuid,
    pub course_id: Uuid,
    pub period: Option<i64>,
    pub cycle: Option<i64>,
    pub classwork: Option<f64>,
    pub exam: Option<f64>,
    #[serde(default)]
    pub remarks: Option<String>,
}

struct CheckedGrade {
    period: Period,
    cycle: i32,
    classwork: f64,
    exam: f64,
}

fn check_period(v: &mut Validator, period: Option<i64>) -> Option<Period> {
    match period {
        None => {
            v.reject("period", "is required");
            None
        }
        Some(raw) => {
            let parsed = Period::new(raw);
            if parsed.is_none() {
                v.reject("period", "must be 1, 2, 3 or 4");
            }
            parsed
        }
    }
}

fn check_cycle(v: &mut Validator, policy: &GradingPolicy, cycle: Option<i64>) -> Option<i32> {
    match cycle {
        None => {
            v.reject("cycle", "is required");
            None
        }
        Some(raw) if policy.cycle_in_range(raw) => Some(raw as i32),
        Some(_) => {
            v.reject(
                "cycle",
                format!("must be between {} and {}", policy.min_cycle, policy.max_cycle),
            );
            None
        }
    }
}

impl RegisterGrade {
    fn check(&self, policy: &GradingPolicy) -> Result<CheckedGrade, GradeError> {
        let mut v = Validator::new();
        let period = check_period(&mut v, self.period);
        let cycle = check_cycle(&mut v, policy, self.cycle);
        if self.classwork.is_none() {
            v.reject("classwork", "is required");
        }
        if self.exam.is_none() {
            v.reject("exam", "is required");
        }
        check_components(&mut v, policy, self.classwork, self.exam);
        v.finish()?;

        match (period, cycle, self.classwork, self.exam) {
            (Some(period), Some(cycle), Some(classwork), Some(exam)) => Ok(CheckedGrade {
                period,
                cycle,
                classwork,
                exam,
            }),
            _ => Err(GradeError::invalid("grade", "incomplete grade")),
        }
    }
}

/// Listing filters from the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListGrades {
    pub cycle: Option<i64>,
    pub period: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradePage {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub grades: Vec<GradeRecord>,
}

/// Mode A summary of one student's cycle
#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub student: UserIdentity,
    pub course: Course,
    pub cycle: i32,
    pub passing_score: f64,
    #[serde(flatten)]
    pub summary: AverageSummary,
}

/// Rendered report card ready to be streamed
#[derive(Debug, Clone)]
pub struct Transcript {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A student's enrollment context with the per-subject period grid
struct StudentGrades {
    student: UserIdentity,
    course: Course,
    cycle: i32,
    passing_score: f64,
    rows: Vec<SubjectPeriods>,
}

#[derive(Clone)]
pub struct GradeService {
    store: Arc<dyn SchoolStore>,
    config: Arc<GradeServiceConfig>,
}

impl GradeService {
    pub fn new(store: Arc<dyn SchoolStore>, config: GradeServiceConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GradeServiceConfig {
        &self.config
    }

    pub async fn health_check(&self) -> Result<(), GradeError> {
        Ok(self.store.health_check().await?)
    }

    fn policy(&self) -> &GradingPolicy {
        &self.config.grading
    }

    fn checked_cycle(&self, cycle: i64) -> Result<i32, GradeError> {
        let mut v = Validator::new();
        let cycle = check_cycle(&mut v, self.policy(), Some(cycle));
        v.finish()?;
        cycle.ok_or_else(|| GradeError::invalid("cycle", "is required"))
    }

    /// Register a new grade for an enrolled student
    pub async fn register_grade(
        &self,
        request: RegisterGrade,
        recorded_by: Uuid,
    ) -> Result<GradeRecord, GradeError> {
        let checked = request.check(self.policy())?;

        let (enrollment, subject) = futures::try_join!(
            self.store
                .find_enrollment(request.student_id, request.course_id, checked.cycle),
            self.store.find_subject(request.subject_id),
        )?;

        if enrollment.is_none() {
            tracing::warn!(
                student_id = %request.student_id,
                course_id = %request.course_id,
                cycle = checked.cycle,
                "grade rejected: no active enrollment"
            );
            return Err(GradeError::PreconditionFailed(format!(
                "Student is not actively enrolled in this course for cycle {}",
                checked.cycle
            )));
        }

        let subject = subject
            .filter(|s| s.active)
            .ok_or_else(|| GradeError::NotFound(format!("Subject {} not found", request.subject_id)))?;
        if subject.course_id != request.course_id {
            return Err(GradeError::invalid("subject_id", "does not belong to the course"));
        }

        let existing = self
            .store
            .find_active_grade(request.student_id, request.subject_id, checked.period, checked.cycle)
            .await?;
        if existing.is_some() {
            tracing::warn!(
                student_id = %request.student_id,
                subject_id = %request.subject_id,
                period = %checked.period,
                "grade rejected: already recorded"
            );
            return Err(duplicate(checked.period));
        }

        let now = Utc::now();
        let record = GradeRecord {
            id: Uuid::new_v4(),
            student_id: request.student_id,
            subject_id: request.subject_id,
            course_id: request.course_id,
            period: checked.period,
            cycle: checked.cycle,
            classwork: checked.classwork,
            exam: checked.exam,
            total: total(checked.classwork, checked.exam),
            remarks: request.remarks.unwrap_or_default(),
            recorded_by,
            active: true,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_grade(record).await {
            Ok(grade) => {
                tracing::info!(
                    grade_id = %grade.id,
                    student_id = %grade.student_id,
                    period = %grade.period,
                    total = grade.total,
                    "grade registered"
                );
                Ok(grade)
            }
            Err(StoreError::Duplicate) => Err(duplicate(checked.period)),
            Err(e) => {
                tracing::error!("failed to store grade: {}", e);
                Err(e.into())
            }
        }
    }

    /// Update classwork, exam or remarks of an active grade
    pub async fn edit_grade(&self, id: Uuid, edit: GradeEdit) -> Result<GradeRecord, GradeError> {
        edit.validate(self.policy())?;

        if let Some(updated) = self.store.edit_active_grade(id, &edit, Utc::now()).await? {
            tracing::info!(grade_id = %id, total = updated.total, "grade updated");
            return Ok(updated);
        }

        match self.store.find_grade(id).await? {
            Some(_) => {
                tracing::warn!(grade_id = %id, "edit rejected: grade is inactive");
                Err(GradeError::Inactive(format!("Grade {} has been deactivated", id)))
            }
            None => Err(grade_not_found(id)),
        }
    }

    /// Soft delete. The record stays readable by id.
    pub async fn deactivate_grade(&self, id: Uuid) -> Result<GradeRecord, GradeError> {
        let grade = self
            .store
            .deactivate_grade(id)
            .await?
            .ok_or_else(|| grade_not_found(id))?;
        tracing::info!(grade_id = %id, "grade deactivated");
        Ok(grade)
    }

    pub async fn get_grade(&self, id: Uuid) -> Result<GradeRecord, GradeError> {
        self.store
            .find_grade(id)
            .await?
            .ok_or_else(|| grade_not_found(id))
    }

    /// Active grades, newest first
    pub async fn list_grades(&self, query: ListGrades) -> Result<GradePage, GradeError> {
        let mut v = Validator::new();
        let cycle = query.cycle.and_then(|c| check_cycle(&mut v, self.policy(), Some(c)));
        let period = query.period.and_then(|p| check_period(&mut v, Some(p)));
        let limit = query.limit.unwrap_or(self.config.default_page_limit);
        if limit < 1 {
            v.reject("limit", "must be at least 1");
        }
        let offset = query.offset.unwrap_or(0);
        if offset < 0 {
            v.reject("offset", "must not be negative");
        }
        v.finish()?;

        let page = Page {
            limit: limit.min(self.config.max_page_limit),
            offset,
        };
        let filter = GradeFilter {
            cycle,
            period,
            ..Default::default()
        };

        let (total, grades) = futures::try_join!(
            self.store.count_grades(&filter),
            self.store.list_grades(&filter, Some(page)),
        )?;

        tracing::debug!(total, returned = grades.len(), "grades listed");
        Ok(GradePage {
            total,
            limit: page.limit,
            offset: page.offset,
            grades,
        })
    }

    async fn student_grades(&self, student_id: Uuid, cycle: i64) -> Result<StudentGrades, GradeError> {
        let cycle = self.checked_cycle(cycle)?;

        let (student, enrollment) = futures::try_join!(
            self.store.find_user(student_id),
            self.store.find_student_enrollment(student_id, cycle),
        )?;
        let student =
            student.ok_or_else(|| GradeError::NotFound(format!("Student {} not found", student_id)))?;
        let enrollment = enrollment.ok_or_else(|| {
            GradeError::NotFound(format!("Student has no active enrollment for cycle {}", cycle))
        })?;
        let course = enrollment.course;

        let filter = GradeFilter {
            student_id: Some(student_id),
            cycle: Some(cycle),
            ..Default::default()
        };
        let (subjects, grades) = futures::try_join!(
            self.store.course_subjects(course.id),
            self.store.list_grades(&filter, None),
        )?;

        let rows = aggregate_by_subject(&subjects, &grades);
        tracing::debug!(
            student_id = %student_id,
            subjects = rows.len(),
            grades = grades.len(),
            "student grades aggregated"
        );

        Ok(StudentGrades {
            passing_score: self.policy().passing_score(course.stage),
            student,
            course,
            cycle,
            rows,
        })
    }

    /// Per-subject averages for one student and cycle
    pub async fn student_summary(&self, student_id: Uuid, cycle: i64) -> Result<StudentSummary, GradeError> {
        let grades = self.student_grades(student_id, cycle).await?;
        let summary = summarize_averages(&grades.rows, grades.passing_score);

        Ok(StudentSummary {
            student: grades.student,
            course: grades.course,
            cycle: grades.cycle,
            passing_score: grades.passing_score,
            summary,
        })
    }

    /// Every enrolled student of a course with their grade for one subject and period
    pub async fn roster_grid(
        &self,
        course_id: Uuid,
        subject_id: Uuid,
        period: i64,
        cycle: i64,
    ) -> Result<RosterGrid, GradeError> {
        let mut v = Validator::new();
        let period = check_period(&mut v, Some(period));
        let cycle = check_cycle(&mut v, self.policy(), Some(cycle));
        v.finish()?;
        let (period, cycle) = match (period, cycle) {
            (Some(p), Some(c)) => (p, c),
            _ => return Err(GradeError::invalid("period", "is required")),
        };

        let (course, subject) = futures::try_join!(
            self.store.find_course(course_id),
            self.store.find_subject(subject_id),
        )?;
        course.ok_or_else(|| GradeError::NotFound(format!("Course {} not found", course_id)))?;
        let subject =
            subject.ok_or_else(|| GradeError::NotFound(format!("Subject {} not found", subject_id)))?;
        if subject.course_id != course_id {
            return Err(GradeError::invalid("subject_id", "does not belong to the course"));
        }

        let filter = GradeFilter {
            subject_id: Some(subject_id),
            period: Some(period),
            cycle: Some(cycle),
            ..Default::default()
        };
        let (roster, grades) = futures::try_join!(
            self.store.roster(course_id, cycle),
            self.store.list_grades(&filter, None),
        )?;

        let grid = build_roster_grid(course_id, subject_id, period, cycle, roster, &grades);
        tracing::debug!(
            course_id = %course_id,
            students = grid.total_students,
            present = grid.present_count,
            "roster grid built"
        );
        Ok(grid)
    }

    /// Mode B data for the printed report card
    pub async fn report_card(&self, student_id: Uuid, cycle: i64) -> Result<ReportCard, GradeError> {
        let grades = self.student_grades(student_id, cycle).await?;
        let report = accumulate(&grades.rows, self.policy(), grades.passing_score);
        let statistics = period_statistics(&report.subjects, grades.passing_score);

        Ok(ReportCard {
            school: self.config.school.clone(),
            student: grades.student,
            course: grades.course,
            cycle: grades.cycle,
            passing_score: grades.passing_score,
            points_per_period: self.policy().points_per_period,
            report,
            statistics,
            generated_on: Local::now().date_naive(),
        })
    }

    /// Build and render the report card PDF off the async executor
    pub async fn render_transcript(&self, student_id: Uuid, cycle: i64) -> Result<Transcript, GradeError> {
        let card = self.report_card(student_id, cycle).await?;
        let filename = card.filename();

        let bytes = tokio::task::spawn_blocking(move || card.render())
            .await
            .map_err(|e| RenderError::Task(e.to_string()))??;

        tracing::info!(student_id = %student_id, size = bytes.len(), "transcript rendered");
        Ok(Transcript { filename, bytes })
    }
}

fn grade_not_found(id: Uuid) -> GradeError {
    GradeError::NotFound(format!("Grade {} not found", id))
}

fn duplicate(period: Period) -> GradeError {
    GradeError::Duplicate(format!("A grade is already recorded for period {}", period))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterGrade {
        RegisterGrade {
            student_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            period: Some(2),
            cycle: Some(2024),
            classwork: Some(45.0),
            exam: Some(30.0),
            remarks: None,
        }
    }

    #[test]
    fn registration_reports_every_bad_field() {
        let bad = RegisterGrade {
            period: Some(5),
            cycle: Some(2019),
            classwork: Some(70.0),
            exam: None,
            ..request()
        };
        match bad.check(&GradingPolicy::default()) {
            Err(GradeError::Validation(errors)) => {
                let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                assert_eq!(fields, vec!["classwork", "cycle", "exam", "period"]);
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[test]
    fn valid_registration_passes_checks() {
        let checked = request().check(&GradingPolicy::default()).unwrap();
        assert_eq!(checked.period.number(), 2);
        assert_eq!(checked.cycle, 2024);
    }

    #[test]
    fn service_config_follows_app_config() {
        let app = AppConfig::from_env();
        let config = GradeServiceConfig::from_app(&app);
        assert_eq!(config.max_page_limit, app.api.max_page_limit);
        assert_eq!(config.school, app.school);
    }
}
