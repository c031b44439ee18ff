use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::{GradeError, Validator};
use super::policy::GradingPolicy;
use crate::database::models::GradeRecord;

/// Record total from its two components
pub fn total(classwork: f64, exam: f64) -> f64 {
    classwork + exam
}

/// Range-check whichever components are present
pub fn check_components(
    v: &mut Validator,
    policy: &GradingPolicy,
    classwork: Option<f64>,
    exam: Option<f64>,
) {
    if let Some(c) = classwork {
        if !c.is_finite() || c < 0.0 || c > policy.classwork_max {
            v.reject("classwork", format!("must be between 0 and {}", policy.classwork_max));
        }
    }
    if let Some(e) = exam {
        if !e.is_finite() || e < 0.0 || e > policy.exam_max {
            v.reject("exam", format!("must be between 0 and {}", policy.exam_max));
        }
    }
}

/// Partial update of a grade record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GradeEdit {
    pub classwork: Option<f64>,
    pub exam: Option<f64>,
    pub remarks: Option<String>,
}

impl GradeEdit {
    pub fn validate(&self, policy: &GradingPolicy) -> Result<(), GradeError> {
        let mut v = Validator::new();
        check_components(&mut v, policy, self.classwork, self.exam);
        v.finish()
    }

    /// Apply onto `record`. A missing component keeps the stored value and the
    /// total is always re-derived from the resulting pair.
    pub fn apply(&self, record: &mut GradeRecord, now: DateTime<Utc>) {
        if let Some(classwork) = self.classwork {
            record.classwork = classwork;
        }
        if let Some(exam) = self.exam {
            record.exam = exam;
        }
        if let Some(remarks) = &self.remarks {
            record.remarks = remarks.clone();
        }
        record.total = total(record.classwork, record.exam);
        record.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Period;
    use uuid::Uuid;

    fn record(classwork: f64, exam: f64) -> GradeRecord {
        let now = Utc::now();
        GradeRecord {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            period: Period::ALL[0],
            cycle: 2024,
            classwork,
            exam,
            total: total(classwork, exam),
            remarks: String::new(),
            recorded_by: Uuid::new_v4(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn total_is_sum_and_stable() {
        for classwork in [0.0, 12.5, 45.5, 60.0] {
            for exam in [0.0, 17.25, 35.0, 40.0] {
                let once = total(classwork, exam);
                assert_eq!(once, classwork + exam);
                assert_eq!(total(classwork, exam), once);
                assert!((0.0..=100.0).contains(&once));
            }
        }
    }

    #[test]
    fn partial_edit_reuses_stored_component() {
        let mut grade = record(40.0, 30.0);
        GradeEdit { exam: Some(35.0), ..Default::default() }.apply(&mut grade, Utc::now());
        assert_eq!(grade.classwork, 40.0);
        assert_eq!(grade.total, 75.0);

        GradeEdit { classwork: Some(50.0), ..Default::default() }.apply(&mut grade, Utc::now());
        assert_eq!(grade.total, 85.0);
    }

    #[test]
    fn remarks_only_edit_keeps_total() {
        let mut grade = record(45.5, 35.0);
        GradeEdit { remarks: Some("Mejoró".to_string()), ..Default::default() }
            .apply(&mut grade, Utc::now());
        assert_eq!(grade.total, 80.5);
        assert_eq!(grade.remarks, "Mejoró");
    }

    #[test]
    fn out_of_range_components_are_rejected() {
        let policy = GradingPolicy::default();
        let edit = GradeEdit { classwork: Some(61.0), exam: Some(-1.0), remarks: None };
        match edit.validate(&policy) {
            Err(GradeError::Validation(errors)) => {
                assert!(errors.contains_key("classwork"));
                assert!(errors.contains_key("exam"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(GradeEdit { exam: Some(f64::NAN), ..Default::default() }.validate(&policy).is_err());
        assert!(GradeEdit { classwork: Some(60.0), exam: Some(40.0), remarks: None }
            .validate(&policy)
            .is_ok());
    }
}
