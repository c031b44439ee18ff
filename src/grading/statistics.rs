use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::accumulation::SubjectAccumulation;
use super::aggregator::collation_cmp;
use super::policy::{mean, round_to_cents, round_to_whole};
use crate::database::models::{GradeRecord, RosterEntry};
use crate::types::{Period, PERIODS_PER_CYCLE};

/// Class figures for one period across a student's subjects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStatistics {
    pub period: Period,
    /// Whole-number mean of the subject totals with data
    pub average: Option<i64>,
    /// Subjects whose total is below the passing score
    pub failing: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassStatistics {
    pub periods: [PeriodStatistics; PERIODS_PER_CYCLE],
}

pub fn period_statistics(rows: &[SubjectAccumulation], passing_score: f64) -> ClassStatistics {
    let periods = Period::ALL.map(|period| {
        let totals: Vec<f64> = rows.iter().filter_map(|row| row.totals[period.index()]).collect();
        PeriodStatistics {
            period,
            average: mean(&totals).map(round_to_whole),
            failing: totals.iter().filter(|t| **t < passing_score).count(),
        }
    });

    ClassStatistics { periods }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterStudent {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub student_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterGrade {
    pub grade_id: Uuid,
    pub classwork: f64,
    pub exam: f64,
    pub total: f64,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterRow {
    pub enrollment_id: Uuid,
    pub student: RosterStudent,
    /// None when the student has no grade for the period
    pub grade: Option<RosterGrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterGrid {
    pub course_id: Uuid,
    pub subject_id: Uuid,
    pub period: Period,
    pub cycle: i32,
    pub rows: Vec<RosterRow>,
    pub class_mean: Option<f64>,
    pub total_students: usize,
    pub present_count: usize,
    pub absent_count: usize,
}

/// Join the enrolled roster against the grades of one subject and period.
///
/// The roster defines the rows; grades of students outside it are dropped.
pub fn build_roster_grid(
    course_id: Uuid,
    subject_id: Uuid,
    period: Period,
    cycle: i32,
    roster: Vec<RosterEntry>,
    grades: &[GradeRecord],
) -> RosterGrid {
    let by_student: HashMap<Uuid, &GradeRecord> = grades
        .iter()
        .filter(|g| g.active && g.subject_id == subject_id && g.period == period && g.cycle == cycle)
        .map(|g| (g.student_id, g))
        .collect();

    let mut rows: Vec<RosterRow> = roster
        .into_iter()
        .map(|entry| {
            let grade = by_student.get(&entry.student.id).map(|g| RosterGrade {
                grade_id: g.id,
                classwork: g.classwork,
                exam: g.exam,
                total: g.total,
                remarks: g.remarks.clone(),
            });
            RosterRow {
                enrollment_id: entry.enrollment_id,
                student: RosterStudent {
                    id: entry.student.id,
                    name: entry.student.name,
                    surname: entry.student.surname,
                    student_code: entry.student.student_code,
                },
                grade,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        collation_cmp(&a.student.surname, &b.student.surname)
            .then_with(|| collation_cmp(&a.student.name, &b.student.name))
    });

    let present: Vec<f64> = rows.iter().filter_map(|r| r.grade.as_ref().map(|g| g.total)).collect();

    RosterGrid {
        course_id,
        subject_id,
        period,
        cycle,
        class_mean: mean(&present).map(round_to_cents),
        total_students: rows.len(),
        present_count: present.len(),
        absent_count: rows.len() - present.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::UserIdentity;
    use crate::types::Role;
    use chrono::Utc;

    fn accumulation(totals: [Option<f64>; 4]) -> SubjectAccumulation {
        SubjectAccumulation {
            subject_id: Uuid::new_v4(),
            subject: "Materia".to_string(),
            totals,
            cumulative: None,
            passed: None,
        }
    }

    #[test]
    fn period_failing_counts_subjects_below_threshold() {
        let rows = vec![
            accumulation([Some(55.0), None, None, None]),
            accumulation([Some(65.0), None, None, None]),
            accumulation([None, None, None, None]),
        ];
        let stats = period_statistics(&rows, 60.0);

        assert_eq!(stats.periods[0].failing, 1);
        assert_eq!(stats.periods[0].average, Some(60));
        assert_eq!(stats.periods[1].average, None);
        assert_eq!(stats.periods[1].failing, 0);
    }

    #[test]
    fn period_average_rounds_half_up_to_whole() {
        let rows = vec![
            accumulation([Some(60.0), None, None, None]),
            accumulation([Some(61.0), None, None, None]),
        ];
        assert_eq!(period_statistics(&rows, 60.0).periods[0].average, Some(61));
    }

    fn entry(name: &str, surname: &str) -> RosterEntry {
        RosterEntry {
            enrollment_id: Uuid::new_v4(),
            student: UserIdentity {
                id: Uuid::new_v4(),
                name: name.to_string(),
                surname: surname.to_string(),
                role: Role::Student,
                student_code: None,
                active: true,
            },
        }
    }

    fn grade_for(student_id: Uuid, subject_id: Uuid, total: f64) -> GradeRecord {
        let now = Utc::now();
        GradeRecord {
            id: Uuid::new_v4(),
            student_id,
            subject_id,
            course_id: Uuid::nil(),
            period: Period::ALL[1],
            cycle: 2024,
            classwork: total - 30.0,
            exam: 30.0,
            total,
            remarks: String::new(),
            recorded_by: Uuid::nil(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn roster_keeps_ungraded_students_sorted_by_surname() {
        let subject_id = Uuid::new_v4();
        let roster = vec![entry("Ana", "Pérez"), entry("Luis", "Álvarez"), entry("Marta", "García")];
        let grades = vec![
            grade_for(roster[0].student.id, subject_id, 71.0),
            grade_for(roster[2].student.id, subject_id, 80.5),
            grade_for(Uuid::new_v4(), subject_id, 99.0),
        ];

        let grid = build_roster_grid(Uuid::nil(), subject_id, Period::ALL[1], 2024, roster, &grades);

        let surnames: Vec<&str> = grid.rows.iter().map(|r| r.student.surname.as_str()).collect();
        assert_eq!(surnames, vec!["Álvarez", "García", "Pérez"]);
        assert!(grid.rows[0].grade.is_none());
        assert_eq!(grid.total_students, 3);
        assert_eq!(grid.present_count, 2);
        assert_eq!(grid.absent_count, 1);
        assert_eq!(grid.class_mean, Some(75.75));
    }

    #[test]
    fn empty_roster_has_no_mean() {
        let grid = build_roster_grid(Uuid::nil(), Uuid::nil(), Period::ALL[0], 2024, vec![], &[]);
        assert_eq!(grid.class_mean, None);
        assert_eq!(grid.total_students, 0);
    }
}
