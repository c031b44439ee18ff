use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

use crate::database::models::{GradeRecord, Subject};
use crate::types::PERIODS_PER_CYCLE;

/// A recorded period score with its components
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodScore {
    pub grade_id: Uuid,
    pub classwork: f64,
    pub exam: f64,
    pub total: f64,
}

/// One subject with its four period slots. Empty slots mean "no data".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectPeriods {
    pub subject_id: Uuid,
    pub subject: String,
    pub periods: [Option<PeriodScore>; PERIODS_PER_CYCLE],
}

impl SubjectPeriods {
    pub fn totals(&self) -> [Option<f64>; PERIODS_PER_CYCLE] {
        self.periods.map(|slot| slot.map(|score| score.total))
    }
}

/// Case and accent insensitive ordering key, tie-broken by the raw text
pub fn collation_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b)).then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Group a student's grades by subject.
///
/// The subject list is the row set: every subject yields a row even with no
/// grades, and grades for subjects outside the list are ignored. Rows are
/// ordered by subject name.
pub fn aggregate_by_subject(subjects: &[Subject], grades: &[GradeRecord]) -> Vec<SubjectPeriods> {
    let mut rows: Vec<SubjectPeriods> = subjects
        .iter()
        .map(|subject| {
            let mut periods = [None; PERIODS_PER_CYCLE];
            for grade in grades.iter().filter(|g| g.active && g.subject_id == subject.id) {
                periods[grade.period.index()] = Some(PeriodScore {
                    grade_id: grade.id,
                    classwork: grade.classwork,
                    exam: grade.exam,
                    total: grade.total,
                });
            }
            SubjectPeriods {
                subject_id: subject.id,
                subject: subject.name.clone(),
                periods,
            }
        })
        .collect();

    rows.sort_by(|a, b| collation_cmp(&a.subject, &b.subject));
    rows
}
