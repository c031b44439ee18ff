//! The two aggregation modes.
//!
//! Mode A (`summarize_averages`) powers the JSON summary: a plain mean of the
//! periods that have data, and "no data" stays null all the way up.
//! Mode B (`accumulate`) powers the transcript: each period adds at most
//! `points_per_period` points, and an empty course averages to 0.
//!
//! Both are kept separate on purpose; their empty-data and rounding rules differ.

use serde::Serialize;
use uuid::Uuid;

use super::aggregator::{PeriodScore, SubjectPeriods};
use super::policy::{mean, round_to_cents, GradingPolicy};
use crate::types::PERIODS_PER_CYCLE;

/// Mode A row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAverage {
    pub subject_id: Uuid,
    pub subject: String,
    pub periods: [Option<PeriodScore>; PERIODS_PER_CYCLE],
    pub average: Option<f64>,
    /// None when the subject has no data
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageSummary {
    pub subjects: Vec<SubjectAverage>,
    pub overall_average: Option<f64>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub total_subjects: usize,
}

/// Mean of the occupied period totals, rounded to cents
pub fn period_average(totals: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = totals.iter().flatten().copied().collect();
    mean(&present).map(round_to_cents)
}

pub fn summarize_averages(rows: &[SubjectPeriods], passing_score: f64) -> AverageSummary {
    let subjects: Vec<SubjectAverage> = rows
        .iter()
        .map(|row| {
            let average = period_average(&row.totals());
            SubjectAverage {
                subject_id: row.subject_id,
                subject: row.subject.clone(),
                periods: row.periods,
                average,
                passed: average.map(|avg| avg >= passing_score),
            }
        })
        .collect();

    let averages: Vec<f64> = subjects.iter().filter_map(|s| s.average).collect();

    AverageSummary {
        overall_average: mean(&averages).map(round_to_cents),
        passed_count: subjects.iter().filter(|s| s.passed == Some(true)).count(),
        failed_count: subjects.iter().filter(|s| s.passed == Some(false)).count(),
        total_subjects: rows.len(),
        subjects,
    }
}

/// Mode B row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectAccumulation {
    pub subject_id: Uuid,
    pub subject: String,
    /// Raw period totals on the 0-100 scale
    pub totals: [Option<f64>; PERIODS_PER_CYCLE],
    /// Weighted points earned so far, 0-100
    pub cumulative: Option<f64>,
    pub passed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccumulatedReport {
    pub subjects: Vec<SubjectAccumulation>,
    /// Mean of the subject cumulatives; 0 when no subject has any
    pub overall_cumulative: f64,
}

/// Sum of (total / 100) * points_per_period over the occupied periods
pub fn cumulative_score(totals: &[Option<f64>], points_per_period: f64) -> Option<f64> {
    let present: Vec<f64> = totals.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    let points: f64 = present.iter().map(|t| (t / 100.0) * points_per_period).sum();
    Some(round_to_cents(points))
}

pub fn accumulate(
    rows: &[SubjectPeriods],
    policy: &GradingPolicy,
    passing_score: f64,
) -> AccumulatedReport {
    let subjects: Vec<SubjectAccumulation> = rows
        .iter()
        .map(|row| {
            let totals = row.totals();
            let cumulative = cumulative_score(&totals, policy.points_per_period);
            SubjectAccumulation {
                subject_id: row.subject_id,
                subject: row.subject.clone(),
                totals,
                cumulative,
                passed: cumulative.map(|c| c >= passing_score),
            }
        })
        .collect();

    let cumulatives: Vec<f64> = subjects.iter().filter_map(|s| s.cumulative).collect();
    let overall_cumulative = mean(&cumulatives).map(round_to_cents).unwrap_or(0.0);

    AccumulatedReport {
        subjects,
        overall_cumulative,
    }
}
