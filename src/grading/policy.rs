use serde::{Deserialize, Serialize};

use crate::types::EducationStage;

/// Numeric grading policy shared by every calculator.
///
/// The summary view and the transcript view both read their thresholds and
/// weights from here so the two aggregation modes cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingPolicy {
    /// Maximum classwork ("zona") points
    pub classwork_max: f64,
    /// Maximum exam points
    pub exam_max: f64,
    /// Points each period contributes to the cumulative score
    pub points_per_period: f64,
    /// Pass mark for every stage except upper secondary
    pub pass_mark: f64,
    /// Pass mark for upper secondary (DIVERSIFICADO)
    pub upper_secondary_pass_mark: f64,
    pub min_cycle: i32,
    pub max_cycle: i32,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            classwork_max: 60.0,
            exam_max: 40.0,
            points_per_period: 25.0,
            pass_mark: 60.0,
            upper_secondary_pass_mark: 70.0,
            min_cycle: 2020,
            max_cycle: 2100,
        }
    }
}

impl GradingPolicy {
    /// Passing score for a course at the given stage
    pub fn passing_score(&self, stage: EducationStage) -> f64 {
        if stage.is_upper_secondary() {
            self.upper_secondary_pass_mark
        } else {
            self.pass_mark
        }
    }

    /// Highest total a single grade record can reach
    pub fn max_total(&self) -> f64 {
        self.classwork_max + self.exam_max
    }

    pub fn cycle_in_range(&self, cycle: i64) -> bool {
        (self.min_cycle as i64..=self.max_cycle as i64).contains(&cycle)
    }
}

/// Two-decimal round-half-up on `value * 100`
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Whole-number round-half-up, used by the per-period class averages
pub fn round_to_whole(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Arithmetic mean, None for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
