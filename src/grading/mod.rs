//! Grade computation: score normalization, per-subject aggregation, the two
//! accumulation modes and class statistics. Everything here is pure and takes
//! its numeric rules from an explicit `GradingPolicy`.

pub mod accumulation;
pub mod aggregator;
pub mod error;
pub mod normalizer;
pub mod policy;
pub mod statistics;

pub use accumulation::{
    accumulate, cumulative_score, summarize_averages, AccumulatedReport, AverageSummary,
    SubjectAccumulation, SubjectAverage,
};
pub use aggregator::{aggregate_by_subject, collation_cmp, PeriodScore, SubjectPeriods};
pub use error::{FieldErrors, GradeError, Validator};
pub use normalizer::GradeEdit;
pub use policy::{round_to_cents, round_to_whole, GradingPolicy};
pub use statistics::{
    build_roster_grid, period_statistics, ClassStatistics, PeriodStatistics, RosterGrid, RosterRow,
};
