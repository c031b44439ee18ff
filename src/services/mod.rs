pub mod grade_service;

pub use grade_service::{
    GradePage, GradeService, GradeServiceConfig, ListGrades, RegisterGrade, StudentSummary, Transcript,
};
