use std::collections::BTreeMap;
use thiserror::Error;

use crate::database::StoreError;
use crate::transcript::RenderError;

/// Field name -> problem description
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum GradeError {
    /// Malformed or out-of-range input, raised before any store access
    #[error("Validation failed: {}", describe(.0))]
    Validation(FieldErrors),

    /// No active enrollment backs the requested write
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Duplicate grade: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Edit attempted on a soft-deleted record
    #[error("Inactive record: {0}")]
    Inactive(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl GradeError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.into());
        GradeError::Validation(errors)
    }
}

fn describe(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects field problems so a request reports all of them at once
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn finish(self) -> Result<(), GradeError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(GradeError::Validation(self.errors))
        }
    }
}
