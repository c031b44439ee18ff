use uuid::Uuid;

use crate::error::ApiError;
use crate::types::Role;

/// Roles that may write grades
pub const GRADE_WRITERS: &[Role] = &[Role::Admin, Role::Teacher];
/// Roles that may browse grades across students
pub const STAFF: &[Role] = &[Role::Admin, Role::Coordinator, Role::Teacher];
pub const EVERYONE: &[Role] = &[
    Role::Admin,
    Role::Coordinator,
    Role::Teacher,
    Role::Parent,
    Role::Student,
];

pub fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_field(field, format!("Invalid UUID format: {}", raw)))
}

pub fn parse_number(field: &str, raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::invalid_field(field, format!("must be a whole number (got {})", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_path_values_become_field_errors() {
        let err = parse_uuid("id", "not-a-uuid").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(parse_number("cycle", " 2024 ").unwrap(), 2024);
        assert!(parse_number("cycle", "2024a").is_err());
    }
}
