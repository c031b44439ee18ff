use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Role;

/// Display-level identity of a user. Credentials never leave the auth layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub role: Role,
    /// Institutional student code, when the user is a student
    pub student_code: Option<String>,
    pub active: bool,
}

impl UserIdentity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname)
    }
}
