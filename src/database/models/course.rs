use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::EducationStage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub stage: EducationStage,
    /// Grade code such as PRIMERO_BASICO
    pub grade_level: String,
    pub section: String,
    /// MATUTINA or VESPERTINA
    pub shift: String,
    pub cycle: i32,
    pub active: bool,
}

impl Course {
    /// Human readable grade: underscores become spaces and each word starts upper-case
    pub fn grade_label(&self) -> String {
        if self.grade_level.trim().is_empty() {
            return "Sin grado".to_string();
        }
        self.grade_level
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
