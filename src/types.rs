/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of grading periods (bimestres) in a school cycle
pub const PERIODS_PER_CYCLE: usize = 4;

/// One of the four grading periods of a school cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Period(u8);

impl Period {
    pub const ALL: [Period; PERIODS_PER_CYCLE] = [Period(1), Period(2), Period(3), Period(4)];

    /// Returns None when `number` is outside 1..=4
    pub fn new(number: i64) -> Option<Self> {
        if (1..=PERIODS_PER_CYCLE as i64).contains(&number) {
            Some(Period(number as u8))
        } else {
            None
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based slot used by the per-subject period arrays
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u8> for Period {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Period::new(value as i64).ok_or_else(|| format!("period must be 1, 2, 3 or 4 (got {})", value))
    }
}

impl From<Period> for u8 {
    fn from(period: Period) -> Self {
        period.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User roles recognized by the authorization layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ADMIN_ROLE")]
    Admin,
    #[serde(rename = "COORDINADOR_ROLE")]
    Coordinator,
    #[serde(rename = "PROFESOR_ROLE")]
    Teacher,
    #[serde(rename = "PADRE_ROLE")]
    Parent,
    #[serde(rename = "ALUMNO_ROLE")]
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN_ROLE",
            Role::Coordinator => "COORDINADOR_ROLE",
            Role::Teacher => "PROFESOR_ROLE",
            Role::Parent => "PADRE_ROLE",
            Role::Student => "ALUMNO_ROLE",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN_ROLE" => Ok(Role::Admin),
            "COORDINADOR_ROLE" => Ok(Role::Coordinator),
            "PROFESOR_ROLE" => Ok(Role::Teacher),
            "PADRE_ROLE" => Ok(Role::Parent),
            "ALUMNO_ROLE" => Ok(Role::Student),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Education stage of a course. Determines the pass mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EducationStage {
    Preprimaria,
    Primaria,
    Basico,
    /// Upper secondary, the most advanced stage
    Diversificado,
}

impl EducationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EducationStage::Preprimaria => "PREPRIMARIA",
            EducationStage::Primaria => "PRIMARIA",
            EducationStage::Basico => "BASICO",
            EducationStage::Diversificado => "DIVERSIFICADO",
        }
    }

    pub fn is_upper_secondary(&self) -> bool {
        matches!(self, EducationStage::Diversificado)
    }
}

impl FromStr for EducationStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PREPRIMARIA" => Ok(EducationStage::Preprimaria),
            "PRIMARIA" => Ok(EducationStage::Primaria),
            "BASICO" => Ok(EducationStage::Basico),
            "DIVERSIFICADO" => Ok(EducationStage::Diversificado),
            other => Err(format!("unknown education stage: {}", other)),
        }
    }
}
