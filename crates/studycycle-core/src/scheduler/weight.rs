//! Scheduling weight from proficiency and focus strategy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::schedule::ProficiencyLevel;

/// How the scheduler trades balance against weak-subject emphasis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    /// Even exposure: least-used subject first.
    #[default]
    Balanced,
    Priority,
    Difficulty,
}

impl FocusMode {
    fn multiplier(self) -> f64 {
        match self {
            FocusMode::Balanced => 1.0,
            FocusMode::Priority => 1.5,
            FocusMode::Difficulty => 2.0,
        }
    }
}

impl FromStr for FocusMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(FocusMode::Balanced),
            "priority" => Ok(FocusMode::Priority),
            "difficulty" => Ok(FocusMode::Difficulty),
            other => Err(format!("unknown focus mode '{other}'")),
        }
    }
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FocusMode::Balanced => "balanced",
            FocusMode::Priority => "priority",
            FocusMode::Difficulty => "difficulty",
        };
        f.write_str(s)
    }
}

/// Relative scheduling mass for a subject.
pub fn subject_weight(level: ProficiencyLevel, mode: FocusMode) -> f64 {
    let base = match level {
        ProficiencyLevel::Beginner => 3.0,
        ProficiencyLevel::Intermediate => 2.0,
        ProficiencyLevel::Advanced => 1.0,
    };
    base * mode.multiplier()
}
