use schemars::JsonSchema;
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::serde::{Deserialize, Serialize};

use crate::models::config::scoring::*;

// === Error Hierarchy ===
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum SettingsError {
    Validation(SettingsValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum SettingsValidationError {
    Thresholds {
        reason: ThresholdError,
        provided_count: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum ThresholdError {
    Empty,
    Zero,
    NotAscending,
}

impl From<SettingsValidationError> for SettingsError {
    fn from(err: SettingsValidationError) -> Self {
        SettingsError::Validation(err)
    }
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(v) => write!(f, "Validation error: {:?}", v),
        }
    }
}

impl std::fmt::Display for SettingsValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thresholds { reason, provided_count } => {
                write!(f, "Threshold validation error: {:?} (count: {})", reason, provided_count)
            }
        }
    }
}

// === Core Data Structures ===

/// Per-account scoring configuration.
///
/// Every field carries a serde default so settings persisted by an older
/// client (or supplied partially over JSON) fall back to the documented
/// values instead of failing deserialization.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, JsonSchema, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct ScoringSettings {
    #[serde(default = "default_points_per_habit")]
    pub points_per_habit: u32,
    #[serde(default = "default_points_per_task")]
    pub points_per_task: u32,
    #[serde(default = "default_points_per_project_stage")]
    pub points_per_project_stage: u32,
    #[serde(default = "default_level_thresholds")]
    pub level_thresholds: Vec<u32>,
}

fn default_points_per_habit() -> u32 {
    DEFAULT_POINTS_PER_HABIT
}

fn default_points_per_task() -> u32 {
    DEFAULT_POINTS_PER_TASK
}

fn default_points_per_project_stage() -> u32 {
    DEFAULT_POINTS_PER_PROJECT_STAGE
}

fn default_level_thresholds() -> Vec<u32> {
    DEFAULT_LEVEL_THRESHOLDS.to_vec()
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            points_per_habit: default_points_per_habit(),
            points_per_task: default_points_per_task(),
            points_per_project_stage: default_points_per_project_stage(),
            level_thresholds: default_level_thresholds(),
        }
    }
}

impl ScoringSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let count = self.level_thresholds.len();

        if count == 0 {
            return Err(SettingsValidationError::Thresholds {
                reason: ThresholdError::Empty,
                provided_count: count,
            }.into());
        }

        if self.level_thresholds.contains(&0) {
            return Err(SettingsValidationError::Thresholds {
                reason: ThresholdError::Zero,
                provided_count: count,
            }.into());
        }

        if self.level_thresholds.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(SettingsValidationError::Thresholds {
                reason: ThresholdError::NotAscending,
                provided_count: count,
            }.into());
        }

        Ok(())
    }

    /// Applies a partial update, leaving absent fields untouched.
    pub fn merge(
        &mut self,
        points_per_habit: Option<u32>,
        points_per_task: Option<u32>,
        points_per_project_stage: Option<u32>,
        level_thresholds: Option<Vec<u32>>,
    ) {
        if let Some(points) = points_per_habit {
            self.points_per_habit = points;
        }
        if let Some(points) = points_per_task {
            self.points_per_task = points;
        }
        if let Some(points) = points_per_project_stage {
            self.points_per_project_stage = points;
        }
        if let Some(thresholds) = level_thresholds {
            self.level_thresholds = thresholds;
        }
    }
}
