use schemars::JsonSchema;
use near_sdk::{
    borsh::{self, BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    env, AccountId};
use crate::models::traits::{
    Storable, StorageError, StorageMetrics,
    Ownable, OwnershipError, contains_control_characters};
use crate::models::config::{storage::*, text::*};
use crate::models::date;

pub type TaskId = String;

// === Core Enums ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, PartialEq, Clone, Copy, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

// === Error Hierarchy ===
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum TaskError {
    Validation(TaskValidationError),
    Storage(StorageError),
    Access(OwnershipError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum TaskValidationError {
    Name {
        reason: TaskNameError,
        current_length: usize,
    },
    Date {
        reason: TaskDateError,
        provided_date: String,
    },
    Points {
        reason: TaskPointsError,
        provided_points: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum TaskNameError {
    Empty,
    TooLong,
    InvalidCharacters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum TaskDateError {
    InvalidFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum TaskPointsError {
    Zero,
}

// === Error Conversions ===
impl From<TaskValidationError> for TaskError {
    fn from(err: TaskValidationError) -> Self {
        TaskError::Validation(err)
    }
}

impl From<StorageError> for TaskError {
    fn from(err: StorageError) -> Self {
        TaskError::Storage(err)
    }
}

impl From<OwnershipError> for TaskError {
    fn from(err: OwnershipError) -> Self {
        TaskError::Access(err)
    }
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(v) => write!(f, "Validation error: {:?}", v),
            Self::Storage(s) => write!(f, "Storage error: {:?}", s),
            Self::Access(a) => write!(f, "Access error: {:?}", a),
        }
    }
}

impl std::fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name { reason, current_length } => {
                write!(f, "Name validation error: {:?} (length: {})", reason, current_length)
            },
            Self::Date { reason, provided_date } => {
                write!(f, "Date validation error: {:?} (date: {})", reason, provided_date)
            },
            Self::Points { reason, provided_points } => {
                write!(f, "Points validation error: {:?} (points: {})", reason, provided_points)
            },
        }
    }
}

// === Core Data Structures ===

/// A one-shot dated checkbox. `completed`, `incomplete` and `failed` are
/// distinct flags the toggles keep mutually exclusive; `remember` archives a
/// snapshot into the owner's unique records on completion.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub date: String,
    pub completed: bool,
    #[serde(default)]
    pub incomplete: bool,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub remember: bool,
    /// Overrides the configured per-task point value when set; must be
    /// positive.
    pub custom_points: Option<u32>,
    pub priority: Option<Priority>,
    pub color: Option<String>,
    #[schemars(with = "String")]
    owner_id: AccountId,
}

// === Trait Definitions ===
pub trait TaskValidation {
    fn validate_name(&mut self) -> Result<(), TaskValidationError>;
    fn validate_date(&self) -> Result<(), TaskValidationError>;
    fn validate_points(&self) -> Result<(), TaskValidationError>;
}

// === Core Implementations ===
impl Task {
    pub fn new(
        name: String,
        date: String,
        remember: bool,
        custom_points: Option<u32>,
        priority: Option<Priority>,
        color: Option<String>,
        owner_id: AccountId,
    ) -> Result<Self, TaskError> {
        let mut task = Self {
            id: format!("task-{}-{}", owner_id, env::block_timestamp()),
            name,
            date,
            completed: false,
            incomplete: false,
            failed: false,
            remember,
            custom_points,
            priority,
            color,
            owner_id,
        };

        task.validate()?;
        Ok(task)
    }

    pub fn validate(&mut self) -> Result<(), TaskError> {
        self.validate_name()
            .map_err(TaskError::Validation)?;
        self.validate_date()
            .map_err(TaskError::Validation)?;
        self.validate_points()
            .map_err(TaskError::Validation)?;
        self.validate_storage()
            .map_err(TaskError::Storage)?;
        Ok(())
    }

    /// Flips the completion flag. Returns the new state.
    pub fn toggle_completion(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    /// Flips the incomplete flag; marking a task incomplete clears its
    /// completion.
    pub fn toggle_incomplete(&mut self) -> bool {
        let was_incomplete = self.incomplete;
        self.incomplete = !self.incomplete;
        if !was_incomplete {
            self.completed = false;
        }
        self.incomplete
    }

    /// Flips the failure flag; a failed task is neither completed nor merely
    /// incomplete.
    pub fn toggle_failed(&mut self) -> bool {
        self.failed = !self.failed;
        if self.failed {
            self.completed = false;
            self.incomplete = false;
        }
        self.failed
    }
}

impl TaskValidation for Task {
    fn validate_name(&mut self) -> Result<(), TaskValidationError> {
        if self.name.is_empty() {
            return Err(TaskValidationError::Name {
                reason: TaskNameError::Empty,
                current_length: 0,
            });
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(TaskValidationError::Name {
                reason: TaskNameError::TooLong,
                current_length: self.name.len(),
            });
        }
        if contains_control_characters(&self.name) {
            return Err(TaskValidationError::Name {
                reason: TaskNameError::InvalidCharacters,
                current_length: self.name.len(),
            });
        }
        self.name = self.name.trim().to_string();
        Ok(())
    }

    fn validate_date(&self) -> Result<(), TaskValidationError> {
        if date::parse_date(&self.date).is_none() {
            return Err(TaskValidationError::Date {
                reason: TaskDateError::InvalidFormat,
                provided_date: self.date.clone(),
            });
        }
        Ok(())
    }

    fn validate_points(&self) -> Result<(), TaskValidationError> {
        if self.custom_points == Some(0) {
            return Err(TaskValidationError::Points {
                reason: TaskPointsError::Zero,
                provided_points: 0,
            });
        }
        Ok(())
    }
}

impl Ownable for Task {
    fn get_owner_id(&self) -> &AccountId {
        &self.owner_id
    }
}

impl Storable for Task {
    const BASE_STORAGE: u64 = TASK_BASE_STORAGE;
    const MAX_STORAGE: u64 = TASK_MAX_STORAGE;

    fn calculate_storage_metrics(&self) -> StorageMetrics {
        let dynamic_size =
            self.id.len() as u64 +
            self.name.len() as u64 +
            self.date.len() as u64 +
            self.color.as_ref().map_or(0, |c| c.len() as u64) +
            self.owner_id.to_string().len() as u64;

        StorageMetrics::from_dynamic_size(Self::BASE_STORAGE, dynamic_size)
    }
}
