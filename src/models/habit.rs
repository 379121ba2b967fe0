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

pub type HabitId = String;

// === Core Enums ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, PartialEq, Clone, Copy, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
#[serde(rename_all = "lowercase")]
pub enum HabitFrequency {
    Daily,
    Weekly,
    Monthly,
}

/// One tracked calendar day. `completed` and `failed` are stored as two
/// independent flags; the toggles keep them exclusive, but readers must not
/// assume well-formed data upholds that.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct HabitHistoryEntry {
    pub date: String,
    pub completed: bool,
    #[serde(default)]
    pub failed: bool,
}

// === Error Hierarchy ===
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum HabitError {
    Validation(HabitValidationError),
    Storage(StorageError),
    Access(OwnershipError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum HabitValidationError {
    Name {
        reason: HabitNameError,
        current_length: usize,
    },
    Color {
        reason: HabitColorError,
        current_length: usize,
    },
    Date {
        reason: HabitDateError,
        provided_date: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum HabitNameError {
    Empty,
    TooLong,
    InvalidCharacters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum HabitColorError {
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum HabitDateError {
    InvalidFormat,
}

// === Error Conversions ===
impl From<HabitValidationError> for HabitError {
    fn from(err: HabitValidationError) -> Self {
        HabitError::Validation(err)
    }
}

impl From<StorageError> for HabitError {
    fn from(err: StorageError) -> Self {
        HabitError::Storage(err)
    }
}

impl From<OwnershipError> for HabitError {
    fn from(err: OwnershipError) -> Self {
        HabitError::Access(err)
    }
}

impl std::fmt::Display for HabitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(v) => write!(f, "Validation error: {:?}", v),
            Self::Storage(s) => write!(f, "Storage error: {:?}", s),
            Self::Access(a) => write!(f, "Access error: {:?}", a),
        }
    }
}

impl std::fmt::Display for HabitValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name { reason, current_length } => {
                write!(f, "Name validation error: {:?} (length: {})", reason, current_length)
            },
            Self::Color { reason, current_length } => {
                write!(f, "Color validation error: {:?} (length: {})", reason, current_length)
            },
            Self::Date { reason, provided_date } => {
                write!(f, "Date validation error: {:?} (date: {})", reason, provided_date)
            },
        }
    }
}

// === Core Data Structures ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub frequency: HabitFrequency,
    pub color: String,
    /// Insertion-ordered; at most one entry per date when the toggles are the
    /// only writers.
    pub history: Vec<HabitHistoryEntry>,
    #[schemars(with = "String")]
    owner_id: AccountId,
}

// === Trait Definitions ===
pub trait HabitValidation {
    fn validate_name(&mut self) -> Result<(), HabitValidationError>;
    fn validate_color(&self) -> Result<(), HabitValidationError>;
    fn validate_history(&self) -> Result<(), HabitValidationError>;
}

// === Core Implementations ===
impl Habit {
    /// Creates a habit with a single history entry for the current calendar
    /// day, marked incomplete.
    pub fn new(
        name: String,
        frequency: HabitFrequency,
        color: String,
        owner_id: AccountId,
    ) -> Result<Self, HabitError> {
        let today = date::format_date(date::epoch_day_from_timestamp(env::block_timestamp()));

        let mut habit = Self {
            id: format!("habit-{}-{}", owner_id, env::block_timestamp()),
            name,
            frequency,
            color,
            history: vec![HabitHistoryEntry {
                date: today,
                completed: false,
                failed: false,
            }],
            owner_id,
        };

        habit.validate()?;
        Ok(habit)
    }

    pub fn validate(&mut self) -> Result<(), HabitError> {
        self.validate_name()
            .map_err(HabitError::Validation)?;
        self.validate_color()
            .map_err(HabitError::Validation)?;
        self.validate_history()
            .map_err(HabitError::Validation)?;
        self.validate_storage()
            .map_err(HabitError::Storage)?;
        Ok(())
    }

    /// Flips the completion flag for `date`, creating the entry (completed)
    /// when the day has not been tracked yet. Returns the new state.
    pub fn toggle_completion(&mut self, date: &str) -> Result<bool, HabitError> {
        Self::validate_date(date)?;

        match self.history.iter_mut().find(|entry| entry.date == date) {
            Some(entry) => {
                entry.completed = !entry.completed;
                Ok(entry.completed)
            },
            None => {
                self.history.push(HabitHistoryEntry {
                    date: date.to_string(),
                    completed: true,
                    failed: false,
                });
                Ok(true)
            }
        }
    }

    /// Flips the failure flag for `date`. Marking a day failed clears its
    /// completion; clearing the failure leaves completion untouched.
    pub fn toggle_failed(&mut self, date: &str) -> Result<bool, HabitError> {
        Self::validate_date(date)?;

        match self.history.iter_mut().find(|entry| entry.date == date) {
            Some(entry) => {
                entry.failed = !entry.failed;
                if entry.failed {
                    entry.completed = false;
                }
                Ok(entry.failed)
            },
            None => {
                self.history.push(HabitHistoryEntry {
                    date: date.to_string(),
                    completed: false,
                    failed: true,
                });
                Ok(true)
            }
        }
    }

    fn validate_date(value: &str) -> Result<(), HabitError> {
        if date::parse_date(value).is_none() {
            return Err(HabitValidationError::Date {
                reason: HabitDateError::InvalidFormat,
                provided_date: value.to_string(),
            }.into());
        }
        Ok(())
    }
}

impl HabitValidation for Habit {
    fn validate_name(&mut self) -> Result<(), HabitValidationError> {
        if self.name.is_empty() {
            return Err(HabitValidationError::Name {
                reason: HabitNameError::Empty,
                current_length: 0,
            });
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(HabitValidationError::Name {
                reason: HabitNameError::TooLong,
                current_length: self.name.len(),
            });
        }
        if contains_control_characters(&self.name) {
            return Err(HabitValidationError::Name {
                reason: HabitNameError::InvalidCharacters,
                current_length: self.name.len(),
            });
        }
        self.name = self.name.trim().to_string();
        Ok(())
    }

    fn validate_color(&self) -> Result<(), HabitValidationError> {
        if self.color.len() > MAX_COLOR_LENGTH {
            return Err(HabitValidationError::Color {
                reason: HabitColorError::TooLong,
                current_length: self.color.len(),
            });
        }
        Ok(())
    }

    fn validate_history(&self) -> Result<(), HabitValidationError> {
        for entry in &self.history {
            if date::parse_date(&entry.date).is_none() {
                return Err(HabitValidationError::Date {
                    reason: HabitDateError::InvalidFormat,
                    provided_date: entry.date.clone(),
                });
            }
        }
        Ok(())
    }
}

impl Ownable for Habit {
    fn get_owner_id(&self) -> &AccountId {
        &self.owner_id
    }
}

impl Storable for Habit {
    const BASE_STORAGE: u64 = HABIT_BASE_STORAGE;
    const MAX_STORAGE: u64 = HABIT_MAX_STORAGE;

    fn calculate_storage_metrics(&self) -> StorageMetrics {
        let dynamic_size =
            self.id.len() as u64 +
            self.name.len() as u64 +
            self.color.len() as u64 +
            self.owner_id.to_string().len() as u64 +
            self.history.iter()
                .map(|entry| entry.date.len() as u64 + 2)
                .sum::<u64>();

        StorageMetrics::from_dynamic_size(Self::BASE_STORAGE, dynamic_size)
    }
}
