use schemars::JsonSchema;
use near_sdk::{
    borsh::{self, BorshDeserialize, BorshSerialize},
    serde::{Deserialize, Serialize},
    env, AccountId};
use crate::models::traits::{
    Storable, StorageError, StorageMetrics,
    Ownable, OwnershipError, contains_control_characters};
use crate::models::config::{storage::*, text::*};
use crate::models::project::ProjectId;

pub type NoteId = String;

// === Core Enums ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, PartialEq, Clone, Copy, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    General,
    Unique,
    Project,
}

// === Error Hierarchy ===
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum NoteError {
    Validation(NoteValidationError),
    Storage(StorageError),
    Access(OwnershipError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum NoteValidationError {
    Title {
        reason: NoteTitleError,
        current_length: usize,
    },
    Content {
        reason: NoteContentError,
        current_length: usize,
    },
    Category {
        reason: NoteCategoryError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum NoteTitleError {
    Empty,
    TooLong,
    InvalidCharacters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum NoteContentError {
    TooLong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "near_sdk::serde")]
pub enum NoteCategoryError {
    MissingProject,
}

// === Error Conversions ===
impl From<NoteValidationError> for NoteError {
    fn from(err: NoteValidationError) -> Self {
        NoteError::Validation(err)
    }
}

impl From<StorageError> for NoteError {
    fn from(err: StorageError) -> Self {
        NoteError::Storage(err)
    }
}

impl From<OwnershipError> for NoteError {
    fn from(err: OwnershipError) -> Self {
        NoteError::Access(err)
    }
}

impl std::fmt::Display for NoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(v) => write!(f, "Validation error: {:?}", v),
            Self::Storage(s) => write!(f, "Storage error: {:?}", s),
            Self::Access(a) => write!(f, "Access error: {:?}", a),
        }
    }
}

impl std::fmt::Display for NoteValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Title { reason, current_length } => {
                write!(f, "Title validation error: {:?} (length: {})", reason, current_length)
            },
            Self::Content { reason, current_length } => {
                write!(f, "Content validation error: {:?} (length: {})", reason, current_length)
            },
            Self::Category { reason } => {
                write!(f, "Category validation error: {:?}", reason)
            },
        }
    }
}

// === Core Data Structures ===
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub category: NoteCategory,
    /// Required for `Project` notes; such notes are removed with the project.
    pub project_id: Option<ProjectId>,
    pub color: Option<String>,
    pub created_at: u64,
    pub updated_at: u64,
    #[schemars(with = "String")]
    owner_id: AccountId,
}

// === Trait Definitions ===
pub trait NoteValidation {
    fn validate_title(&mut self) -> Result<(), NoteValidationError>;
    fn validate_content(&self) -> Result<(), NoteValidationError>;
    fn validate_category(&self) -> Result<(), NoteValidationError>;
}

// === Core Implementations ===
impl Note {
    pub fn new(
        title: String,
        content: String,
        category: NoteCategory,
        project_id: Option<ProjectId>,
        color: Option<String>,
        owner_id: AccountId,
    ) -> Result<Self, NoteError> {
        let now = env::block_timestamp();

        let mut note = Self {
            id: format!("note-{}-{}", owner_id, now),
            title,
            content,
            category,
            project_id,
            color,
            created_at: now,
            updated_at: now,
            owner_id,
        };

        note.validate()?;
        Ok(note)
    }

    pub fn validate(&mut self) -> Result<(), NoteError> {
        self.validate_title()
            .map_err(NoteError::Validation)?;
        self.validate_content()
            .map_err(NoteError::Validation)?;
        self.validate_category()
            .map_err(NoteError::Validation)?;
        self.validate_storage()
            .map_err(NoteError::Storage)?;
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = env::block_timestamp();
    }
}

impl NoteValidation for Note {
    fn validate_title(&mut self) -> Result<(), NoteValidationError> {
        if self.title.is_empty() {
            return Err(NoteValidationError::Title {
                reason: NoteTitleError::Empty,
                current_length: 0,
            });
        }
        if self.title.len() > MAX_NAME_LENGTH {
            return Err(NoteValidationError::Title {
                reason: NoteTitleError::TooLong,
                current_length: self.title.len(),
            });
        }
        if contains_control_characters(&self.title) {
            return Err(NoteValidationError::Title {
                reason: NoteTitleError::InvalidCharacters,
                current_length: self.title.len(),
            });
        }
        self.title = self.title.trim().to_string();
        Ok(())
    }

    fn validate_content(&self) -> Result<(), NoteValidationError> {
        if self.content.len() > MAX_NOTE_CONTENT_LENGTH {
            return Err(NoteValidationError::Content {
                reason: NoteContentError::TooLong,
                current_length: self.content.len(),
            });
        }
        Ok(())
    }

    fn validate_category(&self) -> Result<(), NoteValidationError> {
        if self.category == NoteCategory::Project && self.project_id.is_none() {
            return Err(NoteValidationError::Category {
                reason: NoteCategoryError::MissingProject,
            });
        }
        Ok(())
    }
}

impl Ownable for Note {
    fn get_owner_id(&self) -> &AccountId {
        &self.owner_id
    }
}

impl Storable for Note {
    const BASE_STORAGE: u64 = NOTE_BASE_STORAGE;
    const MAX_STORAGE: u64 = NOTE_MAX_STORAGE;

    fn calculate_storage_metrics(&self) -> StorageMetrics {
        let dynamic_size =
            self.id.len() as u64 +
            self.title.len() as u64 +
            self.content.len() as u64 +
            self.project_id.as_ref().map_or(0, |id| id.len() as u64) +
            self.color.as_ref().map_or(0, |c| c.len() as u64) +
            self.owner_id.to_string().len() as u64;

        StorageMetrics::from_dynamic_size(Self::BASE_STORAGE, dynamic_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use near_sdk::test_utils::{accounts, VMContextBuilder};
    use near_sdk::testing_env;

    fn setup() {
        let mut builder = VMContextBuilder::new();
        builder
            .current_account_id(accounts(0))
            .predecessor_account_id(accounts(1));
        testing_env!(builder.build());
    }

    #[test]
    fn project_note_requires_project_id() {
        setup();
        let result = Note::new(
            "Retro".to_string(),
            "Went fine".to_string(),
            NoteCategory::Project,
            None,
            None,
            accounts(1),
        );
        assert!(matches!(
            result,
            Err(NoteError::Validation(NoteValidationError::Category {
                reason: NoteCategoryError::MissingProject,
            }))
        ));
    }

    #[test]
    fn general_note_needs_no_project() {
        setup();
        let note = Note::new(
            "Ideas".to_string(),
            String::new(),
            NoteCategory::General,
            None,
            Some("#8b5cf6".to_string()),
            accounts(1),
        ).unwrap();
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn oversized_content_rejected() {
        setup();
        let result = Note::new(
            "Log".to_string(),
            "x".repeat(MAX_NOTE_CONTENT_LENGTH + 1),
            NoteCategory::General,
            None,
            None,
            accounts(1),
        );
        assert!(matches!(
            result,
            Err(NoteError::Validation(NoteValidationError::Content { .. }))
        ));
    }
}
