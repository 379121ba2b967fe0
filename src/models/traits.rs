use near_sdk::{env, AccountId};
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::serde::{Deserialize, Serialize};
use schemars::JsonSchema;

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, JsonSchema,
    Clone, PartialEq, Debug)]
#[serde(crate = "near_sdk::serde")]
pub enum StorageError {
    InsufficientBalance { required: u128, available: u128 },
    ExceedsMaxSize { size: u64, max_allowed: u64 }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientBalance { required, available } => {
                write!(f, "Insufficient balance: required {}, available {}", required, available)
            },
            Self::ExceedsMaxSize { size, max_allowed } => {
                write!(f, "Exceeds max size: size {}, max allowed {}", size, max_allowed)
            }
        }
    }
}

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize,
    Debug, Clone, PartialEq, JsonSchema)]
#[serde(crate = "near_sdk::serde")]
pub struct StorageMetrics {
    pub base_size: u64,
    pub dynamic_size: u64,
    pub total_bytes: u64,
    pub cost_per_byte: u128,
    pub total_cost: u128,
}

impl StorageMetrics {
    pub fn from_dynamic_size(base_size: u64, dynamic_size: u64) -> Self {
        let total_bytes = base_size + dynamic_size;
        let cost_per_byte = env::storage_byte_cost().as_yoctonear();
        Self {
            base_size,
            dynamic_size,
            total_bytes,
            cost_per_byte,
            total_cost: cost_per_byte * total_bytes as u128,
        }
    }
}

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, JsonSchema,
    Debug, PartialEq, Clone)]
#[serde(crate = "near_sdk::serde")]
pub enum OwnershipError {
    NotOwner
}

impl std::fmt::Display for OwnershipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotOwner => write!(f, "Operation can only be performed by the owner")
        }
    }
}

pub trait Ownable {
    fn get_owner_id(&self) -> &AccountId;

    fn validate_ownership(&self) -> Result<(), OwnershipError> {
        if env::predecessor_account_id() != *self.get_owner_id() {
            return Err(OwnershipError::NotOwner);
        }
        Ok(())
    }
}

/// Control characters other than tab (0x09), line feed (0x0A), and carriage
/// return (0x0D) are prohibited in user-supplied text.
pub fn contains_control_characters(text: &str) -> bool {
    text.chars().any(|c| {
        let code = c as u32;
        (code <= 0x08) || (code >= 0x0B && code <= 0x0C) ||
        (code >= 0x0E && code <= 0x1F) || (code == 0x7F)
    })
}

pub trait Storable {
    const BASE_STORAGE: u64;
    const MAX_STORAGE: u64;

    fn calculate_storage_metrics(&self) -> StorageMetrics;

    fn validate_storage(&self) -> Result<(), StorageError> {
        let metrics = self.calculate_storage_metrics();

        if metrics.total_bytes > Self::MAX_STORAGE {
            return Err(StorageError::ExceedsMaxSize {
                size: metrics.total_bytes,
                max_allowed: Self::MAX_STORAGE,
            });
        }

        let available = env::account_balance().as_yoctonear();
        if available < metrics.total_cost {
            return Err(StorageError::InsufficientBalance {
                required: metrics.total_cost,
                available,
            });
        }

        Ok(())
    }
}
