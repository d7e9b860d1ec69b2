//! Contract domain errors

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur in the contract domain
#[derive(Debug, Error)]
pub enum ContractError {
    /// Contract with the given number was not found
    #[error("Contract not found: {0}")]
    ContractNotFound(u32),

    /// Contract item with the given number was not found
    #[error("Contract item not found: {0}")]
    ItemNotFound(u32),

    /// A number was assigned twice
    #[error("Number already in use: {0}")]
    DuplicateNumber(u32),

    /// Invalid field value, with the offending field where known
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Cancelation requested for a date before the earliest reachable end
    #[error("Termination date must be on or after {earliest}, not {requested}")]
    CancelTooEarly {
        earliest: NaiveDate,
        requested: NaiveDate,
    },

    /// Accounting periods must divide a year evenly
    #[error("Accounting period must be one of 1, 3, 6, 12, not {0}")]
    InvalidAccountingPeriod(u8),
}

impl ContractError {
    pub fn validation(message: impl Into<String>) -> Self {
        ContractError::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        ContractError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}
