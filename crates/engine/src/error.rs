//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Storage`] thrown when the host storage refuses a write (full, read-only).
//! - [`KeyNotFound`] thrown when a record is not found.
//! - [`InsufficientStock`] thrown when a sale or a stock adjustment would oversell.
//! - [`LockedEntry`] thrown when a system-generated cash-flow entry is edited.
//!
//!  [`Storage`]: EngineError::Storage
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`LockedEntry`]: EngineError::LockedEntry
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("Locked entry: {0}")]
    LockedEntry(String),
    #[error("\"{0}\" already paid!")]
    AlreadyPaid(String),
    #[error("Invalid backup: {0}")]
    InvalidBackup(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` when the error comes from the host storage rather than
    /// from the request itself. The caller may retry these.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Storage(a), Self::Storage(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InsufficientStock(a), Self::InsufficientStock(b)) => a == b,
            (Self::LockedEntry(a), Self::LockedEntry(b)) => a == b,
            (Self::AlreadyPaid(a), Self::AlreadyPaid(b)) => a == b,
            (Self::InvalidBackup(a), Self::InvalidBackup(b)) => a == b,
            (Self::Serialization(a), Self::Serialization(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
