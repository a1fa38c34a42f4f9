//! Error types shared across the waitlist crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaitlistError {
    /// Storage could not be opened, created or migrated. Fatal for the whole core.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A write violated a required-field constraint. Nothing was written.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Database error: {0}")]
    Database(String),

    /// The messaging collaborator failed. Absorbed by the notifier, never retried.
    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WaitlistError>;
