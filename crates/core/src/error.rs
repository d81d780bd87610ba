//! Error types for the migration engine
//!
//! Every fallible engine operation returns [`MigrationResult`]; the binary
//! decides what a failure means for the process. The engine itself never
//! terminates the process.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Error types for migration operations
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Required setting is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Migrations directory cannot be listed
    #[error("Migrations directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },

    /// Migration file cannot be read or written
    #[error("Filesystem error: {0}")]
    FileSystem(String),

    /// Database connection cannot be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// Ledger table creation failed
    #[error("Failed to create ledger table: {0}")]
    Ddl(String),

    /// Ledger read failed
    #[error("Ledger query failed: {0}")]
    Query(String),

    /// A migration's SQL failed to execute
    #[error("Migration '{name}' failed: {message}")]
    Execution { name: String, message: String },

    /// Ledger insert or delete failed
    #[error("Ledger write failed for '{name}': {message}")]
    LedgerWrite { name: String, message: String },

    /// Transaction could not be started or committed
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl MigrationError {
    /// Create an execution error for a named migration
    pub fn execution<T: Into<String>>(name: &str, message: T) -> Self {
        MigrationError::Execution {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Create a ledger-write error for a named migration
    pub fn ledger_write<T: Into<String>>(name: &str, message: T) -> Self {
        MigrationError::LedgerWrite {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
