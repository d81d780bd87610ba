//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the fundamental types used throughout the migration system
//! including Migration, MigrationRecord, and MigrationConfig.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed migration change-set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    /// Base filename of the migration file, acts as the unique identifier
    pub name: String,
    /// SQL executed on apply (may be empty)
    pub up: String,
    /// SQL executed on rollback (may be empty)
    pub down: String,
}

/// A persisted ledger entry for an applied migration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Row id, assigned by the database
    pub id: i32,
    /// Checksum-derived version tag, unique per migration name
    pub version: String,
    /// Migration name, matches [`Migration::name`]
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Directory where migration files are stored
    pub migrations_dir: PathBuf,
    /// Table name for tracking applied migrations
    pub ledger_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            ledger_table: "migrations".to_string(),
        }
    }
}

/// Result of an apply run
#[derive(Debug)]
pub struct ApplyReport {
    /// Names of migrations that were applied, in order
    pub applied: Vec<String>,
    /// Number of migrations already present in the ledger
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Result of a rollback run
#[derive(Debug)]
pub struct RollbackReport {
    /// Names of migrations that were rolled back, in order
    pub rolled_back: Vec<String>,
    /// Number of steps that failed and were abandoned
    pub failed_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Compute the version tag for a migration name.
///
/// CRC32 (IEEE) over the name's bytes, rendered in decimal. The ledger
/// enforces uniqueness on this value.
pub fn version_tag(name: &str) -> String {
    crc32fast::hash(name.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_tag_is_crc32_ieee() {
        // 0xCBF43926 is the standard CRC32 check value for "123456789"
        assert_eq!(version_tag("123456789"), "3421780262");
    }

    #[test]
    fn test_version_tag_deterministic() {
        assert_eq!(
            version_tag("20240101000000000_init.sql"),
            version_tag("20240101000000000_init.sql")
        );
        assert_ne!(
            version_tag("20240101000000000_init.sql"),
            version_tag("20240102000000000_users.sql")
        );
    }
}
