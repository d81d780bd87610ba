//! Migration Manager - File system operations for migrations
//!
//! Handles creating migration files and loading the ordered migration
//! sequence from the configured directory.

use chrono::Utc;
use std::fs;
use std::path::Path;

use super::definitions::{Migration, MigrationConfig};
use super::parser;
use crate::error::{MigrationError, MigrationResult};

/// Template written into newly created migration files
const MIGRATION_TEMPLATE: &str = "-- up --\n-- up --\n-- down --\n-- down --\n";

/// Migration manager for creating and loading migrations
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Create a new migration file and return its filename.
    ///
    /// The filename carries a 17-digit millisecond timestamp prefix so that
    /// lexical order equals creation order. The file body is the empty
    /// four-marker template.
    pub fn create_migration(&self, name: &str) -> MigrationResult<String> {
        fs::create_dir_all(&self.config.migrations_dir).map_err(|e| {
            MigrationError::FileSystem(format!("failed to create migrations directory: {}", e))
        })?;

        let timestamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
        let filename = format!("{}_{}.sql", timestamp, name);
        let filepath = self.config.migrations_dir.join(&filename);

        fs::write(&filepath, MIGRATION_TEMPLATE).map_err(|e| {
            MigrationError::FileSystem(format!(
                "failed to write migration file {}: {}",
                filepath.display(),
                e
            ))
        })?;

        Ok(filename)
    }

    /// Load all migrations from the migrations directory, in apply order.
    ///
    /// Every directory entry is treated as a migration file; an unreadable
    /// entry is fatal. The sequence is sorted by filename, which the
    /// timestamp prefix makes chronological. Apply and rollback both depend
    /// on this ordering.
    pub fn load_migrations(&self) -> MigrationResult<Vec<Migration>> {
        let entries = fs::read_dir(&self.config.migrations_dir).map_err(|_| {
            MigrationError::DirectoryNotFound {
                path: self.config.migrations_dir.clone(),
            }
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                MigrationError::FileSystem(format!("failed to read directory entry: {}", e))
            })?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        let mut migrations = Vec::with_capacity(names.len());
        for name in names {
            migrations.push(self.load_migration(&name)?);
        }

        tracing::debug!(count = migrations.len(), "loaded migration sequence");
        Ok(migrations)
    }

    /// Load and parse a single migration file by its base filename.
    fn load_migration(&self, name: &str) -> MigrationResult<Migration> {
        let path = self.config.migrations_dir.join(name);
        let content = self.read_source(&path)?;
        let (up, down) = parser::parse_source(&content);

        Ok(Migration {
            name: name.to_string(),
            up,
            down,
        })
    }

    fn read_source(&self, path: &Path) -> MigrationResult<String> {
        fs::read_to_string(path).map_err(|e| {
            MigrationError::FileSystem(format!(
                "failed to read migration file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn manager_for(dir: &TempDir) -> MigrationManager {
        MigrationManager::with_config(MigrationConfig {
            migrations_dir: dir.path().to_path_buf(),
            ledger_table: "migrations".to_string(),
        })
    }

    #[test]
    fn test_create_migration_writes_template() {
        let dir = TempDir::new().unwrap();
        let manager = manager_for(&dir);

        let filename = manager.create_migration("init").unwrap();
        assert!(filename.ends_with("_init.sql"));

        // 17-digit timestamp prefix
        let prefix = filename.split('_').next().unwrap();
        assert_eq!(prefix.len(), 17);
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));

        let content = fs::read_to_string(dir.path().join(&filename)).unwrap();
        assert_eq!(content, MIGRATION_TEMPLATE);
    }

    #[test]
    fn test_create_migration_makes_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("db").join("migrations");
        let manager = MigrationManager::with_config(MigrationConfig {
            migrations_dir: nested.clone(),
            ledger_table: "migrations".to_string(),
        });

        manager.create_migration("init").unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_load_migrations_sorted_by_filename() {
        let dir = TempDir::new().unwrap();
        let manager = manager_for(&dir);

        // Written out of order on purpose
        fs::write(
            dir.path().join("20240102000000000_b.sql"),
            "-- up --\nSELECT 2;\n-- up --\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("20240101000000000_a.sql"),
            "-- up --\nSELECT 1;\n-- up --\n",
        )
        .unwrap();

        let migrations = manager.load_migrations().unwrap();
        let names: Vec<_> = migrations.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["20240101000000000_a.sql", "20240102000000000_b.sql"]
        );
        assert_eq!(migrations[0].up, "SELECT 1;");
    }

    #[test]
    fn test_name_is_base_filename_with_extension() {
        let dir = TempDir::new().unwrap();
        let manager = manager_for(&dir);
        fs::write(dir.path().join("001_init.sql"), MIGRATION_TEMPLATE).unwrap();

        let migrations = manager.load_migrations().unwrap();
        assert_eq!(migrations[0].name, "001_init.sql");
    }

    #[test]
    fn test_missing_directory_is_directory_not_found() {
        let manager = MigrationManager::with_config(MigrationConfig {
            migrations_dir: PathBuf::from("/nonexistent/sediment-test"),
            ledger_table: "migrations".to_string(),
        });

        match manager.load_migrations() {
            Err(MigrationError::DirectoryNotFound { path }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/sediment-test"));
            }
            other => panic!("expected DirectoryNotFound, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn test_empty_directory_loads_empty_sequence() {
        let dir = TempDir::new().unwrap();
        let manager = manager_for(&dir);
        assert!(manager.load_migrations().unwrap().is_empty());
    }
}
