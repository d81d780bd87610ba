//! CLI configuration - flag and file layering
//!
//! Settings come from two places: command-line flags and an optional TOML
//! configuration file. Flags win over file values; the ledger table name
//! falls back to a default. The resolved [`Settings`] struct is the single
//! context handed to every command - there is no ambient state.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use sediment_core::{MigrationConfig, MigrationError, MigrationResult};

/// Default ledger table name
pub const DEFAULT_TABLE: &str = "migrations";

/// Values readable from a TOML configuration file
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Migrations directory
    pub dir: Option<PathBuf>,
    /// Database connection URL
    pub url: Option<String>,
    /// Ledger table name
    pub table: Option<String>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> MigrationResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MigrationError::Configuration(format!(
                "cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            MigrationError::Configuration(format!(
                "cannot parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Resolved settings for one command invocation
#[derive(Debug, Clone)]
pub struct Settings {
    /// Migrations directory
    pub dir: PathBuf,
    /// Database connection URL, absent for offline listing
    pub url: Option<String>,
    /// Ledger table name
    pub table: String,
}

impl Settings {
    /// Merge command-line flags over file values and defaults.
    ///
    /// The migrations directory is required from one of the two sources;
    /// the URL stays optional here because `list` works without it.
    pub fn resolve(
        dir: Option<PathBuf>,
        url: Option<String>,
        table: Option<String>,
        file: FileConfig,
    ) -> MigrationResult<Self> {
        let dir = dir.or(file.dir).ok_or_else(|| {
            MigrationError::Configuration(
                "migrations directory is required (--dir or config file)".to_string(),
            )
        })?;

        Ok(Self {
            dir,
            url: url.or(file.url),
            table: table
                .or(file.table)
                .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        })
    }

    /// The connection URL, or a configuration error for commands that
    /// cannot run offline.
    pub fn require_url(&self) -> MigrationResult<&str> {
        self.url.as_deref().ok_or_else(|| {
            MigrationError::Configuration(
                "database URL is required (--url or config file)".to_string(),
            )
        })
    }

    /// Engine-side configuration derived from these settings
    pub fn migration_config(&self) -> MigrationConfig {
        MigrationConfig {
            migrations_dir: self.dir.clone(),
            ledger_table: self.table.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flags_win_over_file() {
        let file = FileConfig {
            dir: Some(PathBuf::from("/from/file")),
            url: Some("postgres://file".to_string()),
            table: Some("file_table".to_string()),
        };

        let settings = Settings::resolve(
            Some(PathBuf::from("/from/flag")),
            Some("postgres://flag".to_string()),
            Some("flag_table".to_string()),
            file,
        )
        .unwrap();

        assert_eq!(settings.dir, PathBuf::from("/from/flag"));
        assert_eq!(settings.url.as_deref(), Some("postgres://flag"));
        assert_eq!(settings.table, "flag_table");
    }

    #[test]
    fn test_file_fills_missing_flags() {
        let file = FileConfig {
            dir: Some(PathBuf::from("/from/file")),
            url: None,
            table: None,
        };

        let settings = Settings::resolve(None, None, None, file).unwrap();
        assert_eq!(settings.dir, PathBuf::from("/from/file"));
        assert!(settings.url.is_none());
        assert_eq!(settings.table, DEFAULT_TABLE);
    }

    #[test]
    fn test_missing_dir_is_configuration_error() {
        let err = Settings::resolve(None, None, None, FileConfig::default()).unwrap_err();
        assert!(matches!(err, MigrationError::Configuration(_)));
    }

    #[test]
    fn test_require_url_errors_when_absent() {
        let settings = Settings::resolve(
            Some(PathBuf::from("migrations")),
            None,
            None,
            FileConfig::default(),
        )
        .unwrap();

        assert!(matches!(
            settings.require_url(),
            Err(MigrationError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_file_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sediment.toml");
        fs::write(
            &path,
            "dir = \"db/migrations\"\nurl = \"postgres://localhost/app\"\ntable = \"schema_history\"\n",
        )
        .unwrap();

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.dir, Some(PathBuf::from("db/migrations")));
        assert_eq!(file.url.as_deref(), Some("postgres://localhost/app"));
        assert_eq!(file.table.as_deref(), Some("schema_history"));
    }

    #[test]
    fn test_unreadable_file_is_configuration_error() {
        let err = FileConfig::load(Path::new("/nonexistent/sediment.toml")).unwrap_err();
        assert!(matches!(err, MigrationError::Configuration(_)));
    }
}
