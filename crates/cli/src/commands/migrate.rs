//! Migration commands - create, list, up, down
//!
//! Thin wrappers around the engine: each command builds its context from
//! the resolved [`Settings`] and reports line-oriented text on stdout.

use sediment_core::{MigrationManager, MigrationResult, MigrationRollback, MigrationRunner};

use crate::config::Settings;

/// Create a new timestamped migration file
pub async fn create(settings: &Settings, name: &str) -> MigrationResult<()> {
    let manager = MigrationManager::with_config(settings.migration_config());
    let filename = manager.create_migration(name)?;
    println!("created migration: {}", filename);
    Ok(())
}

/// Print the on-disk migration list, annotating applied entries when a
/// database URL is configured
pub async fn list(settings: &Settings) -> MigrationResult<()> {
    let manager = MigrationManager::with_config(settings.migration_config());

    let entries: Vec<(String, bool)> = match settings.url.as_deref() {
        Some(url) => {
            let runner = MigrationRunner::from_url(manager, url).await?;
            runner
                .status()
                .await?
                .into_iter()
                .map(|(m, applied)| (m.name, applied))
                .collect()
        }
        None => manager
            .load_migrations()?
            .into_iter()
            .map(|m| (m.name, false))
            .collect(),
    };

    if entries.is_empty() {
        println!("no migrations found");
        return Ok(());
    }

    println!("Migrations:");
    println!();
    for (index, (name, applied)) in entries.iter().enumerate() {
        if *applied {
            println!("[{}] {} - applied", index, name);
        } else {
            println!("[{}] {}", index, name);
        }
    }

    Ok(())
}

/// Apply all pending migrations
pub async fn up(settings: &Settings) -> MigrationResult<()> {
    let url = settings.require_url()?;
    let manager = MigrationManager::with_config(settings.migration_config());
    let runner = MigrationRunner::from_url(manager, url).await?;

    let report = runner.apply_pending().await?;
    if report.applied.is_empty() {
        println!(
            "nothing to apply ({} already applied)",
            report.skipped_count
        );
    }

    Ok(())
}

/// Roll back all applied migrations, last-applied first
pub async fn down(settings: &Settings) -> MigrationResult<()> {
    let url = settings.require_url()?;
    let manager = MigrationManager::with_config(settings.migration_config());
    let runner = MigrationRunner::from_url(manager, url).await?;

    let report = runner.rollback_applied().await?;
    if report.rolled_back.is_empty() && report.failed_count == 0 {
        println!("nothing to roll back");
    }
    if report.failed_count > 0 {
        println!("{} rollback step(s) failed, see log", report.failed_count);
    }

    Ok(())
}
