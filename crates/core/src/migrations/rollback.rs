//! Migration Rollback - Reverses applied migrations
//!
//! The rollback side of the engine: walks the applied ledger in reverse
//! apply order and executes each migration's down body. Every step runs in
//! its own transaction and a failed step is logged and abandoned, so one
//! bad down body does not block reversal of the others.

use std::collections::HashMap;
use std::time::Instant;

use super::definitions::{Migration, MigrationRecord, RollbackReport};
use super::runner::MigrationRunner;
use crate::error::{MigrationError, MigrationResult};

/// Extension trait for MigrationRunner to add rollback functionality
pub trait MigrationRollback {
    /// Roll back every applied migration, last-applied first
    async fn rollback_applied(&self) -> MigrationResult<RollbackReport>;
}

impl MigrationRollback for MigrationRunner {
    async fn rollback_applied(&self) -> MigrationResult<RollbackReport> {
        let start = Instant::now();

        self.ledger().ensure_table(self.pool()).await?;

        let all = self.manager().load_migrations()?;
        let applied = self.ledger().applied(self.pool()).await?;
        let plan = rollback_plan(&all, &applied);

        let mut rolled_back = Vec::new();
        let mut failed_count = 0;

        for (record, migration) in plan {
            let migration = match migration {
                Some(m) => m,
                None => {
                    tracing::warn!(
                        name = %record.name,
                        "applied migration has no file on disk, skipping"
                    );
                    continue;
                }
            };

            if migration.down.is_empty() {
                println!("{} migration empty", migration.name);
                continue;
            }

            let step = Instant::now();
            println!("rollback migration: {}", migration.name);

            match self.rollback_step(migration, record).await {
                Ok(()) => {
                    println!("migration rolled back in {}ms", step.elapsed().as_millis());
                    rolled_back.push(migration.name.clone());
                }
                Err(e) => {
                    tracing::error!(name = %record.name, error = %e, "rollback step failed");
                    failed_count += 1;
                }
            }
        }

        println!("total rollback in {}ms", start.elapsed().as_millis());

        Ok(RollbackReport {
            rolled_back,
            failed_count,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }
}

impl MigrationRunner {
    /// Reverse a single migration: down body plus ledger delete, committed
    /// together in one transaction.
    async fn rollback_step(
        &self,
        migration: &Migration,
        record: &MigrationRecord,
    ) -> MigrationResult<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| MigrationError::Transaction(format!("failed to begin: {}", e)))?;

        sqlx::raw_sql(&migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| MigrationError::execution(&migration.name, e.to_string()))?;

        self.ledger().remove(&mut tx, record).await?;

        tx.commit()
            .await
            .map_err(|e| MigrationError::Transaction(format!("failed to commit: {}", e)))?;

        Ok(())
    }
}

/// Pair each applied record with its on-disk migration, in reverse apply
/// order (the ledger read is ordered by id, so reversing it walks
/// last-applied first). A record whose file has disappeared maps to `None`.
pub fn rollback_plan<'a>(
    migrations: &'a [Migration],
    applied: &'a [MigrationRecord],
) -> Vec<(&'a MigrationRecord, Option<&'a Migration>)> {
    let by_name: HashMap<&str, &Migration> =
        migrations.iter().map(|m| (m.name.as_str(), m)).collect();

    applied
        .iter()
        .rev()
        .map(|record| (record, by_name.get(record.name.as_str()).copied()))
        .collect()
}
