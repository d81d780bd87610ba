//! Migration Runner - Reconciles on-disk migrations with the ledger
//!
//! The apply side of the engine: diffs the loaded migration sequence
//! against the applied ledger and executes every pending migration, in
//! on-disk order, inside a single batch transaction. Either the whole
//! batch commits or none of it does.

use std::collections::HashSet;
use std::time::Instant;

use sqlx::PgPool;

use super::definitions::{ApplyReport, Migration, MigrationRecord};
use super::ledger::Ledger;
use super::manager::MigrationManager;
use crate::error::{MigrationError, MigrationResult};

/// Migration runner that executes migrations against a database
pub struct MigrationRunner {
    manager: MigrationManager,
    ledger: Ledger,
    pool: PgPool,
}

impl MigrationRunner {
    /// Create a new migration runner over an open connection pool
    pub fn new(manager: MigrationManager, pool: PgPool) -> Self {
        let ledger = Ledger::new(manager.config().ledger_table.clone());
        Self {
            manager,
            ledger,
            pool,
        }
    }

    /// Create a new migration runner from a database URL
    pub async fn from_url(manager: MigrationManager, database_url: &str) -> MigrationResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| MigrationError::Connection(e.to_string()))?;

        Ok(Self::new(manager, pool))
    }

    /// Get the database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the migration manager
    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    /// Get the ledger handle
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply all pending migrations.
    ///
    /// A migration is pending when no ledger record shares its name.
    /// Pending migrations run in on-disk order inside one transaction; the
    /// first execution or ledger-write failure aborts and rolls back the
    /// entire batch. A migration with an empty up body is reported and
    /// skipped without a ledger write.
    pub async fn apply_pending(&self) -> MigrationResult<ApplyReport> {
        let start = Instant::now();

        self.ledger.ensure_table(&self.pool).await?;

        let all = self.manager.load_migrations()?;
        let applied = self.ledger.applied(&self.pool).await?;
        let pending = pending(&all, &applied);
        let skipped_count = all.len() - pending.len();

        if pending.is_empty() {
            return Ok(ApplyReport {
                applied: Vec::new(),
                skipped_count,
                execution_time_ms: start.elapsed().as_millis(),
            });
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| MigrationError::Transaction(format!("failed to begin: {}", e)))?;

        let mut applied_names = Vec::new();
        for migration in pending {
            if migration.up.is_empty() {
                println!("{} migration empty", migration.name);
                continue;
            }

            let step = Instant::now();
            println!("apply migration: {}", migration.name);

            // Bodies are opaque text; raw_sql executes them verbatim and
            // allows multiple statements per body. A failure here unwinds
            // the whole batch when the transaction drops uncommitted.
            sqlx::raw_sql(&migration.up)
                .execute(&mut *tx)
                .await
                .map_err(|e| MigrationError::execution(&migration.name, e.to_string()))?;

            self.ledger.record_applied(&mut tx, migration).await?;

            println!("migration applied in {}ms", step.elapsed().as_millis());
            applied_names.push(migration.name.clone());
        }

        tx.commit()
            .await
            .map_err(|e| MigrationError::Transaction(format!("failed to commit: {}", e)))?;

        println!("total applied in {}ms", start.elapsed().as_millis());

        Ok(ApplyReport {
            applied: applied_names,
            skipped_count,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }

    /// Get every on-disk migration paired with its applied flag, in
    /// on-disk order.
    pub async fn status(&self) -> MigrationResult<Vec<(Migration, bool)>> {
        self.ledger.ensure_table(&self.pool).await?;

        let all = self.manager.load_migrations()?;
        let applied = self.ledger.applied(&self.pool).await?;
        let applied_names: HashSet<&str> = applied.iter().map(|r| r.name.as_str()).collect();

        Ok(all
            .into_iter()
            .map(|m| {
                let is_applied = applied_names.contains(m.name.as_str());
                (m, is_applied)
            })
            .collect())
    }
}

/// Filter the migration sequence down to entries with no ledger record.
///
/// Pure reconciliation step, kept free of the database so it can be tested
/// against synthetic sequences. Preserves the input order.
pub fn pending<'a>(
    migrations: &'a [Migration],
    applied: &[MigrationRecord],
) -> Vec<&'a Migration> {
    let applied_names: HashSet<&str> = applied.iter().map(|r| r.name.as_str()).collect();

    migrations
        .iter()
        .filter(|m| !applied_names.contains(m.name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::definitions::version_tag;
    use chrono::Utc;

    fn migration(name: &str) -> Migration {
        Migration {
            name: name.to_string(),
            up: format!("-- sql for {}", name),
            down: String::new(),
        }
    }

    fn record(id: i32, name: &str) -> MigrationRecord {
        MigrationRecord {
            id,
            version: version_tag(name),
            name: name.to_string(),
            applied_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_excludes_applied_names() {
        let migrations = vec![migration("a.sql"), migration("b.sql"), migration("c.sql")];
        let applied = vec![record(1, "a.sql"), record(2, "c.sql")];

        let pending = pending(&migrations, &applied);
        let names: Vec<_> = pending.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b.sql"]);
    }

    #[test]
    fn test_pending_preserves_on_disk_order() {
        let migrations = vec![
            migration("20240101000000000_a.sql"),
            migration("20240102000000000_b.sql"),
            migration("20240103000000000_c.sql"),
        ];

        let pending = pending(&migrations, &[]);
        let names: Vec<_> = pending.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "20240101000000000_a.sql",
                "20240102000000000_b.sql",
                "20240103000000000_c.sql"
            ]
        );
    }

    #[test]
    fn test_fully_applied_sequence_has_no_pending() {
        let migrations = vec![migration("a.sql"), migration("b.sql")];
        let applied = vec![record(1, "a.sql"), record(2, "b.sql")];
        assert!(pending(&migrations, &applied).is_empty());
    }

    #[test]
    fn test_ledger_record_without_file_does_not_affect_pending() {
        let migrations = vec![migration("a.sql")];
        let applied = vec![record(1, "deleted.sql")];

        let pending = pending(&migrations, &applied);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "a.sql");
    }
}
