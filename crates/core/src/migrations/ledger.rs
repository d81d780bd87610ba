//! Applied-Migration Ledger - Reads and writes the tracking table
//!
//! The ledger is a single table recording which migrations have been
//! applied. All SQL touching that table lives here: idempotent DDL, the
//! ordered applied-set read, and the insert/delete pair that keeps the
//! ledger consistent with executed migrations.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::definitions::{version_tag, Migration, MigrationRecord};
use crate::error::{MigrationError, MigrationResult};

/// Handle on the migration-tracking table
pub struct Ledger {
    table: String,
}

impl Ledger {
    /// Create a ledger handle for the given table name
    pub fn new<T: Into<String>>(table: T) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Get the tracking table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the tracking table if it does not exist yet
    pub async fn ensure_table(&self, pool: &PgPool) -> MigrationResult<()> {
        sqlx::query(&self.create_table_sql())
            .execute(pool)
            .await
            .map_err(|e| MigrationError::Ddl(e.to_string()))?;
        Ok(())
    }

    /// Read the full applied set, ordered by ledger id.
    ///
    /// Id order is insertion order, which is apply order; rollback iterates
    /// the reverse of this sequence. The explicit ORDER BY is a correctness
    /// requirement, not a cosmetic choice.
    pub async fn applied(&self, pool: &PgPool) -> MigrationResult<Vec<MigrationRecord>> {
        let rows = sqlx::query(&self.select_applied_sql())
            .fetch_all(pool)
            .await
            .map_err(|e| MigrationError::Query(e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(Self::decode_record(&row)?);
        }
        Ok(records)
    }

    /// Insert a ledger record for an applied migration.
    ///
    /// Runs inside the caller's transaction so the record commits together
    /// with the migration's SQL.
    pub async fn record_applied(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        migration: &Migration,
    ) -> MigrationResult<()> {
        sqlx::query(&self.insert_sql())
            .bind(version_tag(&migration.name))
            .bind(&migration.name)
            .execute(&mut **tx)
            .await
            .map_err(|e| MigrationError::ledger_write(&migration.name, e.to_string()))?;
        Ok(())
    }

    /// Delete the ledger record for a rolled-back migration.
    pub async fn remove(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &MigrationRecord,
    ) -> MigrationResult<()> {
        sqlx::query(&self.delete_sql())
            .bind(record.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| MigrationError::ledger_write(&record.name, e.to_string()))?;
        Ok(())
    }

    fn decode_record(row: &PgRow) -> MigrationResult<MigrationRecord> {
        Ok(MigrationRecord {
            id: row
                .try_get("id")
                .map_err(|e| MigrationError::Query(format!("failed to decode id: {}", e)))?,
            version: row
                .try_get("version")
                .map_err(|e| MigrationError::Query(format!("failed to decode version: {}", e)))?,
            name: row
                .try_get("name")
                .map_err(|e| MigrationError::Query(format!("failed to decode name: {}", e)))?,
            applied_at: row.try_get("applied_at").map_err(|e| {
                MigrationError::Query(format!("failed to decode applied_at: {}", e))
            })?,
        })
    }

    fn create_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                id SERIAL PRIMARY KEY,\n    \
                version VARCHAR(50) NOT NULL UNIQUE,\n    \
                name VARCHAR(255) NOT NULL,\n    \
                applied_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP\n\
            )",
            self.table
        )
    }

    fn select_applied_sql(&self) -> String {
        format!(
            "SELECT id, version, name, applied_at FROM {} ORDER BY id",
            self.table
        )
    }

    fn insert_sql(&self) -> String {
        format!("INSERT INTO {} (version, name) VALUES ($1, $2)", self.table)
    }

    fn delete_sql(&self) -> String {
        format!("DELETE FROM {} WHERE id = $1", self.table)
    }
}
