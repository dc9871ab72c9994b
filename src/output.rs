//! Output paths: generated SQL file or direct execution.
//!
//! Both consume the same `RecordStatements`, so the file an operator applies
//! by hand and a direct run against the database produce the same rows. The
//! changelog entry is conditional on the creation actually inserting in both
//! forms: the file fuses the pair into a CTE, the direct path gates on
//! `rows_affected`.

use crate::db::Db;
use crate::statement::{RecordStatements, SqlParam, SqlStatement};
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Postgres, Transaction};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Write every record as an idempotent CTE statement, one per record.
pub fn write_sql_file(path: &Path, records: &[RecordStatements]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(
        out,
        "-- generated by catseed at {}; safe to re-apply",
        Utc::now().to_rfc3339()
    )?;
    for rec in records {
        writeln!(out)?;
        writeln!(out, "{}", rec.render_cte())?;
    }
    out.flush()?;
    info!(path = %path.display(), statements = records.len(), "sql file written");
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplySummary {
    /// Records whose creation statement inserted a row (changelog emitted).
    pub inserted: usize,
    /// Records already present (conflict no-op, no changelog).
    pub noop: usize,
    /// Records rolled back and skipped after a write failure.
    pub failed: usize,
}

/// Apply records directly, one transaction per record so a failure rolls back
/// only that record and processing continues.
pub async fn apply_records(
    db: &Db,
    records: &[RecordStatements],
    dry_run: bool,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();

    for rec in records {
        if dry_run {
            info!(table = rec.insert.table, id = %rec.record_id, sql = %rec.insert.render_literal(), "dry-run: would apply");
            summary.inserted += 1;
            continue;
        }

        match apply_one(db, rec).await {
            Ok(true) => summary.inserted += 1,
            Ok(false) => summary.noop += 1,
            Err(err) => {
                warn!(table = rec.insert.table, id = %rec.record_id, error = %err, "record failed, skipping");
                summary.failed += 1;
            }
        }
    }

    info!(
        inserted = summary.inserted,
        noop = summary.noop,
        failed = summary.failed,
        dry_run,
        "apply complete"
    );
    Ok(summary)
}

async fn apply_one(db: &Db, rec: &RecordStatements) -> Result<bool> {
    let mut tx = db.pool.begin().await?;
    let affected = execute_statement(&mut tx, &rec.insert).await?;
    if affected > 0 {
        execute_statement(&mut tx, &rec.changelog()).await?;
    }
    tx.commit().await?;
    Ok(affected > 0)
}

/// Execute one statement with its parameters bound, returning rows affected.
pub(crate) async fn execute_statement(
    tx: &mut Transaction<'_, Postgres>,
    stmt: &SqlStatement,
) -> Result<u64> {
    let mut query = sqlx::query(&stmt.sql).persistent(false);
    for param in &stmt.params {
        query = match param {
            SqlParam::Text(s) => query.bind(s.as_str()),
            SqlParam::Int(i) => query.bind(*i),
            SqlParam::Float(f) => query.bind(*f),
            SqlParam::Bool(b) => query.bind(*b),
        };
    }
    let result = query.execute(&mut **tx).await?;
    Ok(result.rows_affected())
}
