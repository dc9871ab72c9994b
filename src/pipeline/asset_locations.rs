//! Asset-to-location assignment, the direct-database command.
//!
//! For each CSV row the asset is looked up by number within the target store;
//! an unknown asset is a warning and a skip, not an abort. Location and link
//! rows are written inside one transaction per row so a failure rolls back
//! that row only. With `--dry-run` all read-side work still happens and the
//! intended writes are logged.

use crate::catalogue::asset::AssetLocationRow;
use crate::db::Db;
use crate::identity::IdentityStore;
use crate::keys;
use crate::output::execute_statement;
use crate::statement::{RecordStatements, SqlStatement, Value};
use anyhow::Result;
use sqlx::Row;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssetLocationSummary {
    pub linked: usize,
    pub skipped_missing_asset: usize,
    pub failed: usize,
}

pub async fn assign(
    db: &Db,
    rows: &[AssetLocationRow],
    ids: &mut IdentityStore,
    store_id: &str,
    dry_run: bool,
) -> Result<AssetLocationSummary> {
    let mut summary = AssetLocationSummary::default();

    for row in rows {
        let asset_id = match find_asset(db, &row.asset_number, store_id).await? {
            Some(id) => id,
            None => {
                warn!(
                    asset_number = %row.asset_number,
                    store_id,
                    "asset not found in store, skipping"
                );
                summary.skipped_missing_asset += 1;
                continue;
            }
        };

        let location_id = ids.get_or_create(&keys::location_key(store_id, &row.location_code));
        let link_id = ids.get_or_create(&keys::asset_location_key(&asset_id, location_id));

        let location = location_record(location_id, row, store_id);
        let link = link_record(link_id, &asset_id, location_id);

        if dry_run {
            info!(
                asset_number = %row.asset_number,
                location_code = %row.location_code,
                location_id = %location_id,
                "dry-run: would ensure location and link asset"
            );
            summary.linked += 1;
            continue;
        }

        match apply_row(db, &location, &link).await {
            Ok(()) => summary.linked += 1,
            Err(err) => {
                warn!(
                    asset_number = %row.asset_number,
                    location_code = %row.location_code,
                    error = %err,
                    "row failed, rolled back"
                );
                summary.failed += 1;
            }
        }
    }

    info!(
        linked = summary.linked,
        skipped = summary.skipped_missing_asset,
        failed = summary.failed,
        dry_run,
        "asset location assignment complete"
    );
    Ok(summary)
}

async fn find_asset(db: &Db, asset_number: &str, store_id: &str) -> Result<Option<String>> {
    let row = sqlx::query(
        "SELECT id FROM asset WHERE asset_number = $1 AND store_id = $2 AND deleted_datetime IS NULL",
    )
    .persistent(false)
    .bind(asset_number)
    .bind(store_id)
    .fetch_optional(&db.pool)
    .await?;
    Ok(row.map(|r| r.get("id")))
}

async fn apply_row(db: &Db, location: &RecordStatements, link: &RecordStatements) -> Result<()> {
    let mut tx = db.pool.begin().await?;
    for rec in [location, link] {
        let affected = execute_statement(&mut tx, &rec.insert).await?;
        if affected > 0 {
            execute_statement(&mut tx, &rec.changelog()).await?;
        }
    }
    tx.commit().await?;
    Ok(())
}

fn location_record(id: Uuid, row: &AssetLocationRow, store_id: &str) -> RecordStatements {
    let name = row
        .location_name
        .clone()
        .unwrap_or_else(|| row.location_code.clone());
    let insert = SqlStatement::insert(
        "location",
        vec![
            ("id", Value::id(id)),
            ("code", Value::text(&row.location_code)),
            ("name", Value::text(name)),
            ("on_hold", Value::bool(false)),
            ("store_id", Value::text(store_id)),
        ],
    );
    RecordStatements::new(insert, id)
}

fn link_record(id: Uuid, asset_id: &str, location_id: Uuid) -> RecordStatements {
    let insert = SqlStatement::insert(
        "asset_internal_location",
        vec![
            ("id", Value::id(id)),
            ("asset_id", Value::text(asset_id)),
            ("location_id", Value::id(location_id)),
        ],
    );
    RecordStatements::new(insert, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::asset::AssetLocationRow;

    fn sample_row() -> AssetLocationRow {
        AssetLocationRow {
            asset_number: "A-100".into(),
            location_code: "FRIDGE-1".into(),
            location_name: None,
        }
    }

    #[test]
    fn location_name_falls_back_to_code() {
        let rec = location_record(Uuid::new_v4(), &sample_row(), "store1");
        assert!(rec.insert.render_literal().contains("'FRIDGE-1', 'FRIDGE-1'"));
    }

    #[test]
    fn link_ids_are_store_scoped_and_stable() {
        let mut ids = IdentityStore::default();
        let a = ids.get_or_create(&keys::location_key("store1", "FRIDGE-1"));
        let b = ids.get_or_create(&keys::location_key("store2", "FRIDGE-1"));
        assert_ne!(a, b);
        assert_eq!(a, ids.get_or_create(&keys::location_key("store1", "FRIDGE-1")));
    }
}
