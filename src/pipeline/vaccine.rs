//! Vaccine catalogue row pipeline.
//!
//! Per row, records are emitted in a fixed dependency order: item (and its
//! item_link / master-list line) before variant, variant before its packaging
//! tiers, and the bundle link last, after both variants it references. The
//! order is load-bearing: a changelog-driven replay must always see a
//! referentially valid target for each entry.

use crate::catalogue::vaccine::VaccineRow;
use crate::cold_storage;
use crate::identity::IdentityStore;
use crate::keys::{self, PackagingLevel};
use crate::statement::{RecordStatements, SqlStatement, Value};
use anyhow::{Context, Result};
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VaccineSummary {
    pub rows: usize,
    pub items: usize,
    pub variants: usize,
    pub packaging_variants: usize,
    pub diluent_items: usize,
    pub diluent_variants: usize,
    pub diluent_packaging_variants: usize,
    pub bundles: usize,
    pub master_list_lines: usize,
}

#[derive(Debug)]
pub struct VaccineEmission {
    pub records: Vec<RecordStatements>,
    pub summary: VaccineSummary,
}

/// Run the full pipeline over parsed rows, resolving ids through the identity
/// store and emitting one `RecordStatements` per created record.
pub fn emit(
    rows: &[VaccineRow],
    ids: &mut IdentityStore,
    master_list_id: Option<&str>,
) -> Result<VaccineEmission> {
    // Pre-flight: every row must yield an item key before anything is minted,
    // so a bad file cannot leave the store half-grown.
    for (i, row) in rows.iter().enumerate() {
        keys::item_key(&row.item_code).with_context(|| format!("row {}", i + 2))?;
    }

    let mut records = Vec::new();
    let mut summary = VaccineSummary::default();
    // Multiple source rows can resolve to the same item id; emit it once per
    // run. Keyed by id, not lookup key, since distinct keys can't collide.
    let mut seen_items: HashSet<Uuid> = HashSet::new();
    let mut seen_diluent_items: HashSet<Uuid> = HashSet::new();

    for row in rows {
        summary.rows += 1;

        let item_key = keys::item_key(&row.item_code)?;
        let variant_key = keys::variant_key(
            row.vaccine_id.as_deref(),
            &row.type_name,
            &row.commercial_name,
            row.doses,
        );

        let item_id = ids.get_or_create(&item_key);
        let variant_id = ids.get_or_create(&variant_key);

        if seen_items.insert(item_id) {
            records.push(item_record(
                item_id,
                &row.type_name,
                &row.item_code,
                true,
                row.doses,
            ));
            records.push(item_link_record(item_id));
            summary.items += 1;

            if let Some(list_id) = master_list_id {
                let line_id = ids.get_or_create(&format!("{item_key}_master_list_line"));
                records.push(master_list_line_record(line_id, list_id, item_id));
                summary.master_list_lines += 1;
            }
        }

        let storage_class = cold_storage::classify(&row.storage_temperature);
        if storage_class.is_none() && !row.storage_temperature.trim().is_empty() {
            warn!(
                item_code = %row.item_code,
                temperature = %row.storage_temperature,
                "unrecognized storage temperature, variant left unclassified"
            );
        }

        records.push(variant_record(
            variant_id,
            &row.commercial_name,
            item_id,
            storage_class.map(|c| c.name.to_string()),
        ));
        summary.variants += 1;

        for level in PackagingLevel::ALL {
            let pack_id = ids.get_or_create(&keys::packaging_key(&variant_key, level));
            records.push(packaging_record(
                pack_id,
                variant_id,
                level,
                row.volumes[(level.as_i32() - 1) as usize],
            ));
            summary.packaging_variants += 1;
        }

        // Separate diluent records only when the supplier does not already
        // bundle the diluent with the principal presentation.
        if row.diluent_bundled {
            continue;
        }

        let diluent_item_key = keys::diluent_item_key(&item_key);
        let diluent_item_id = ids.get_or_create(&diluent_item_key);
        if seen_diluent_items.insert(diluent_item_id) {
            records.push(item_record(
                diluent_item_id,
                &format!("{} (Diluent)", row.type_name),
                &format!("{}D", row.item_code),
                false,
                0,
            ));
            records.push(item_link_record(diluent_item_id));
            summary.diluent_items += 1;
        }

        let diluent_variant_key = keys::diluent_variant_key(&variant_key);
        let diluent_variant_id = ids.get_or_create(&diluent_variant_key);
        records.push(variant_record(
            diluent_variant_id,
            &format!("{} (Diluent)", row.commercial_name),
            diluent_item_id,
            None,
        ));
        summary.diluent_variants += 1;

        for level in PackagingLevel::ALL {
            let pack_id = ids.get_or_create(&keys::diluent_packaging_key(&variant_key, level));
            records.push(packaging_record(
                pack_id,
                diluent_variant_id,
                level,
                row.diluent_volumes[(level.as_i32() - 1) as usize],
            ));
            summary.diluent_packaging_variants += 1;
        }

        let bundle_id = ids.get_or_create(&keys::bundle_key(&variant_key));
        records.push(bundle_record(bundle_id, variant_id, diluent_variant_id));
        summary.bundles += 1;
    }

    Ok(VaccineEmission { records, summary })
}

fn item_record(id: Uuid, name: &str, code: &str, is_vaccine: bool, doses: i32) -> RecordStatements {
    let insert = SqlStatement::insert(
        "item",
        vec![
            ("id", Value::id(id)),
            ("name", Value::text(name)),
            ("code", Value::text(code)),
            ("type", Value::Raw("'STOCK'")),
            ("default_pack_size", Value::Raw("1")),
            ("legacy_record", Value::Raw("''")),
            ("is_active", Value::bool(true)),
            ("is_vaccine", Value::bool(is_vaccine)),
            ("ven_category", Value::Raw("'NOT_ASSIGNED'")),
            ("vaccine_doses", Value::int(doses as i64)),
        ],
    );
    RecordStatements::new(insert, id)
}

// item_link shares the item's id, matching how upstream links item rows.
fn item_link_record(item_id: Uuid) -> RecordStatements {
    let insert = SqlStatement::insert(
        "item_link",
        vec![("id", Value::id(item_id)), ("item_id", Value::id(item_id))],
    );
    RecordStatements::new(insert, item_id)
}

fn master_list_line_record(id: Uuid, master_list_id: &str, item_id: Uuid) -> RecordStatements {
    let insert = SqlStatement::insert(
        "master_list_line",
        vec![
            ("id", Value::id(id)),
            ("master_list_id", Value::text(master_list_id)),
            ("item_link_id", Value::id(item_id)),
        ],
    );
    RecordStatements::new(insert, id)
}

fn variant_record(
    id: Uuid,
    name: &str,
    item_id: Uuid,
    cold_storage_name: Option<String>,
) -> RecordStatements {
    let insert = SqlStatement::insert(
        "item_variant",
        vec![
            ("id", Value::id(id)),
            ("name", Value::text(name)),
            ("item_link_id", Value::id(item_id)),
            (
                "cold_storage_type_id",
                Value::LookupByName { table: "cold_storage_type", name: cold_storage_name },
            ),
            ("created_datetime", Value::Raw("now()")),
        ],
    );
    RecordStatements::new(insert, id)
}

fn packaging_record(
    id: Uuid,
    variant_id: Uuid,
    level: PackagingLevel,
    volume_per_unit: f64,
) -> RecordStatements {
    let insert = SqlStatement::insert(
        "packaging_variant",
        vec![
            ("id", Value::id(id)),
            ("name", Value::text(level.label())),
            ("item_variant_id", Value::id(variant_id)),
            ("packaging_level", Value::int(level.as_i32() as i64)),
            ("volume_per_unit", Value::float(volume_per_unit)),
        ],
    );
    RecordStatements::new(insert, id)
}

fn bundle_record(id: Uuid, principal_variant_id: Uuid, bundled_variant_id: Uuid) -> RecordStatements {
    let insert = SqlStatement::insert(
        "bundled_item",
        vec![
            ("id", Value::id(id)),
            ("principal_item_variant_id", Value::id(principal_variant_id)),
            ("bundled_item_variant_id", Value::id(bundled_variant_id)),
            ("ratio", Value::float(1.0)),
        ],
    );
    RecordStatements::new(insert, id)
}
