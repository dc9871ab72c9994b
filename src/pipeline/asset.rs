//! Asset catalogue row pipeline.
//!
//! Emits the class → category → type hierarchy before the catalogue item that
//! references it. Hierarchy rows are shared across many items, so each is
//! emitted at most once per run.

use crate::catalogue::asset::AssetRow;
use crate::identity::IdentityStore;
use crate::keys;
use crate::statement::{RecordStatements, SqlStatement, Value};
use anyhow::{Context, Result};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssetSummary {
    pub rows: usize,
    pub classes: usize,
    pub categories: usize,
    pub types: usize,
    pub catalogue_items: usize,
}

#[derive(Debug)]
pub struct AssetEmission {
    pub records: Vec<RecordStatements>,
    pub summary: AssetSummary,
}

pub fn emit(
    rows: &[AssetRow],
    ids: &mut IdentityStore,
    sub_catalogue: &str,
) -> Result<AssetEmission> {
    for (i, row) in rows.iter().enumerate() {
        keys::asset_item_key(&row.code).with_context(|| format!("row {}", i + 2))?;
    }

    let mut records = Vec::new();
    let mut summary = AssetSummary::default();
    let mut seen: HashSet<Uuid> = HashSet::new();

    for row in rows {
        summary.rows += 1;

        let class_id = ids.get_or_create(&keys::asset_class_key(&row.class));
        if seen.insert(class_id) {
            records.push(named_record("asset_class", class_id, &row.class, None));
            summary.classes += 1;
        }

        let category_id = ids.get_or_create(&keys::asset_category_key(&row.class, &row.category));
        if seen.insert(category_id) {
            records.push(named_record(
                "asset_category",
                category_id,
                &row.category,
                Some(("asset_class_id", class_id)),
            ));
            summary.categories += 1;
        }

        let type_id =
            ids.get_or_create(&keys::asset_type_key(&row.class, &row.category, &row.type_name));
        if seen.insert(type_id) {
            records.push(named_record(
                "asset_catalogue_type",
                type_id,
                &row.type_name,
                Some(("asset_category_id", category_id)),
            ));
            summary.types += 1;
        }

        let item_id = ids.get_or_create(&keys::asset_item_key(&row.code)?);
        if seen.insert(item_id) {
            records.push(catalogue_item_record(
                item_id,
                row,
                sub_catalogue,
                class_id,
                category_id,
                type_id,
            ));
            summary.catalogue_items += 1;
        }
    }

    Ok(AssetEmission { records, summary })
}

fn named_record(
    table: &'static str,
    id: Uuid,
    name: &str,
    parent: Option<(&'static str, Uuid)>,
) -> RecordStatements {
    let mut columns = vec![("id", Value::id(id)), ("name", Value::text(name))];
    if let Some((column, parent_id)) = parent {
        columns.push((column, Value::id(parent_id)));
    }
    RecordStatements::new(SqlStatement::insert(table, columns), id)
}

fn catalogue_item_record(
    id: Uuid,
    row: &AssetRow,
    sub_catalogue: &str,
    class_id: Uuid,
    category_id: Uuid,
    type_id: Uuid,
) -> RecordStatements {
    let manufacturer = match &row.manufacturer {
        Some(m) => Value::text(m),
        None => Value::Raw("NULL"),
    };
    let insert = SqlStatement::insert(
        "asset_catalogue_item",
        vec![
            ("id", Value::id(id)),
            ("code", Value::text(&row.code)),
            ("sub_catalogue", Value::text(sub_catalogue)),
            ("asset_class_id", Value::id(class_id)),
            ("asset_category_id", Value::id(category_id)),
            ("asset_catalogue_type_id", Value::id(type_id)),
            ("manufacturer", manufacturer),
            ("model", Value::text(&row.model)),
        ],
    );
    RecordStatements::new(insert, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::asset::parse_rows;

    const CSV: &str = "Class,Category,Type,Code,Model,Manufacturer\n\
        Cold chain equipment,Refrigerators and freezers,Freezer,E003/002,MF 114,Vestfrost\n\
        Cold chain equipment,Refrigerators and freezers,Ice-lined refrigerator,E003/010,MK 304,Vestfrost\n";

    #[test]
    fn hierarchy_emitted_once() {
        let rows = parse_rows(CSV.as_bytes()).unwrap();
        let mut ids = IdentityStore::default();
        let emission = emit(&rows, &mut ids, "General").unwrap();
        let s = &emission.summary;
        assert_eq!(s.classes, 1);
        assert_eq!(s.categories, 1);
        assert_eq!(s.types, 2);
        assert_eq!(s.catalogue_items, 2);
        // class + category + 2 types + 2 items
        assert_eq!(emission.records.len(), 6);
    }

    #[test]
    fn re_run_is_stable() {
        let rows = parse_rows(CSV.as_bytes()).unwrap();
        let mut ids = IdentityStore::default();
        let first = emit(&rows, &mut ids, "General").unwrap();
        let second = emit(&rows, &mut ids, "General").unwrap();
        for (a, b) in first.records.iter().zip(second.records.iter()) {
            assert_eq!(a.record_id, b.record_id);
        }
    }

    #[test]
    fn item_references_its_hierarchy() {
        let rows = parse_rows(CSV.as_bytes()).unwrap();
        let mut ids = IdentityStore::default();
        let emission = emit(&rows, &mut ids, "General").unwrap();
        let class_id = emission.records[0].record_id.to_string();
        let item = emission
            .records
            .iter()
            .find(|r| r.insert.table == "asset_catalogue_item")
            .unwrap();
        assert!(item.insert.render_literal().contains(&class_id));
    }
}
