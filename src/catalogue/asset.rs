//! Asset catalogue and asset-location CSV contracts.

use super::{field, optional_field, HeaderIndex};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// One asset catalogue source row: the class/category/type hierarchy plus the
/// catalogue item itself.
#[derive(Debug, Clone)]
pub struct AssetRow {
    pub class: String,
    pub category: String,
    pub type_name: String,
    pub code: String,
    pub model: String,
    pub manufacturer: Option<String>,
}

pub fn read_rows(path: &Path) -> Result<Vec<AssetRow>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    parse_rows(BufReader::new(file)).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<AssetRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let index = HeaderIndex::new(rdr.headers()?.clone());
    let idx_class = index.require("Class")?;
    let idx_category = index.require("Category")?;
    let idx_type = index.require("Type")?;
    let idx_code = index.require("Code")?;
    let idx_model = index.require("Model")?;
    let idx_manufacturer = index.optional("Manufacturer");

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("csv row {}", line + 2))?;
        let manufacturer = optional_field(&record, idx_manufacturer);
        rows.push(AssetRow {
            class: field(&record, idx_class).to_string(),
            category: field(&record, idx_category).to_string(),
            type_name: field(&record, idx_type).to_string(),
            code: field(&record, idx_code).to_string(),
            model: field(&record, idx_model).to_string(),
            manufacturer: (!manufacturer.is_empty()).then(|| manufacturer.to_string()),
        });
    }
    Ok(rows)
}

/// One asset-to-location assignment row for the direct-database command.
#[derive(Debug, Clone)]
pub struct AssetLocationRow {
    pub asset_number: String,
    pub location_code: String,
    pub location_name: Option<String>,
}

pub fn read_location_rows(path: &Path) -> Result<Vec<AssetLocationRow>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    parse_location_rows(BufReader::new(file)).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_location_rows<R: Read>(reader: R) -> Result<Vec<AssetLocationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let index = HeaderIndex::new(rdr.headers()?.clone());
    let idx_asset = index.require("AssetNumber")?;
    let idx_code = index.require("LocationCode")?;
    let idx_name = index.optional("LocationName");

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("csv row {}", line + 2))?;
        let name = optional_field(&record, idx_name);
        rows.push(AssetLocationRow {
            asset_number: field(&record, idx_asset).to_string(),
            location_code: field(&record, idx_code).to_string(),
            location_name: (!name.is_empty()).then(|| name.to_string()),
        });
    }
    Ok(rows)
}
