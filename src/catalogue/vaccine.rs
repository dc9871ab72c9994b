//! Vaccine catalogue CSV contract.

use super::{field, optional_field, parse_volume, HeaderIndex};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::warn;

/// One vaccine catalogue source row, already validated against the header
/// contract and with volumes defaulted.
#[derive(Debug, Clone)]
pub struct VaccineRow {
    pub item_code: String,
    /// Designated row identifier (PQS/vaccine id); empty means "use the
    /// composite fallback key".
    pub vaccine_id: Option<String>,
    pub type_name: String,
    pub commercial_name: String,
    pub doses: i32,
    /// True when the supplier already bundles the diluent, so no separate
    /// diluent records are wanted.
    pub diluent_bundled: bool,
    pub storage_temperature: String,
    /// Volume per unit at packaging levels 1..3.
    pub volumes: [f64; 3],
    pub diluent_volumes: [f64; 3],
}

const REQUIRED: [&str; 6] = [
    "ItemCode",
    "VaccineTypeName",
    "CommercialName",
    "DosesCount",
    "DiluentBundled",
    "VaccineStorageTemperature",
];

pub fn read_rows(path: &Path) -> Result<Vec<VaccineRow>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    parse_rows(BufReader::new(file)).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<VaccineRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let index = HeaderIndex::new(rdr.headers()?.clone());
    let idx_code = index.require(REQUIRED[0])?;
    let idx_type = index.require(REQUIRED[1])?;
    let idx_name = index.require(REQUIRED[2])?;
    let idx_doses = index.require(REQUIRED[3])?;
    let idx_bundled = index.require(REQUIRED[4])?;
    let idx_temp = index.require(REQUIRED[5])?;
    let idx_vaccine_id = index.optional("VaccineId");
    let idx_volumes = [
        index.optional("PrimaryVolumePerUnit"),
        index.optional("SecondaryVolumePerUnit"),
        index.optional("TertiaryVolumePerUnit"),
    ];
    let idx_dil_volumes = [
        index.optional("DiluentPrimaryVolumePerUnit"),
        index.optional("DiluentSecondaryVolumePerUnit"),
        index.optional("DiluentTertiaryVolumePerUnit"),
    ];

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("csv row {}", line + 2))?;

        let doses_raw = field(&record, idx_doses);
        let doses = match doses_raw.parse::<i32>() {
            Ok(n) if n >= 0 => n,
            _ => {
                warn!(row = line + 2, doses = doses_raw, "unparseable dose count, defaulting to 1");
                1
            }
        };

        let vaccine_id = optional_field(&record, idx_vaccine_id);
        rows.push(VaccineRow {
            item_code: field(&record, idx_code).to_string(),
            vaccine_id: (!vaccine_id.is_empty()).then(|| vaccine_id.to_string()),
            type_name: field(&record, idx_type).to_string(),
            commercial_name: field(&record, idx_name).to_string(),
            doses,
            diluent_bundled: parse_bundled(field(&record, idx_bundled)),
            storage_temperature: field(&record, idx_temp).to_string(),
            volumes: idx_volumes.map(|i| parse_volume(optional_field(&record, i))),
            diluent_volumes: idx_dil_volumes.map(|i| parse_volume(optional_field(&record, i))),
        });
    }
    Ok(rows)
}

// Only an explicit "No" creates separate diluent records; blank or unknown
// input is treated as already-bundled so a bad flag cannot mint extra rows.
fn parse_bundled(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "no" | "n" | "false" | "0"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ItemCode,VaccineTypeName,CommercialName,DosesCount,DiluentBundled,VaccineStorageTemperature,VaccineId,PrimaryVolumePerUnit";

    #[test]
    fn parses_a_full_row() {
        let csv = format!("{HEADER}\nBCG01,BCG,BCG Vax,10,No,2-8°C,PQS-271,1.5\n");
        let rows = parse_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.item_code, "BCG01");
        assert_eq!(row.vaccine_id.as_deref(), Some("PQS-271"));
        assert_eq!(row.doses, 10);
        assert!(!row.diluent_bundled);
        assert_eq!(row.volumes, [1.5, 0.0, 0.0]);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let csv = "ItemCode,CommercialName\nBCG01,BCG Vax\n";
        let err = parse_rows(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("col missing"));
    }

    #[test]
    fn blank_vaccine_id_becomes_none() {
        let csv = format!("{HEADER}\nBCG01,BCG,BCG Vax,10,Yes,2-8°C,,\n");
        let rows = parse_rows(csv.as_bytes()).unwrap();
        assert!(rows[0].vaccine_id.is_none());
        assert!(rows[0].diluent_bundled);
    }
}
