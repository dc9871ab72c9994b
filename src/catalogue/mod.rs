//! CSV input contracts.
//!
//! Each catalogue type has a fixed, named-column header contract; a missing
//! required column is a hard input-format error raised before any row is
//! processed, so a bad file can never partially feed the pipeline.

pub mod asset;
pub mod vaccine;

use anyhow::{anyhow, Result};
use csv::StringRecord;

/// Header positions resolved once up front: every required column is located
/// (or the whole file rejected) before the first row is read.
pub(crate) struct HeaderIndex {
    headers: StringRecord,
}

impl HeaderIndex {
    pub(crate) fn new(headers: StringRecord) -> Self {
        Self { headers }
    }

    pub(crate) fn require(&self, name: &str) -> Result<usize> {
        self.position(name)
            .ok_or_else(|| anyhow!("{name} col missing"))
    }

    pub(crate) fn optional(&self, name: &str) -> Option<usize> {
        self.position(name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

pub(crate) fn field<'r>(record: &'r StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("").trim()
}

pub(crate) fn optional_field<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
    idx.map(|i| field(record, i)).unwrap_or("")
}

/// Volume-per-unit parsing: blank or unparseable input defaults to zero.
pub(crate) fn parse_volume(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_volume_defaults_to_zero() {
        assert_eq!(parse_volume(""), 0.0);
        assert_eq!(parse_volume("   "), 0.0);
        assert_eq!(parse_volume("n/a"), 0.0);
        assert_eq!(parse_volume("1.25"), 1.25);
    }

    #[test]
    fn header_lookup_trims_names() {
        let headers = StringRecord::from(vec!["ItemCode ", " DosesCount"]);
        let index = HeaderIndex::new(headers);
        assert!(index.require("ItemCode").is_ok());
        assert!(index.require("DosesCount").is_ok());
        assert!(index.require("Absent").is_err());
    }
}
