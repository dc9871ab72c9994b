//! Lookup-key derivation.
//!
//! Every generated record is keyed by a stable composite string; the identity
//! store then maps that key to a UUID. Keys must be derivable from the source
//! row alone so two runs over the same input agree, and a row without any
//! usable identifying field must fail fast rather than guess (a guessed key
//! would mint duplicate catalogue entries across re-runs).

use anyhow::{bail, Result};
use uuid::Uuid;

/// Physical packaging tier of a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagingLevel {
    Primary,
    Secondary,
    Tertiary,
}

impl PackagingLevel {
    pub const ALL: [PackagingLevel; 3] = [
        PackagingLevel::Primary,
        PackagingLevel::Secondary,
        PackagingLevel::Tertiary,
    ];

    pub fn as_i32(self) -> i32 {
        match self {
            PackagingLevel::Primary => 1,
            PackagingLevel::Secondary => 2,
            PackagingLevel::Tertiary => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PackagingLevel::Primary => "Primary",
            PackagingLevel::Secondary => "Secondary",
            PackagingLevel::Tertiary => "Tertiary",
        }
    }
}

/// Item key: the item code verbatim. A blank code has no fallback, so it is a
/// hard input error.
pub fn item_key(item_code: &str) -> Result<String> {
    let code = item_code.trim();
    if code.is_empty() {
        bail!("row has no item code; refusing to derive an identifier");
    }
    Ok(code.to_string())
}

/// Variant key: the designated row identifier when present, otherwise a
/// composite fallback so two rows describing the same logical variant
/// collapse to one key even without an explicit id.
pub fn variant_key(
    vaccine_id: Option<&str>,
    type_name: &str,
    commercial_name: &str,
    doses: i32,
) -> String {
    if let Some(id) = vaccine_id {
        let id = id.trim();
        if !id.is_empty() {
            return id.to_string();
        }
    }
    format!("novacid:{}|{}|{}", type_name.trim(), commercial_name.trim(), doses)
}

pub fn diluent_item_key(item_key: &str) -> String {
    format!("{item_key}_diluent")
}

pub fn diluent_variant_key(variant_key: &str) -> String {
    format!("{variant_key}_diluent")
}

pub fn bundle_key(variant_key: &str) -> String {
    format!("{variant_key}_bundle")
}

pub fn packaging_key(variant_key: &str, level: PackagingLevel) -> String {
    format!("{variant_key}_packaging_{}", level.as_i32())
}

pub fn diluent_packaging_key(variant_key: &str, level: PackagingLevel) -> String {
    format!("{variant_key}_dil_packaging_{}", level.as_i32())
}

// Asset catalogue keys are namespaced by entity kind since class/category/type
// names are only unique within their parent.

pub fn asset_class_key(class: &str) -> String {
    format!("asset_class:{}", class.trim())
}

pub fn asset_category_key(class: &str, category: &str) -> String {
    format!("asset_category:{}/{}", class.trim(), category.trim())
}

pub fn asset_type_key(class: &str, category: &str, type_name: &str) -> String {
    format!(
        "asset_type:{}/{}/{}",
        class.trim(),
        category.trim(),
        type_name.trim()
    )
}

pub fn asset_item_key(code: &str) -> Result<String> {
    let code = code.trim();
    if code.is_empty() {
        bail!("asset catalogue row has no code; refusing to derive an identifier");
    }
    Ok(format!("asset_item:{code}"))
}

pub fn location_key(store_id: &str, code: &str) -> String {
    format!("location:{store_id}/{code}")
}

pub fn asset_location_key(asset_id: &str, location_id: Uuid) -> String {
    format!("asset_location:{asset_id}/{location_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_key_is_code_verbatim() {
        assert_eq!(item_key(" BCG01 ").unwrap(), "BCG01");
    }

    #[test]
    fn blank_item_code_fails_fast() {
        assert!(item_key("   ").is_err());
    }

    #[test]
    fn explicit_vaccine_id_wins() {
        let key = variant_key(Some("PQS-271"), "BCG", "BCG Vax", 10);
        assert_eq!(key, "PQS-271");
    }

    #[test]
    fn fallback_key_collapses_equal_rows() {
        let a = variant_key(None, "BCG", "BCG Vax", 10);
        let b = variant_key(Some("  "), " BCG ", "BCG Vax ", 10);
        assert_eq!(a, b);
        assert_eq!(a, "novacid:BCG|BCG Vax|10");
    }

    #[test]
    fn suffix_rules() {
        assert_eq!(diluent_variant_key("PQS-271"), "PQS-271_diluent");
        assert_eq!(bundle_key("PQS-271"), "PQS-271_bundle");
        assert_eq!(
            packaging_key("PQS-271", PackagingLevel::Secondary),
            "PQS-271_packaging_2"
        );
        assert_eq!(
            diluent_packaging_key("PQS-271", PackagingLevel::Tertiary),
            "PQS-271_dil_packaging_3"
        );
    }

    #[test]
    fn asset_location_key_pairs_asset_and_location() {
        let location_id = Uuid::new_v4();
        assert_eq!(
            asset_location_key("asset-9", location_id),
            format!("asset_location:asset-9/{location_id}")
        );
    }
}
