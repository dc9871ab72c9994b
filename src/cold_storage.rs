//! Cold-storage classification.
//!
//! Source catalogues spell storage temperatures freely ("2-8°C", "+2 to +8 C",
//! "-20 °C"). Classification runs over a fixed table of known ranges; an
//! unrecognized string resolves to no classification (null reference in the
//! generated row) and is reported by the caller, never fatal.

/// A named cold-storage class as seeded in the `cold_storage_type` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColdStorageClass {
    /// Matches `cold_storage_type.name`.
    pub name: &'static str,
    pub min_celsius: i32,
    pub max_celsius: i32,
}

const CLASSES: [(ColdStorageClass, &[&str]); 3] = [
    (
        ColdStorageClass { name: "+5", min_celsius: 2, max_celsius: 8 },
        &["2-8", "+2-+8", "2to8", "+2to+8", "+5", "5"],
    ),
    (
        ColdStorageClass { name: "-20", min_celsius: -25, max_celsius: -15 },
        &["-20", "-15--25", "-25--15", "-15to-25", "-25to-15"],
    ),
    (
        ColdStorageClass { name: "-70", min_celsius: -80, max_celsius: -60 },
        &["-70", "-60--80", "-80--60", "-60to-80", "-80to-60"],
    ),
];

/// Classify a raw temperature string against the fixed range table.
///
/// Normalization: lowercase, drop whitespace and degree/unit decoration, map
/// en-dashes to hyphens. Returns `None` for anything that does not match a
/// known spelling.
pub fn classify(raw: &str) -> Option<ColdStorageClass> {
    let token = normalize(raw);
    if token.is_empty() {
        return None;
    }
    for (class, spellings) in CLASSES.iter() {
        if spellings.contains(&token.as_str()) {
            return Some(*class);
        }
    }
    None
}

fn normalize(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut chars = lowered.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '°' | 'º' | ' ' | '\t' => {}
            '–' | '—' => out.push('-'),
            // unit suffix, but keep "c" inside words like "to"
            'c' if chars.peek().map_or(true, |n| !n.is_alphanumeric()) => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_to_eight_is_plus_five() {
        assert_eq!(classify("2-8°C").unwrap().name, "+5");
        assert_eq!(classify("+2 to +8 C").unwrap().name, "+5");
        assert_eq!(classify("2 – 8 °C").unwrap().name, "+5");
    }

    #[test]
    fn minus_twenty() {
        assert_eq!(classify("-20°C").unwrap().name, "-20");
        assert_eq!(classify("-15 to -25 C").unwrap().name, "-20");
    }

    #[test]
    fn ultra_cold() {
        assert_eq!(classify("-70 °C").unwrap().name, "-70");
    }

    #[test]
    fn unrecognized_maps_to_none() {
        assert!(classify("10°C").is_none());
        assert!(classify("room temperature").is_none());
        assert!(classify("").is_none());
    }
}
