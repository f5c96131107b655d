//! Field label resolution and type associations.
//!
//! Both are collaborators of the flattener: the label resolver turns raw
//! field codes into the human-readable column names records are keyed by,
//! and the association lookup tells the query builder which sibling or
//! parent field groups to request alongside a field code.

use ahash::AHashMap;

/// Maps raw tag names to human-readable field labels.
///
/// Must be total: every tag resolves to some label, falling back to the tag
/// itself when unrecognized.
pub trait FieldLabels {
    fn resolve(&self, tag: &str) -> String;
}

/// Maps a field code plus database name to the field codes that should be
/// retrieved together with it.
pub trait TypeAssociations {
    /// Associated field codes, empty when the code has none.
    fn associated(&self, code: &str, dbname: &str) -> Vec<String>;
}

/// Built-in label table for the common field codes, with identity fallback
/// for everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLabels;

static LABEL_TABLE: &[(&str, &str)] = &[
    ("IDE.XRN", "Reaxys Registry Number"),
    ("RX.ID", "Reaction ID"),
    ("RX.RCT", "Reactant"),
    ("RX.PRO", "Product"),
    ("RX.NVAR", "Number of Reaction Details"),
    ("IDE.CN", "Chemical Name"),
    ("IDE.MF", "Molecular Formula"),
    ("CIT.AU", "Author"),
    ("CIT.JTS", "Journal Title"),
    ("CIT.PY", "Publication Year"),
    ("CIT.DOI", "DOI"),
    ("DAT.MVAL", "Measured Value"),
    ("DAT.UNIT", "Unit"),
];

impl FieldLabels for DefaultLabels {
    fn resolve(&self, tag: &str) -> String {
        LABEL_TABLE
            .iter()
            .find(|(code, _)| *code == tag)
            .map(|(_, label)| (*label).to_string())
            .unwrap_or_else(|| tag.to_string())
    }
}

/// Table-backed [`TypeAssociations`], keyed by (field code, database name).
#[derive(Debug, Default)]
pub struct AssociationTable {
    map: AHashMap<(String, String), Vec<String>>,
}

impl AssociationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: &str, dbname: &str, associated: &[&str]) {
        self.map.insert(
            (code.to_string(), dbname.to_string()),
            associated.iter().map(|s| s.to_string()).collect(),
        );
    }
}

impl TypeAssociations for AssociationTable {
    fn associated(&self, code: &str, dbname: &str) -> Vec<String> {
        self.map
            .get(&(code.to_string(), dbname.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve_to_labels() {
        assert_eq!(DefaultLabels.resolve("IDE.XRN"), "Reaxys Registry Number");
        assert_eq!(DefaultLabels.resolve("RX.ID"), "Reaction ID");
    }

    #[test]
    fn unknown_codes_fall_back_to_identity() {
        assert_eq!(DefaultLabels.resolve("RY.STR"), "RY.STR");
        assert_eq!(DefaultLabels.resolve("citation"), "citation");
    }

    #[test]
    fn association_lookup_is_keyed_by_code_and_database() {
        let mut table = AssociationTable::new();
        table.insert("DAT", "RX", &["IDE"]);
        assert_eq!(table.associated("DAT", "RX"), vec!["IDE".to_string()]);
        assert!(table.associated("DAT", "RS").is_empty());
        assert!(table.associated("CIT", "RX").is_empty());
    }
}
