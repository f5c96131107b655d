//! The result-flattening engine.
//!
//! A [`ResultSet`] wraps the metadata of one fetched result page together
//! with the canonicalization cache for that hit set. [`ResultSet::flatten`]
//! walks a classified result tree and produces one flat record per logical
//! data row, applying the category's duplication policy and concatenating
//! repeated values.

use std::sync::Arc;

use crate::cache::CanonCache;
use crate::category::{find_result_category, DupMode};
use crate::labels::FieldLabels;
use crate::record::FlatRecord;
use crate::tree::Element;

/// Top level data types; parents of all other data types. A record's main
/// element is its first direct child carrying one of these tags.
pub const TOP_LEVEL_TAGS: [&str; 8] = ["RX", "RY", "IDE", "CIT", "DAT", "TARGET", "SUPL", "DATIDS"];

/// Separates multiple values within one field. Consumers reverse-parse on
/// this, so it must match exactly.
pub const MULTIPLE_VALUE_SEPARATOR: &str = "|";

/// Label marking citation sub-structure, which is always expanded inline.
const CITATION_MARKER: &str = "citation";

/// Labels containing this never concatenate repeats; registry numbers are
/// re-assertions, not additional values.
const REGISTRY_NUMBER_MARKER: &str = "Reaxys Registry Number";

/// How one child element is handled during node parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    /// Record the element's text as a field.
    LeafField,
    /// Citation sub-structure: recurse instead of recording a leaf.
    CitationExpansion,
    /// Repeated sub-field group (DAT01, IDE02, CIT, citation…): recurse.
    SubfieldGroupExpansion,
}

/// Classify a child element by its raw tag and resolved label.
pub fn classify_tag(tag: &str, label: &str) -> TagClass {
    if label == CITATION_MARKER {
        return TagClass::CitationExpansion;
    }
    if tag == "CIT" || tag.starts_with(CITATION_MARKER) || is_subfield_group(tag) {
        return TagClass::SubfieldGroupExpansion;
    }
    TagClass::LeafField
}

/// Two to four uppercase letters, then the digit 0, then one more digit,
/// then anything: the shape of numbered sub-field groups like DAT01.
fn is_subfield_group(tag: &str) -> bool {
    let bytes = tag.as_bytes();
    for prefix in 2..=4 {
        if bytes.len() < prefix + 2 {
            break;
        }
        if bytes[..prefix].iter().all(u8::is_ascii_uppercase)
            && bytes[prefix] == b'0'
            && bytes[prefix + 1].is_ascii_digit()
        {
            return true;
        }
    }
    false
}

/// True when any selection specifier carries a parenthesized argument list,
/// i.e. the caller asked for multi-valued facts rather than plain fields.
pub fn requests_facts<'a, I>(select_items: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    select_items.into_iter().any(|item| item.contains('('))
}

/// Fact detection against a result tree, which echoes the originating
/// query's selection list.
pub fn find_facts(doc: &Element) -> bool {
    doc.elements_by_tag("select_item")
        .iter()
        .any(|item| item.text_content().contains('('))
}

/// One fetched result page: status, hit set identity, declared size, the
/// output-format flag, and the canonicalization cache shared by every
/// flatten call against this page.
#[derive(Debug)]
pub struct ResultSet {
    status: String,
    result_name: String,
    dbname: String,
    size: u64,
    sd_v3: bool,
    cache: CanonCache,
}

impl ResultSet {
    /// Build from a fresh response tree. `sd_v3` selects the structure
    /// format variant requested downstream; it does not affect flattening.
    pub fn from_response(doc: &Element, sd_v3: bool) -> Self {
        ResultSet {
            status: result_status(doc),
            result_name: first_text_or_empty(doc, "resultname"),
            dbname: first_text_or_empty(doc, "dbname"),
            size: parse_size(doc),
            sd_v3,
            cache: CanonCache::new(),
        }
    }

    /// Build from the next page of the same hit set: database name and the
    /// format flag carry over, everything else is re-read from the new tree.
    pub fn next_page(&self, doc: &Element) -> Self {
        ResultSet {
            status: result_status(doc),
            result_name: first_text_or_empty(doc, "resultname"),
            dbname: self.dbname.clone(),
            size: parse_size(doc),
            sd_v3: self.sd_v3,
            cache: CanonCache::new(),
        }
    }

    /// Declared number of hits in this result set.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn result_name(&self) -> &str {
        &self.result_name
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    pub fn sd_v3(&self) -> bool {
        self.sd_v3
    }

    /// Distinct strings held by the canonicalization cache.
    pub fn canon_entries(&self) -> usize {
        self.cache.len()
    }

    /// Flatten every category record in the tree into flat records.
    ///
    /// Returns an empty sequence for a tree with no recognizable category;
    /// absence of results is not a failure. Malformed records (no top-level
    /// main element) are skipped.
    pub fn flatten(&mut self, doc: &Element, labels: &dyn FieldLabels) -> Vec<FlatRecord> {
        let mut out = Vec::new();
        let Some(category) = find_result_category(doc) else {
            return out;
        };
        let looking_for_facts = find_facts(doc);
        let cache = &mut self.cache;

        for parent in doc.elements_by_tag(category.singular_tag()) {
            let Some(main) = parent
                .child_elements()
                .find(|child| TOP_LEVEL_TAGS.contains(&child.tag.as_str()))
            else {
                continue;
            };

            // RY-rooted records always merge, whatever the category says.
            let mut mode = category.dup_mode();
            if main.tag == "RY" {
                mode = DupMode::Merge;
            }

            let mut base = FlatRecord::new();
            parse_node(cache, labels, main, &mut base);

            let mut added_more = false;
            for child in parent.child_elements() {
                if std::ptr::eq(child, main) {
                    continue;
                }
                match mode {
                    DupMode::Duplicate => {
                        let mut copy = base.clone();
                        parse_node(cache, labels, child, &mut copy);
                        out.push(copy);
                    }
                    DupMode::Merge => {
                        parse_node(cache, labels, child, &mut base);
                    }
                }
                added_more = true;
            }

            // The base record goes out when siblings merged into it or when
            // there were no siblings at all, except that a bare parent is
            // withheld when facts were requested and none came back.
            if (mode == DupMode::Merge || !added_more) && !(!added_more && looking_for_facts) {
                out.push(base);
            }
        }

        out
    }
}

/// Recursively fold an element's children into `map` as label/value fields.
fn parse_node(
    cache: &mut CanonCache,
    labels: &dyn FieldLabels,
    root: &Element,
    map: &mut FlatRecord,
) {
    for child in root.child_elements() {
        let label = labels.resolve(child.tag.trim());

        // RY structures carry the reaction id on the rn attribute; surface
        // it under the RX.ID label even when the element is otherwise empty.
        if label.contains("RY.STR") {
            let rxid = child.attr("rn").unwrap_or("");
            map.insert(
                cache.canon(&labels.resolve("RX.ID")),
                cache.canon(rxid),
            );
        }

        if child.children.is_empty() {
            continue;
        }

        match classify_tag(&child.tag, &label) {
            TagClass::CitationExpansion | TagClass::SubfieldGroupExpansion => {
                parse_node(cache, labels, child, map);
            }
            TagClass::LeafField => {
                // Strip trailing whitespace only; leading and interior
                // whitespace is significant downstream.
                let mut value = child.text_content();
                value.truncate(value.trim_end().len());

                let merged = match map.get(&label) {
                    Some(existing)
                        if existing != value.as_str()
                            && !label.contains(REGISTRY_NUMBER_MARKER) =>
                    {
                        Some(format!("{existing}{MULTIPLE_VALUE_SEPARATOR}{value}"))
                    }
                    _ => None,
                };
                let stored = merged.unwrap_or(value);
                let label: Arc<str> = cache.canon(&label);
                map.insert(label, cache.canon(&stored));
            }
        }
    }
}

fn result_status(doc: &Element) -> String {
    doc.find("result")
        .and_then(|result| result.find("status"))
        .map(Element::text_content)
        .unwrap_or_default()
}

fn first_text_or_empty(doc: &Element, tag: &str) -> String {
    doc.first_text(tag).unwrap_or_default()
}

/// Declared result-set size; defaults to 0 when missing or unparseable.
fn parse_size(doc: &Element) -> u64 {
    doc.first_text("resultsize")
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or(0)
}
