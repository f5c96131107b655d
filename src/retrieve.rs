//! Outbound retrieval query descriptors.
//!
//! A pure descriptor builder: no network I/O happens here. The descriptor
//! carries the selection items, the from-clause naming the hit set window,
//! and the structure-format options string.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{FlattenError, Result};
use crate::flatten::{ResultSet, TOP_LEVEL_TAGS};
use crate::labels::TypeAssociations;

/// Options strings select the structure format by naming the variant to
/// omit, not the one wanted. Surprising, but it is the wire contract.
pub const OPTIONS_OMIT_V2000: &str = "OMIT_CIT,OMIT_V2000,ISSUE_RXN=true";
pub const OPTIONS_OMIT_V3000: &str = "OMIT_CIT,OMIT_V3000,ISSUE_RXN=true";

/// Hit set window addressed by a retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromClause {
    pub result_name: String,
    pub dbname: String,
    pub first_item: u32,
    pub last_item: u32,
}

/// One outbound retrieval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub select_items: Vec<String>,
    pub from: FromClause,
    pub options: String,
}

impl ResultSet {
    /// Build the query descriptor for fetching `value` (a field or fact
    /// specifier, `None` for an empty selection) over the window
    /// `first..=last` of this hit set.
    ///
    /// The window must span fewer than 100 items; a wider window is a
    /// caller programming error.
    pub fn retrieve_values(
        &self,
        value: Option<&str>,
        types: &dyn TypeAssociations,
        first: u32,
        last: u32,
    ) -> RetrievalQuery {
        assert!(
            i64::from(last) - i64::from(first) < 100,
            "retrieval window must span fewer than 100 items"
        );

        let mut select_items = Vec::new();

        if let Some(value) = value {
            let (prefix, suffix) = match value.find('(') {
                Some(at) => (&value[..at], &value[at..]),
                None => (value, ""),
            };

            // Top-level data types drop their count-style suffix; the
            // counts only apply to facts.
            let top_level_primary = TOP_LEVEL_TAGS
                .iter()
                .any(|tag| value.strip_prefix(tag).is_some_and(|rest| rest.starts_with('(')));
            let primary = if top_level_primary { prefix } else { value };
            select_items.push(primary.to_string());

            // Associated field groups are often the parents of the
            // requested data, sometimes siblings. They keep the fact
            // suffix unless they are themselves main data types.
            for code in types.associated(prefix, self.dbname()) {
                let suffix = if TOP_LEVEL_TAGS.contains(&code.as_str()) {
                    ""
                } else {
                    suffix
                };
                select_items.push(format!("{code}{suffix}"));
            }
        } else {
            select_items.push(String::new());
        }

        let options = if self.sd_v3() {
            OPTIONS_OMIT_V2000
        } else {
            OPTIONS_OMIT_V3000
        };

        RetrievalQuery {
            select_items,
            from: FromClause {
                result_name: self.result_name().to_string(),
                dbname: self.dbname().to_string(),
                first_item: first,
                last_item: last,
            },
            options: options.to_string(),
        }
    }
}

impl RetrievalQuery {
    /// Render the descriptor to its XML wire shape.
    pub fn to_xml(&self) -> Result<String> {
        fn render<E: std::fmt::Display>(err: E) -> FlattenError {
            FlattenError::Render(err.to_string())
        }

        let mut writer = Writer::new(Vec::new());

        writer
            .write_event(Event::Start(BytesStart::new("retrieve")))
            .map_err(render)?;

        writer
            .write_event(Event::Start(BytesStart::new("select_list")))
            .map_err(render)?;
        for item in &self.select_items {
            writer
                .write_event(Event::Start(BytesStart::new("select_item")))
                .map_err(render)?;
            writer
                .write_event(Event::Text(BytesText::new(item)))
                .map_err(render)?;
            writer
                .write_event(Event::End(BytesEnd::new("select_item")))
                .map_err(render)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("select_list")))
            .map_err(render)?;

        let first = self.from.first_item.to_string();
        let last = self.from.last_item.to_string();
        let mut from = BytesStart::new("from_clause");
        from.push_attribute(("resultname", self.from.result_name.as_str()));
        from.push_attribute(("dbname", self.from.dbname.as_str()));
        from.push_attribute(("first_item", first.as_str()));
        from.push_attribute(("last_item", last.as_str()));
        writer.write_event(Event::Empty(from)).map_err(render)?;

        writer
            .write_event(Event::Start(BytesStart::new("options")))
            .map_err(render)?;
        writer
            .write_event(Event::Text(BytesText::new(&self.options)))
            .map_err(render)?;
        writer
            .write_event(Event::End(BytesEnd::new("options")))
            .map_err(render)?;

        writer
            .write_event(Event::End(BytesEnd::new("retrieve")))
            .map_err(render)?;

        String::from_utf8(writer.into_inner()).map_err(render)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::AssociationTable;
    use crate::tree::Element;

    fn result_set(sd_v3: bool) -> ResultSet {
        let doc = Element::parse(
            "<response><resultname>HS7</resultname><dbname>RX</dbname>\
             <resultsize>500</resultsize></response>",
        )
        .unwrap();
        ResultSet::from_response(&doc, sd_v3)
    }

    #[test]
    fn top_level_primary_drops_the_count_suffix() {
        let mut types = AssociationTable::new();
        types.insert("DAT", "RX", &["IDE"]);
        let query = result_set(false).retrieve_values(Some("DAT(1,50)"), &types, 0, 49);

        // DAT is top-level, so the parenthetical goes; IDE is also
        // top-level, so it gains no suffix.
        assert_eq!(query.select_items, vec!["DAT".to_string(), "IDE".to_string()]);
    }

    #[test]
    fn non_top_level_associations_regain_the_suffix() {
        let mut types = AssociationTable::new();
        types.insert("DAT", "RX", &["DATMW", "IDE"]);
        let query = result_set(false).retrieve_values(Some("DAT(1,50)"), &types, 0, 49);

        assert_eq!(
            query.select_items,
            vec!["DAT".to_string(), "DATMW(1,50)".to_string(), "IDE".to_string()]
        );
    }

    #[test]
    fn non_top_level_primary_keeps_its_specifier() {
        let types = AssociationTable::new();
        let query = result_set(false).retrieve_values(Some("DATMW(1,50)"), &types, 0, 49);
        assert_eq!(query.select_items, vec!["DATMW(1,50)".to_string()]);
    }

    #[test]
    fn plain_field_passes_through() {
        let types = AssociationTable::new();
        let query = result_set(false).retrieve_values(Some("RX"), &types, 0, 49);
        assert_eq!(query.select_items, vec!["RX".to_string()]);
    }

    #[test]
    fn empty_selection_still_emits_one_item() {
        let types = AssociationTable::new();
        let query = result_set(false).retrieve_values(None, &types, 0, 9);
        assert_eq!(query.select_items, vec![String::new()]);
    }

    #[test]
    fn options_name_the_format_to_omit() {
        let types = AssociationTable::new();
        let v3 = result_set(true).retrieve_values(None, &types, 0, 9);
        assert_eq!(v3.options, OPTIONS_OMIT_V2000);

        let v2 = result_set(false).retrieve_values(None, &types, 0, 9);
        assert_eq!(v2.options, OPTIONS_OMIT_V3000);
    }

    #[test]
    fn from_clause_carries_the_window() {
        let types = AssociationTable::new();
        let query = result_set(false).retrieve_values(Some("RX"), &types, 100, 199);
        assert_eq!(query.from.result_name, "HS7");
        assert_eq!(query.from.dbname, "RX");
        assert_eq!(query.from.first_item, 100);
        assert_eq!(query.from.last_item, 199);
    }

    #[test]
    #[should_panic(expected = "fewer than 100")]
    fn windows_of_100_or_more_are_rejected() {
        let types = AssociationTable::new();
        result_set(false).retrieve_values(Some("RX"), &types, 0, 100);
    }

    #[test]
    fn renders_the_wire_shape() {
        let mut types = AssociationTable::new();
        types.insert("DAT", "RX", &["IDE"]);
        let query = result_set(false).retrieve_values(Some("DAT(1,50)"), &types, 0, 49);
        let xml = query.to_xml().unwrap();

        assert!(xml.starts_with("<retrieve>"));
        assert!(xml.contains("<select_item>DAT</select_item>"));
        assert!(xml.contains("<select_item>IDE</select_item>"));
        assert!(xml.contains("resultname=\"HS7\""));
        assert!(xml.contains("dbname=\"RX\""));
        assert!(xml.contains("first_item=\"0\""));
        assert!(xml.contains("last_item=\"49\""));
        assert!(xml.contains("<options>OMIT_CIT,OMIT_V3000,ISSUE_RXN=true</options>"));
        assert!(xml.ends_with("</retrieve>"));

        // The rendered query must itself read back as a tree.
        let parsed = Element::parse(&xml).unwrap();
        assert_eq!(parsed.elements_by_tag("select_item").len(), 2);
    }
}
