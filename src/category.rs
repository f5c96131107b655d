//! Record categories and their duplication policies.

use crate::tree::Element;

/// How sibling sub-records combine with their parent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DupMode {
    /// Each sibling becomes its own record, seeded with a copy of the
    /// parent's base fields.
    Duplicate,
    /// All siblings fold into one shared record per parent.
    Merge,
}

/// The kinds of record a result tree can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Citation,
    Substance,
    DpItem,
    Reaction,
    TgItem,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Citation,
        Category::Substance,
        Category::DpItem,
        Category::Reaction,
        Category::TgItem,
    ];

    /// Tag of one record of this category.
    pub fn singular_tag(self) -> &'static str {
        match self {
            Category::Citation => "citation",
            Category::Substance => "substance",
            Category::DpItem => "dpitem",
            Category::Reaction => "reaction",
            Category::TgItem => "tgitem",
        }
    }

    /// Value the tree's context field carries for this category.
    pub fn plural_tag(self) -> &'static str {
        match self {
            Category::Citation => "citations",
            Category::Substance => "substances",
            Category::DpItem => "dpitems",
            Category::Reaction => "reactions",
            Category::TgItem => "tgitems",
        }
    }

    /// Default duplication policy. Citations and data-point items combine
    /// all sub-records into the parent; the rest duplicate the parent per
    /// sub-record.
    pub fn dup_mode(self) -> DupMode {
        match self {
            Category::Citation | Category::DpItem => DupMode::Merge,
            Category::Substance | Category::Reaction | Category::TgItem => DupMode::Duplicate,
        }
    }

    /// Exact-string match against the context value. Deliberately not a
    /// pattern match, so near-miss context values cannot collide with a
    /// category.
    pub fn from_context(context: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| context == category.plural_tag())
    }
}

/// Read the tree's context field and classify it. `None` means an empty or
/// unrecognized result set: the caller emits zero records, not an error.
pub fn find_result_category(doc: &Element) -> Option<Category> {
    let context = doc.first_text("context")?;
    Category::from_context(&context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_values_map_to_singular_categories() {
        assert_eq!(Category::from_context("citations"), Some(Category::Citation));
        assert_eq!(Category::from_context("substances"), Some(Category::Substance));
        assert_eq!(Category::from_context("dpitems"), Some(Category::DpItem));
        assert_eq!(Category::from_context("reactions"), Some(Category::Reaction));
        assert_eq!(Category::from_context("tgitems"), Some(Category::TgItem));
    }

    #[test]
    fn match_is_exact_not_prefix_or_singular() {
        assert_eq!(Category::from_context("reaction"), None);
        assert_eq!(Category::from_context("reactionsx"), None);
        assert_eq!(Category::from_context("Reactions"), None);
        assert_eq!(Category::from_context(""), None);
    }

    #[test]
    fn duplication_policy_per_category() {
        assert_eq!(Category::Citation.dup_mode(), DupMode::Merge);
        assert_eq!(Category::DpItem.dup_mode(), DupMode::Merge);
        assert_eq!(Category::Substance.dup_mode(), DupMode::Duplicate);
        assert_eq!(Category::Reaction.dup_mode(), DupMode::Duplicate);
        assert_eq!(Category::TgItem.dup_mode(), DupMode::Duplicate);
    }

    #[test]
    fn missing_or_unknown_context_yields_no_category() {
        let doc = Element::parse("<response><context>everything</context></response>").unwrap();
        assert_eq!(find_result_category(&doc), None);

        let doc = Element::parse("<response><resultsize>4</resultsize></response>").unwrap();
        assert_eq!(find_result_category(&doc), None);
    }

    #[test]
    fn context_field_is_found_anywhere_in_the_tree() {
        let doc = Element::parse(
            "<response><result><context>reactions</context></result></response>",
        )
        .unwrap();
        assert_eq!(find_result_category(&doc), Some(Category::Reaction));
    }
}
