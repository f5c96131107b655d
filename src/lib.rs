//! rexflat flattens hierarchical query-result trees into flat key/value
//! records suitable for tabular consumption.
//!
//! A fetched result page is parsed once into an owned [`Element`] tree.
//! [`ResultSet::flatten`] classifies the tree by category, folds each
//! record's sub-records into flat maps under the category's duplication
//! policy, and interns every label and value through a per-result-set
//! [`CanonCache`] so repeated strings share one instance. The companion
//! [`RetrievalQuery`] builder produces the outbound descriptor for fetching
//! the next window of the hit set, and [`table`] converts flattened rows to
//! arrow columns for parquet output.

pub mod cache;
pub mod category;
pub mod config;
pub mod error;
pub mod flatten;
pub mod labels;
pub mod record;
pub mod retrieve;
pub mod table;
pub mod tree;

pub use cache::CanonCache;
pub use category::{find_result_category, Category, DupMode};
pub use config::PipelineConfig;
pub use error::{FlattenError, Result};
pub use flatten::{
    classify_tag, find_facts, requests_facts, ResultSet, TagClass, MULTIPLE_VALUE_SEPARATOR,
    TOP_LEVEL_TAGS,
};
pub use labels::{AssociationTable, DefaultLabels, FieldLabels, TypeAssociations};
pub use record::FlatRecord;
pub use retrieve::{FromClause, RetrievalQuery, OPTIONS_OMIT_V2000, OPTIONS_OMIT_V3000};
pub use tree::{Element, XmlNode};
