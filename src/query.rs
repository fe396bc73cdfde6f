//! Query execution over trie-encoded numeric fields.
//!
//! The central type is [`NumericRangeQuery`], which decomposes a numeric
//! range into prefix-coded term brackets, enumerates the matching terms of
//! a field dictionary, and merges their posting lists into a single
//! document id stream.

pub mod matcher;
pub mod numeric_range;
#[allow(clippy::module_inception)]
pub mod query;

pub use matcher::{
    DisjunctionMatcher, EmptyMatcher, LiveDocsMatcher, Matcher, PostingMatcher,
    PreComputedMatcher, collect_doc_ids,
};
pub use numeric_range::{NumericRangeQuery, NumericRangeTermsEnum};
pub use query::Query;
