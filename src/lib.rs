//! # Trieval
//!
//! A numeric range indexing and search library for Rust, inspired by
//! Lucene's trie-encoded numeric fields.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Order-preserving sortable encodings for i32, i64, f32 and f64
//! - Prefix-coded terms at a configurable precision step
//! - Range decomposition into a minimal set of term brackets
//! - Streaming term enumeration with forward seek
//! - Parallel search across index segments

pub mod dictionary;
pub mod error;
pub mod field;
pub mod index;
pub mod numeric;
pub mod parallel;
pub mod query;
pub mod terms;
pub mod util;

pub mod prelude {
    pub use crate::error::{Result, TrievalError};
    pub use crate::field::NumericField;
    pub use crate::index::{NumericIndexReader, NumericIndexWriter};
    pub use crate::numeric::{NumericType, NumericValue, PrecisionStep};
    pub use crate::parallel::{ParallelRangeSearcher, ParallelSearchConfig, SegmentMatches};
    pub use crate::query::{NumericRangeQuery, Query, collect_doc_ids};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
