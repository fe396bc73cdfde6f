//! In-memory numeric index: a writer building per-field term dictionaries
//! and a reader giving the query layer segment access.

pub mod reader;
pub mod writer;

pub use reader::{LiveDocs, NumericIndexReader};
pub use writer::NumericIndexWriter;
