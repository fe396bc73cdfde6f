//! Base query trait.

use std::any::Any;
use std::fmt::Debug;

use crate::error::Result;
use crate::index::NumericIndexReader;
use crate::query::matcher::Matcher;

/// Trait for executable queries against a numeric index segment.
pub trait Query: Send + Sync + Debug {
    /// Create a matcher over the documents this query accepts.
    fn matcher(&self, reader: &NumericIndexReader) -> Result<Box<dyn Matcher>>;

    /// Get the boost factor for this query.
    fn boost(&self) -> f32;

    /// Set the boost factor for this query.
    fn set_boost(&mut self, boost: f32);

    /// Get a human-readable description of this query.
    fn description(&self) -> String;

    /// Clone this query.
    fn clone_box(&self) -> Box<dyn Query>;

    /// Check if this query matches no documents in the given segment.
    fn is_empty(&self, reader: &NumericIndexReader) -> Result<bool>;

    /// Get the estimated cost of executing this query.
    fn cost(&self, reader: &NumericIndexReader) -> Result<u64>;

    /// Get this query as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Get the field name this query searches in, if applicable.
    fn field(&self) -> Option<&str> {
        None
    }
}
