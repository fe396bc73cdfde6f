//! Term dictionary enumeration API.
//!
//! Traits and types for enumerating the terms of an indexed numeric field,
//! in the shape of Lucene's Terms/TermsEnum. Terms are raw byte strings
//! (prefix-coded numeric terms are not UTF-8), sorted lexicographically,
//! and each term reaches its posting list through the owning [`Terms`].

use crate::error::Result;

/// Sentinel document id: iteration is exhausted (or not yet positioned).
pub const NO_MORE_DOCS: u32 = u32::MAX;

/// Statistics about a term in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermStats {
    /// The term bytes
    pub term: Vec<u8>,
    /// Number of documents containing this term
    pub doc_freq: u64,
    /// Total number of occurrences across all documents
    pub total_term_freq: u64,
}

/// Iterator over the terms of one field, in byte order.
///
/// After a successful [`TermsEnum::seek`] the enumeration is positioned so
/// that [`TermsEnum::current`] peeks the first term at or above the target
/// and the following [`TermsEnum::next`] returns that same term before
/// advancing past it.
pub trait TermsEnum: Send + Sync {
    /// Advance to the next term in the enumeration.
    ///
    /// Returns `None` when there are no more terms.
    fn next(&mut self) -> Result<Option<TermStats>>;

    /// Seek to the first term greater than or equal to the target.
    ///
    /// Returns `true` if the target itself is present, `false` if
    /// positioned at the next greater term (or at the end).
    fn seek(&mut self, target: &[u8]) -> Result<bool>;

    /// Seek to the exact term.
    ///
    /// Returns `true` if the term exists, `false` otherwise (the position
    /// is then unspecified and `current` is cleared).
    fn seek_exact(&mut self, term: &[u8]) -> Result<bool>;

    /// Get the current term without advancing the iterator.
    ///
    /// Returns `None` if the iterator hasn't been positioned or is
    /// exhausted.
    fn current(&self) -> Option<&TermStats>;

    /// Get statistics for the current term.
    ///
    /// This is equivalent to `current()` but returns a copy.
    fn term_stats(&self) -> Option<TermStats> {
        self.current().cloned()
    }
}

/// Iterator over the documents of one posting list, in increasing doc id
/// order. Unpositioned until the first `next`; [`PostingIterator::doc_id`]
/// returns [`NO_MORE_DOCS`] outside a valid position.
pub trait PostingIterator: Send + std::fmt::Debug {
    /// The current document id.
    fn doc_id(&self) -> u32;

    /// Advance to the next document. Returns `false` at the end.
    fn next(&mut self) -> Result<bool>;

    /// Advance to the first document with id >= `target`. Returns `false`
    /// when no such document exists.
    fn skip_to(&mut self, target: u32) -> Result<bool>;

    /// Estimated number of documents in this posting list.
    fn cost(&self) -> u64;
}

/// Access to the term dictionary for a specific field.
pub trait Terms: Send + Sync {
    /// Get an iterator over all terms in this field.
    fn iterator(&self) -> Result<Box<dyn TermsEnum>>;

    /// Get the number of unique terms in this field.
    ///
    /// Returns `None` if the count is not available.
    fn size(&self) -> Option<u64>;

    /// Get the sum of document frequencies across all terms.
    fn sum_doc_freq(&self) -> Option<u64>;

    /// Get the sum of total term frequencies across all terms.
    fn sum_total_term_freq(&self) -> Option<u64>;

    /// Get the posting list of a term, or `None` if the term is absent.
    fn postings(&self, term: &[u8]) -> Result<Option<Box<dyn PostingIterator>>>;
}

// Implement TermsEnum for Box<dyn TermsEnum> to allow composition.
impl TermsEnum for Box<dyn TermsEnum> {
    fn next(&mut self) -> Result<Option<TermStats>> {
        (**self).next()
    }

    fn seek(&mut self, target: &[u8]) -> Result<bool> {
        (**self).seek(target)
    }

    fn seek_exact(&mut self, term: &[u8]) -> Result<bool> {
        (**self).seek_exact(term)
    }

    fn current(&self) -> Option<&TermStats> {
        (**self).current()
    }
}

/// A terms enum over nothing, for fields with no indexed terms.
#[derive(Debug, Default)]
pub struct EmptyTermsEnum;

impl TermsEnum for EmptyTermsEnum {
    fn next(&mut self) -> Result<Option<TermStats>> {
        Ok(None)
    }

    fn seek(&mut self, _target: &[u8]) -> Result<bool> {
        Ok(false)
    }

    fn seek_exact(&mut self, _term: &[u8]) -> Result<bool> {
        Ok(false)
    }

    fn current(&self) -> Option<&TermStats> {
        None
    }
}

/// Posting iterator over a sorted doc id vector.
#[derive(Debug)]
pub struct VecPostingIterator {
    docs: Vec<u32>,
    position: usize,
    current: u32,
}

impl VecPostingIterator {
    /// Create an unpositioned iterator over sorted doc ids.
    pub fn new(docs: Vec<u32>) -> Self {
        debug_assert!(docs.windows(2).all(|w| w[0] < w[1]));
        VecPostingIterator {
            docs,
            position: 0,
            current: NO_MORE_DOCS,
        }
    }
}

impl PostingIterator for VecPostingIterator {
    fn doc_id(&self) -> u32 {
        self.current
    }

    fn next(&mut self) -> Result<bool> {
        if self.position < self.docs.len() {
            self.current = self.docs[self.position];
            self.position += 1;
            Ok(true)
        } else {
            self.current = NO_MORE_DOCS;
            Ok(false)
        }
    }

    fn skip_to(&mut self, target: u32) -> Result<bool> {
        if self.current != NO_MORE_DOCS && self.current >= target {
            return Ok(true);
        }
        let offset = self.docs[self.position..].partition_point(|&doc| doc < target);
        self.position += offset;
        self.next()
    }

    fn cost(&self) -> u64 {
        self.docs.len() as u64
    }
}
