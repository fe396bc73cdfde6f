//! Matcher implementations for query execution.

use crate::error::Result;
use crate::index::LiveDocs;
use crate::terms::{NO_MORE_DOCS, PostingIterator};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for document matchers.
///
/// A matcher is positioned on its first document when constructed and
/// reports [`NO_MORE_DOCS`] once exhausted.
pub trait Matcher: Send + Debug {
    /// Get the current document ID.
    fn doc_id(&self) -> u32;

    /// Move to the next matching document.
    fn next(&mut self) -> Result<bool>;

    /// Skip to the first document >= target.
    fn skip_to(&mut self, target: u32) -> Result<bool>;

    /// Get the cost of iterating through this matcher.
    fn cost(&self) -> u64;

    /// Check if this matcher is exhausted.
    fn is_exhausted(&self) -> bool;
}

/// Collect every remaining document id from a matcher, in order.
pub fn collect_doc_ids(matcher: &mut dyn Matcher) -> Result<Vec<u32>> {
    let mut doc_ids = Vec::new();
    while !matcher.is_exhausted() {
        let doc_id = matcher.doc_id();
        if doc_id == NO_MORE_DOCS {
            break;
        }
        doc_ids.push(doc_id);
        if !matcher.next()? {
            break;
        }
    }
    Ok(doc_ids)
}

/// A matcher that matches no documents.
#[derive(Debug)]
pub struct EmptyMatcher {
    exhausted: bool,
}

impl EmptyMatcher {
    /// Create a new empty matcher.
    pub fn new() -> Self {
        EmptyMatcher { exhausted: true }
    }
}

impl Default for EmptyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher for EmptyMatcher {
    fn doc_id(&self) -> u32 {
        NO_MORE_DOCS
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn skip_to(&mut self, _target: u32) -> Result<bool> {
        Ok(false)
    }

    fn cost(&self) -> u64 {
        0
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// A matcher over a pre-computed, sorted document id list.
#[derive(Debug)]
pub struct PreComputedMatcher {
    doc_ids: Vec<u32>,
    position: usize,
}

impl PreComputedMatcher {
    /// Create a matcher from document ids; sorted and deduplicated here.
    pub fn new(mut doc_ids: Vec<u32>) -> Self {
        doc_ids.sort_unstable();
        doc_ids.dedup();
        PreComputedMatcher {
            doc_ids,
            position: 0,
        }
    }
}

impl Matcher for PreComputedMatcher {
    fn doc_id(&self) -> u32 {
        self.doc_ids
            .get(self.position)
            .copied()
            .unwrap_or(NO_MORE_DOCS)
    }

    fn next(&mut self) -> Result<bool> {
        if self.position < self.doc_ids.len() {
            self.position += 1;
        }
        Ok(self.position < self.doc_ids.len())
    }

    fn skip_to(&mut self, target: u32) -> Result<bool> {
        if self.position >= self.doc_ids.len() {
            return Ok(false);
        }
        if self.doc_ids[self.position] >= target {
            return Ok(true);
        }
        let offset = self.doc_ids[self.position..].partition_point(|&doc| doc < target);
        self.position += offset;
        Ok(self.position < self.doc_ids.len())
    }

    fn cost(&self) -> u64 {
        self.doc_ids.len() as u64
    }

    fn is_exhausted(&self) -> bool {
        self.position >= self.doc_ids.len()
    }
}

/// A matcher based on a posting iterator.
#[derive(Debug)]
pub struct PostingMatcher {
    posting_iter: Box<dyn PostingIterator>,
    exhausted: bool,
    cost: u64,
}

impl PostingMatcher {
    /// Create a matcher from an unpositioned posting iterator; the iterator
    /// is advanced onto its first document here.
    pub fn new(mut posting_iter: Box<dyn PostingIterator>) -> Result<Self> {
        let cost = posting_iter.cost();
        let exhausted = !posting_iter.next()?;
        Ok(PostingMatcher {
            posting_iter,
            exhausted,
            cost,
        })
    }
}

impl Matcher for PostingMatcher {
    fn doc_id(&self) -> u32 {
        if self.exhausted {
            NO_MORE_DOCS
        } else {
            self.posting_iter.doc_id()
        }
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            Ok(false)
        } else {
            let has_next = self.posting_iter.next()?;
            if !has_next {
                self.exhausted = true;
            }
            Ok(has_next)
        }
    }

    fn skip_to(&mut self, target: u32) -> Result<bool> {
        if self.exhausted {
            Ok(false)
        } else {
            let result = self.posting_iter.skip_to(target)?;
            if !result {
                self.exhausted = true;
            }
            Ok(result)
        }
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// A helper struct for tracking matchers in the disjunction heap.
#[derive(Debug)]
struct MatcherEntry {
    matcher: Box<dyn Matcher>,
}

impl PartialEq for MatcherEntry {
    fn eq(&self, other: &Self) -> bool {
        self.matcher.doc_id() == other.matcher.doc_id()
    }
}

impl Eq for MatcherEntry {}

impl PartialOrd for MatcherEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatcherEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower doc IDs come first
        other.matcher.doc_id().cmp(&self.matcher.doc_id())
    }
}

/// A matcher that implements disjunction (OR) of multiple matchers.
///
/// Each document id appears once in the merged stream, no matter how many
/// of the sub-matchers contain it.
#[derive(Debug)]
pub struct DisjunctionMatcher {
    /// Min-heap of active matchers, ordered by current doc_id.
    heap: BinaryHeap<MatcherEntry>,
    /// Current document ID.
    current_doc: u32,
    /// Whether this matcher is exhausted.
    exhausted: bool,
    /// Total cost estimate.
    cost: u64,
}

impl DisjunctionMatcher {
    /// Create a new disjunction matcher from multiple positioned matchers.
    pub fn new(mut matchers: Vec<Box<dyn Matcher>>) -> Self {
        let mut heap = BinaryHeap::new();
        let mut cost = 0;

        for matcher in matchers.drain(..) {
            if !matcher.is_exhausted() {
                cost += matcher.cost();
                heap.push(MatcherEntry { matcher });
            }
        }

        let current_doc = heap
            .peek()
            .map(|entry| entry.matcher.doc_id())
            .unwrap_or(NO_MORE_DOCS);
        let exhausted = heap.is_empty();

        DisjunctionMatcher {
            heap,
            current_doc,
            exhausted,
            cost,
        }
    }

    /// Create an empty disjunction matcher.
    pub fn empty() -> Self {
        DisjunctionMatcher {
            heap: BinaryHeap::new(),
            current_doc: NO_MORE_DOCS,
            exhausted: true,
            cost: 0,
        }
    }

    /// Advance past the current document, consuming it from every
    /// sub-matcher that is positioned on it.
    fn advance_to_next_doc(&mut self) -> Result<()> {
        if self.exhausted {
            return Ok(());
        }

        let current_doc = self.current_doc;

        let mut matchers_to_reinsert = Vec::new();
        while let Some(mut entry) = self.heap.pop() {
            if entry.matcher.doc_id() != current_doc {
                self.heap.push(entry);
                break;
            }
            if entry.matcher.next()? && !entry.matcher.is_exhausted() {
                matchers_to_reinsert.push(entry);
            }
        }

        for entry in matchers_to_reinsert {
            self.heap.push(entry);
        }

        if let Some(entry) = self.heap.peek() {
            self.current_doc = entry.matcher.doc_id();
        } else {
            self.current_doc = NO_MORE_DOCS;
            self.exhausted = true;
        }

        Ok(())
    }
}

impl Matcher for DisjunctionMatcher {
    fn doc_id(&self) -> u32 {
        self.current_doc
    }

    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }

        self.advance_to_next_doc()?;
        Ok(!self.exhausted)
    }

    fn skip_to(&mut self, target: u32) -> Result<bool> {
        if self.exhausted || target <= self.current_doc {
            return Ok(!self.exhausted);
        }

        let mut matchers_to_reinsert = Vec::new();
        while let Some(mut entry) = self.heap.pop() {
            if entry.matcher.skip_to(target)? && !entry.matcher.is_exhausted() {
                matchers_to_reinsert.push(entry);
            }
        }

        for entry in matchers_to_reinsert {
            self.heap.push(entry);
        }

        if let Some(entry) = self.heap.peek() {
            self.current_doc = entry.matcher.doc_id();
            self.exhausted = false;
        } else {
            self.current_doc = NO_MORE_DOCS;
            self.exhausted = true;
        }

        Ok(!self.exhausted)
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// A matcher wrapper that hides deleted documents.
#[derive(Debug)]
pub struct LiveDocsMatcher {
    inner: Box<dyn Matcher>,
    live_docs: Arc<LiveDocs>,
}

impl LiveDocsMatcher {
    /// Wrap a positioned matcher; advances it off any leading deleted
    /// documents.
    pub fn new(inner: Box<dyn Matcher>, live_docs: Arc<LiveDocs>) -> Result<Self> {
        let mut matcher = LiveDocsMatcher { inner, live_docs };
        matcher.skip_deleted()?;
        Ok(matcher)
    }

    fn skip_deleted(&mut self) -> Result<()> {
        while !self.inner.is_exhausted() {
            let doc_id = self.inner.doc_id();
            if doc_id == NO_MORE_DOCS || self.live_docs.is_live(doc_id) {
                break;
            }
            if !self.inner.next()? {
                break;
            }
        }
        Ok(())
    }
}

impl Matcher for LiveDocsMatcher {
    fn doc_id(&self) -> u32 {
        self.inner.doc_id()
    }

    fn next(&mut self) -> Result<bool> {
        if !self.inner.next()? {
            return Ok(false);
        }
        self.skip_deleted()?;
        Ok(!self.inner.is_exhausted())
    }

    fn skip_to(&mut self, target: u32) -> Result<bool> {
        if !self.inner.skip_to(target)? {
            return Ok(false);
        }
        self.skip_deleted()?;
        Ok(!self.inner.is_exhausted())
    }

    fn cost(&self) -> u64 {
        self.inner.cost()
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }
}
