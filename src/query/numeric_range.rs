//! Numeric range query over prefix-coded trie terms.
//!
//! A [`NumericRangeQuery`] holds a typed `[lower, upper]` range for one
//! field. At execution time the range is mapped into the unsigned sortable
//! domain, decomposed into prefix-coded term brackets via
//! [`split_range`](crate::numeric::split::split_range), and streamed
//! against the field's term dictionary by [`NumericRangeTermsEnum`]. The
//! posting lists of the matching terms are merged into one deduplicated
//! document id stream.
//!
//! Like the sortable encoding it is built on, a range over floats treats
//! `-0.0` as strictly below `+0.0` and clusters every NaN above positive
//! infinity; a degenerate NaN-to-NaN range therefore matches exactly the
//! NaN-valued documents. This mirrors the byte-level behavior of the
//! encoding and carries no ordering promise between distinct NaN payloads.

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::error::{Result, TrievalError};
use crate::index::NumericIndexReader;
use crate::numeric::prefix::PrefixCodec;
use crate::numeric::split::split_range;
use crate::numeric::{NumericType, NumericValue, PrecisionStep};
use crate::query::matcher::{
    DisjunctionMatcher, EmptyMatcher, LiveDocsMatcher, Matcher, PostingMatcher,
};
use crate::query::query::Query;
use crate::terms::{EmptyTermsEnum, TermStats, Terms, TermsEnum};

/// A query matching documents whose numeric field value lies in a range.
///
/// Equality and hashing are structural over (field, numeric type,
/// precision step, bounds, inclusivity); the boost factor and execution
/// limits deliberately do not participate, so queries that select the same
/// documents can share cache slots.
#[derive(Debug, Clone)]
pub struct NumericRangeQuery {
    /// The field to search in.
    field: String,
    /// The numeric type the field was indexed with.
    numeric_type: NumericType,
    /// The precision step the field was indexed with.
    precision_step: PrecisionStep,
    /// Lower bound, `None` for an open lower end.
    lower: Option<NumericValue>,
    /// Upper bound, `None` for an open upper end.
    upper: Option<NumericValue>,
    /// Whether the lower bound itself is part of the range.
    include_lower: bool,
    /// Whether the upper bound itself is part of the range.
    include_upper: bool,
    /// The boost factor for this query.
    boost: f32,
    /// Abort execution once the range expands past this many terms.
    max_terms: Option<usize>,
    /// Abort execution after this much wall-clock time.
    timeout: Option<Duration>,
}

impl NumericRangeQuery {
    /// Create a range query, validating the precision step and that both
    /// bounds carry the declared numeric type.
    pub fn new<S: Into<String>>(
        field: S,
        numeric_type: NumericType,
        precision_step: PrecisionStep,
        lower: Option<NumericValue>,
        upper: Option<NumericValue>,
        include_lower: bool,
        include_upper: bool,
    ) -> Result<Self> {
        precision_step.validate()?;
        for bound in [&lower, &upper].into_iter().flatten() {
            if bound.numeric_type() != numeric_type {
                return Err(TrievalError::invalid_range(format!(
                    "range bound is {}, field type is {numeric_type}",
                    bound.numeric_type()
                )));
            }
        }
        Ok(NumericRangeQuery {
            field: field.into(),
            numeric_type,
            precision_step,
            lower,
            upper,
            include_lower,
            include_upper,
            boost: 1.0,
            max_terms: None,
            timeout: None,
        })
    }

    fn with_default_step(
        field: String,
        numeric_type: NumericType,
        lower: Option<NumericValue>,
        upper: Option<NumericValue>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        NumericRangeQuery {
            field,
            numeric_type,
            precision_step: numeric_type.default_precision_step(),
            lower,
            upper,
            include_lower,
            include_upper,
            boost: 1.0,
            max_terms: None,
            timeout: None,
        }
    }

    /// Create an `i32` range query at the default precision step.
    pub fn i32_range<S: Into<String>>(
        field: S,
        lower: Option<i32>,
        upper: Option<i32>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        Self::with_default_step(
            field.into(),
            NumericType::I32,
            lower.map(NumericValue::I32),
            upper.map(NumericValue::I32),
            include_lower,
            include_upper,
        )
    }

    /// Create an `i64` range query at the default precision step.
    pub fn i64_range<S: Into<String>>(
        field: S,
        lower: Option<i64>,
        upper: Option<i64>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        Self::with_default_step(
            field.into(),
            NumericType::I64,
            lower.map(NumericValue::I64),
            upper.map(NumericValue::I64),
            include_lower,
            include_upper,
        )
    }

    /// Create an `f32` range query at the default precision step.
    pub fn f32_range<S: Into<String>>(
        field: S,
        lower: Option<f32>,
        upper: Option<f32>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        Self::with_default_step(
            field.into(),
            NumericType::F32,
            lower.map(NumericValue::F32),
            upper.map(NumericValue::F32),
            include_lower,
            include_upper,
        )
    }

    /// Create an `f64` range query at the default precision step.
    pub fn f64_range<S: Into<String>>(
        field: S,
        lower: Option<f64>,
        upper: Option<f64>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        Self::with_default_step(
            field.into(),
            NumericType::F64,
            lower.map(NumericValue::F64),
            upper.map(NumericValue::F64),
            include_lower,
            include_upper,
        )
    }

    /// Create a datetime range query over an `i64` field holding epoch
    /// seconds, at the default precision step.
    pub fn datetime_range<S: Into<String>>(
        field: S,
        lower: Option<DateTime<Utc>>,
        upper: Option<DateTime<Utc>>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        Self::with_default_step(
            field.into(),
            NumericType::I64,
            lower.map(|datetime| NumericValue::I64(datetime.timestamp())),
            upper.map(|datetime| NumericValue::I64(datetime.timestamp())),
            include_lower,
            include_upper,
        )
    }

    /// Replace the precision step; it must match the step the field was
    /// indexed with.
    pub fn with_precision_step(mut self, step: PrecisionStep) -> Result<Self> {
        step.validate()?;
        self.precision_step = step;
        Ok(self)
    }

    /// Set the boost factor for this query.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Fail execution with `ResourceExhausted` once the range expands to
    /// more than `max_terms` dictionary terms.
    pub fn with_max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = Some(max_terms);
        self
    }

    /// Fail execution with `OperationCancelled` once enumeration has run
    /// longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Get the numeric type.
    pub fn numeric_type(&self) -> NumericType {
        self.numeric_type
    }

    /// Get the precision step.
    pub fn precision_step(&self) -> PrecisionStep {
        self.precision_step
    }

    /// Get the lower bound.
    pub fn lower_bound(&self) -> Option<NumericValue> {
        self.lower
    }

    /// Get the upper bound.
    pub fn upper_bound(&self) -> Option<NumericValue> {
        self.upper
    }

    /// Whether the lower bound is inclusive.
    pub fn includes_lower(&self) -> bool {
        self.include_lower
    }

    /// Whether the upper bound is inclusive.
    pub fn includes_upper(&self) -> bool {
        self.include_upper
    }

    /// Get the term expansion limit, if any.
    pub fn max_terms(&self) -> Option<usize> {
        self.max_terms
    }

    /// Get the execution timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The effective sortable interval, or `None` when the range is empty.
    ///
    /// Open ends extend to the domain extremes and are not subject to the
    /// inclusivity flags; a present exclusive bound is nudged one sortable
    /// step inward, collapsing to the empty range at the domain edge.
    fn sortable_bounds(&self) -> Option<(u64, u64)> {
        let bits = self.numeric_type.value_bits();
        let domain_max = if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        };

        let mut min = self.lower.map_or(0, |value| value.to_sortable());
        if self.lower.is_some() && !self.include_lower {
            if min == domain_max {
                return None;
            }
            min += 1;
        }

        let mut max = self.upper.map_or(domain_max, |value| value.to_sortable());
        if self.upper.is_some() && !self.include_upper {
            if max == 0 {
                return None;
            }
            max -= 1;
        }

        (min <= max).then_some((min, max))
    }

    /// Enumerate the dictionary terms this range selects, in byte order.
    ///
    /// An empty range yields an exhausted enumeration, never an error.
    pub fn terms_enum(&self, terms: &dyn Terms) -> Result<NumericRangeTermsEnum> {
        let deadline = self
            .timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));
        self.filtered_terms_enum(terms, deadline)
    }

    fn filtered_terms_enum(
        &self,
        terms: &dyn Terms,
        deadline: Option<Instant>,
    ) -> Result<NumericRangeTermsEnum> {
        let Some((min, max)) = self.sortable_bounds() else {
            return Ok(NumericRangeTermsEnum::empty());
        };
        let codec = PrefixCodec::new(self.numeric_type, self.precision_step)?;
        let ranges = split_range(codec.value_bits(), self.precision_step, min, max);
        let mut brackets = VecDeque::with_capacity(ranges.len());
        for range in &ranges {
            brackets.push_back(range.encoded_bounds(&codec)?);
        }
        Ok(NumericRangeTermsEnum::new(
            terms.iterator()?,
            brackets,
            deadline,
        ))
    }
}

impl PartialEq for NumericRangeQuery {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.numeric_type == other.numeric_type
            && self.precision_step == other.precision_step
            && self.lower == other.lower
            && self.upper == other.upper
            && self.include_lower == other.include_lower
            && self.include_upper == other.include_upper
    }
}

impl Eq for NumericRangeQuery {}

impl Hash for NumericRangeQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.numeric_type.hash(state);
        self.precision_step.hash(state);
        self.lower.hash(state);
        self.upper.hash(state);
        self.include_lower.hash(state);
        self.include_upper.hash(state);
    }
}

impl Query for NumericRangeQuery {
    fn matcher(&self, reader: &NumericIndexReader) -> Result<Box<dyn Matcher>> {
        let Some(field) = reader.field(&self.field) else {
            return Ok(Box::new(EmptyMatcher::new()));
        };
        if field.numeric_type() != self.numeric_type {
            return Err(TrievalError::query(format!(
                "field '{}' is indexed as {}, queried as {}",
                self.field,
                field.numeric_type(),
                self.numeric_type
            )));
        }
        if field.precision_step() != self.precision_step {
            return Err(TrievalError::query(format!(
                "field '{}' is indexed at precision step {}, queried at {}",
                self.field,
                field.precision_step(),
                self.precision_step
            )));
        }
        let Some(terms) = reader.terms(&self.field) else {
            return Ok(Box::new(EmptyMatcher::new()));
        };

        let deadline = self
            .timeout
            .and_then(|timeout| Instant::now().checked_add(timeout));
        let mut terms_enum = self.filtered_terms_enum(terms, deadline)?;
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        let mut term_count = 0usize;
        while let Some(stats) = terms_enum.next()? {
            term_count += 1;
            if let Some(cap) = self.max_terms
                && term_count > cap
            {
                return Err(TrievalError::resource_exhausted(format!(
                    "range on field '{}' expands past {cap} terms",
                    self.field
                )));
            }
            if let Some(postings) = terms.postings(&stats.term)? {
                matchers.push(Box::new(PostingMatcher::new(postings)?));
            }
        }

        if matchers.is_empty() {
            return Ok(Box::new(EmptyMatcher::new()));
        }
        let merged: Box<dyn Matcher> = Box::new(DisjunctionMatcher::new(matchers));
        match reader.live_docs() {
            Some(live_docs) => Ok(Box::new(LiveDocsMatcher::new(
                merged,
                Arc::clone(live_docs),
            )?)),
            None => Ok(merged),
        }
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn description(&self) -> String {
        let lower = self
            .lower
            .map_or_else(|| "*".to_string(), |value| value.to_string());
        let upper = self
            .upper
            .map_or_else(|| "*".to_string(), |value| value.to_string());
        let open = if self.include_lower { '[' } else { '{' };
        let close = if self.include_upper { ']' } else { '}' };
        if self.boost == 1.0 {
            format!("{}:{open}{lower} TO {upper}{close}", self.field)
        } else {
            format!("{}:{open}{lower} TO {upper}{close}^{}", self.field, self.boost)
        }
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn is_empty(&self, reader: &NumericIndexReader) -> Result<bool> {
        if self.sortable_bounds().is_none() {
            return Ok(true);
        }
        let Some(terms) = reader.terms(&self.field) else {
            return Ok(true);
        };
        let mut terms_enum = self.terms_enum(terms)?;
        Ok(terms_enum.next()?.is_none())
    }

    fn cost(&self, reader: &NumericIndexReader) -> Result<u64> {
        let Some(terms) = reader.terms(&self.field) else {
            return Ok(0);
        };
        let mut terms_enum = self.terms_enum(terms)?;
        let mut cost = 0u64;
        while let Some(stats) = terms_enum.next()? {
            cost = cost.saturating_add(stats.doc_freq);
        }
        Ok(cost)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn field(&self) -> Option<&str> {
        Some(&self.field)
    }
}

/// Streaming enumeration of the dictionary terms inside a range's term
/// brackets.
///
/// The enumeration walks the brackets and the underlying dictionary in a
/// single forward pass, holding at most one buffered term. `seek` never
/// moves backwards: a target at or below the current term re-arms the
/// current term instead.
pub struct NumericRangeTermsEnum {
    inner: Box<dyn TermsEnum>,
    /// Encoded (lower, upper) term bounds not yet visited, ascending.
    brackets: VecDeque<(Vec<u8>, Vec<u8>)>,
    /// Upper bound of the bracket being scanned.
    active_upper: Option<Vec<u8>>,
    /// A term pulled from the dictionary that overshot its bracket and
    /// still has to be tested against the following ones.
    pending: Option<TermStats>,
    /// An accepted term waiting to be handed out by the next `next` call.
    peeked: Option<TermStats>,
    /// The term the enumeration currently stands on.
    current: Option<TermStats>,
    deadline: Option<Instant>,
    exhausted: bool,
}

impl NumericRangeTermsEnum {
    fn new(
        inner: Box<dyn TermsEnum>,
        brackets: VecDeque<(Vec<u8>, Vec<u8>)>,
        deadline: Option<Instant>,
    ) -> Self {
        NumericRangeTermsEnum {
            inner,
            brackets,
            active_upper: None,
            pending: None,
            peeked: None,
            current: None,
            deadline,
            exhausted: false,
        }
    }

    fn empty() -> Self {
        NumericRangeTermsEnum {
            inner: Box::new(EmptyTermsEnum),
            brackets: VecDeque::new(),
            active_upper: None,
            pending: None,
            peeked: None,
            current: None,
            deadline: None,
            exhausted: true,
        }
    }

    /// The number of term brackets left to visit, excluding the active one.
    pub fn remaining_brackets(&self) -> usize {
        self.brackets.len()
    }

    fn check_deadline(&self) -> Result<()> {
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(TrievalError::cancelled(
                "numeric range enumeration ran past its deadline",
            ));
        }
        Ok(())
    }

    /// Produce the next in-range term, opening brackets and repositioning
    /// the dictionary cursor as needed.
    fn advance(&mut self) -> Result<Option<TermStats>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }
            self.check_deadline()?;

            let upper = match self.active_upper.take() {
                Some(upper) => upper,
                None => {
                    let Some((lower, upper)) = self.brackets.pop_front() else {
                        self.exhausted = true;
                        return Ok(None);
                    };
                    let behind = match &self.pending {
                        Some(stats) => stats.term < lower,
                        None => true,
                    };
                    if behind {
                        self.pending = None;
                        self.inner.seek(&lower)?;
                    }
                    upper
                }
            };

            let candidate = match self.pending.take() {
                Some(stats) => Some(stats),
                None => self.inner.next()?,
            };

            match candidate {
                Some(stats) if stats.term <= upper => {
                    self.active_upper = Some(upper);
                    return Ok(Some(stats));
                }
                Some(stats) => {
                    // Overshot this bracket; test it against the next one.
                    self.pending = Some(stats);
                }
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
            }
        }
    }
}

impl TermsEnum for NumericRangeTermsEnum {
    fn next(&mut self) -> Result<Option<TermStats>> {
        if let Some(stats) = self.peeked.take() {
            self.current = Some(stats.clone());
            return Ok(Some(stats));
        }
        match self.advance()? {
            Some(stats) => {
                self.current = Some(stats.clone());
                Ok(Some(stats))
            }
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    fn seek(&mut self, target: &[u8]) -> Result<bool> {
        // Already standing at or beyond the target.
        if let Some(stats) = &self.peeked
            && stats.term.as_slice() >= target
        {
            self.current = Some(stats.clone());
            return Ok(stats.term.as_slice() == target);
        }
        if self.peeked.is_none()
            && let Some(stats) = &self.current
            && stats.term.as_slice() >= target
        {
            self.peeked = self.current.clone();
            return Ok(stats.term.as_slice() == target);
        }
        self.peeked = None;

        // Discard state that ends below the target.
        if let Some(upper) = &self.active_upper
            && upper.as_slice() < target
        {
            self.active_upper = None;
        }
        if let Some(stats) = &self.pending
            && stats.term.as_slice() < target
        {
            self.pending = None;
        }
        while let Some((_, upper)) = self.brackets.front() {
            if upper.as_slice() < target {
                self.brackets.pop_front();
            } else {
                break;
            }
        }

        if self.active_upper.is_some() {
            // Mid-bracket: jump the dictionary cursor forward.
            self.inner.seek(target)?;
        } else if let Some((lower, _)) = self.brackets.front_mut()
            && lower.as_slice() < target
        {
            // The surviving bracket starts below the target; enter it at
            // the target instead.
            *lower = target.to_vec();
        }

        match self.advance()? {
            Some(stats) => {
                debug_assert!(stats.term.as_slice() >= target);
                let exact = stats.term.as_slice() == target;
                self.current = Some(stats.clone());
                self.peeked = Some(stats);
                Ok(exact)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn seek_exact(&mut self, term: &[u8]) -> Result<bool> {
        if self.seek(term)? {
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn current(&self) -> Option<&TermStats> {
        self.current.as_ref()
    }
}
