//! Parallel query execution across index segments.
//!
//! Range decomposition is a pure computation and readers are immutable
//! once committed, so the same query can run against every segment
//! concurrently. The searcher owns a dedicated rayon pool and returns
//! per-segment match lists in segment registration order.

use std::sync::Arc;
use std::sync::mpsc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrievalError};
use crate::index::NumericIndexReader;
use crate::query::Query;
use crate::query::matcher::collect_doc_ids;

/// Configuration for the parallel range searcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelSearchConfig {
    /// Thread pool size for parallel execution.
    /// If None, uses the number of CPU cores.
    pub thread_pool_size: Option<usize>,

    /// Whether to keep the results of the surviving segments when others
    /// fail. When false, the first segment failure fails the search.
    pub allow_partial_results: bool,
}

impl Default for ParallelSearchConfig {
    fn default() -> Self {
        Self {
            thread_pool_size: None,
            allow_partial_results: true,
        }
    }
}

/// Matching documents of one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMatches {
    /// The segment's registered name.
    pub segment: String,
    /// Matching document ids, ascending.
    pub doc_ids: Vec<u32>,
}

/// Executes queries against a set of named segments in parallel.
pub struct ParallelRangeSearcher {
    config: ParallelSearchConfig,
    segments: Vec<(String, Arc<NumericIndexReader>)>,
    thread_pool: Arc<ThreadPool>,
}

impl ParallelRangeSearcher {
    /// Create a searcher with its own thread pool.
    pub fn new(config: ParallelSearchConfig) -> Result<Self> {
        let thread_pool_size = config.thread_pool_size.unwrap_or_else(num_cpus::get);

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(thread_pool_size)
            .thread_name(|i| format!("range-search-{i}"))
            .build()
            .map_err(|e| TrievalError::other(format!("failed to create thread pool: {e}")))?;

        Ok(ParallelRangeSearcher {
            config,
            segments: Vec::new(),
            thread_pool: Arc::new(thread_pool),
        })
    }

    /// Register a segment under a unique name.
    pub fn add_segment(
        &mut self,
        name: impl Into<String>,
        reader: Arc<NumericIndexReader>,
    ) -> Result<()> {
        let name = name.into();
        if self.segments.iter().any(|(existing, _)| *existing == name) {
            return Err(TrievalError::index(format!(
                "segment '{name}' already registered"
            )));
        }
        self.segments.push((name, reader));
        Ok(())
    }

    /// The number of registered segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Execute the query against every segment in parallel.
    ///
    /// Results come back in segment registration order. Failed segments
    /// are omitted under `allow_partial_results`; otherwise the first
    /// failure aborts the whole search.
    pub fn search(&self, query: &dyn Query) -> Result<Vec<SegmentMatches>> {
        if self.segments.is_empty() {
            return Ok(Vec::new());
        }

        let (tx, rx) = mpsc::channel();
        for (position, (name, reader)) in self.segments.iter().enumerate() {
            let tx = tx.clone();
            let name = name.clone();
            let reader = Arc::clone(reader);
            let query = query.clone_box();

            self.thread_pool.spawn(move || {
                let result = Self::search_segment(query.as_ref(), &name, &reader);
                let _ = tx.send((position, result));
            });
        }
        // Close the spawning side so the collection loop ends with the
        // last worker.
        drop(tx);

        let mut slots: Vec<Option<SegmentMatches>> = vec![None; self.segments.len()];
        while let Ok((position, result)) = rx.recv() {
            match result {
                Ok(matches) => slots[position] = Some(matches),
                Err(error) => {
                    if !self.config.allow_partial_results {
                        return Err(error);
                    }
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn search_segment(
        query: &dyn Query,
        name: &str,
        reader: &NumericIndexReader,
    ) -> Result<SegmentMatches> {
        let mut matcher = query.matcher(reader)?;
        let doc_ids = collect_doc_ids(matcher.as_mut())?;
        Ok(SegmentMatches {
            segment: name.to_string(),
            doc_ids,
        })
    }
}
