//! End-to-end parallel search across independent index segments.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trieval::prelude::*;

fn random_segment(rng: &mut StdRng, count: usize) -> (Vec<i64>, Arc<NumericIndexReader>) {
    let values: Vec<i64> = (0..count)
        .map(|_| rng.random_range(-50_000..=50_000))
        .collect();
    let mut writer = NumericIndexWriter::new();
    writer.add_field("value", NumericField::i64()).unwrap();
    for &value in &values {
        writer
            .add_document(&[("value", NumericValue::I64(value))])
            .unwrap();
    }
    (values, Arc::new(writer.commit().unwrap()))
}

#[test]
fn test_parallel_search_matches_per_segment_serial_results() {
    let mut rng = StdRng::seed_from_u64(0x9A11);
    let mut searcher = ParallelRangeSearcher::new(ParallelSearchConfig {
        thread_pool_size: Some(4),
        allow_partial_results: false,
    })
    .unwrap();

    let mut segments = Vec::new();
    for i in 0..6 {
        let (values, reader) = random_segment(&mut rng, 300);
        searcher
            .add_segment(format!("segment-{i}"), Arc::clone(&reader))
            .unwrap();
        segments.push((format!("segment-{i}"), values, reader));
    }

    for _ in 0..10 {
        let a = rng.random_range(-50_000..=50_000);
        let b = rng.random_range(-50_000..=50_000);
        let (lower, upper) = (a.min(b), a.max(b));
        let query = NumericRangeQuery::i64_range("value", Some(lower), Some(upper), true, true);

        let results = searcher.search(&query).unwrap();
        assert_eq!(results.len(), segments.len());

        for (result, (name, values, reader)) in results.iter().zip(&segments) {
            assert_eq!(&result.segment, name);

            let expected: Vec<u32> = values
                .iter()
                .enumerate()
                .filter(|&(_, &v)| lower <= v && v <= upper)
                .map(|(i, _)| i as u32)
                .collect();
            assert_eq!(result.doc_ids, expected, "segment {name}");

            let mut matcher = query.matcher(reader.as_ref()).unwrap();
            assert_eq!(collect_doc_ids(matcher.as_mut()).unwrap(), expected);
        }
    }
}

#[test]
fn test_parallel_search_filters_deletions_per_segment() {
    let mut searcher = ParallelRangeSearcher::new(ParallelSearchConfig::default()).unwrap();

    let mut writer = NumericIndexWriter::new();
    writer.add_field("value", NumericField::i64()).unwrap();
    for value in 0..10 {
        writer
            .add_document(&[("value", NumericValue::I64(value))])
            .unwrap();
    }
    writer.delete_document(4).unwrap();
    writer.delete_document(5).unwrap();
    searcher
        .add_segment("with-deletes", Arc::new(writer.commit().unwrap()))
        .unwrap();

    let mut writer = NumericIndexWriter::new();
    writer.add_field("value", NumericField::i64()).unwrap();
    for value in 0..10 {
        writer
            .add_document(&[("value", NumericValue::I64(value))])
            .unwrap();
    }
    searcher
        .add_segment("intact", Arc::new(writer.commit().unwrap()))
        .unwrap();

    let query = NumericRangeQuery::i64_range("value", Some(3), Some(6), true, true);
    let results = searcher.search(&query).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].segment, "with-deletes");
    assert_eq!(results[0].doc_ids, vec![3, 6]);
    assert_eq!(results[1].segment, "intact");
    assert_eq!(results[1].doc_ids, vec![3, 4, 5, 6]);
}

#[test]
fn test_query_deadline_rides_along_into_worker_threads() {
    let mut rng = StdRng::seed_from_u64(0xDEAD);
    let mut searcher = ParallelRangeSearcher::new(ParallelSearchConfig {
        thread_pool_size: Some(2),
        allow_partial_results: false,
    })
    .unwrap();
    for i in 0..3 {
        let (_, reader) = random_segment(&mut rng, 100);
        searcher.add_segment(format!("segment-{i}"), reader).unwrap();
    }

    // A generous deadline must not trip on a small index.
    let query = NumericRangeQuery::i64_range("value", Some(-50_000), Some(50_000), true, true)
        .with_timeout(Duration::from_secs(60));
    let results = searcher.search(&query).unwrap();
    assert_eq!(results.len(), 3);
    for result in &results {
        assert_eq!(result.doc_ids.len(), 100);
    }
}
