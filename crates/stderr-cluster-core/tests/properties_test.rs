//! Cross-module properties of normalization, similarity and clustering.
//!
//! Fixed-sample checks pin reference values; the `proptest!` blocks check
//! the same properties over generated batches.

use chrono::Utc;
use proptest::prelude::*;

use stderr_cluster_core::clustering::assign_clusters;
use stderr_cluster_core::similarity::{EditDistanceSimilarity, MetricInput, TokenSetSimilarity};
use stderr_cluster_core::{
    normalize, sortable_key, ClusterAlgorithm, ClusteringEngine, EngineConfig, ErrorRecord,
    SimilarityMatrix, SimilarityMetric,
};

const MESSAGES: [&str; 7] = [
    "Traceback (most recent call last):\n  File \"/srv/a.py\", line 3, in <module>\nKeyError: 'sample'",
    "Traceback (most recent call last):\n  File \"/srv/b.py\", line 9, in <module>\nKeyError: 'reads'",
    "Fatal error: Exit code 137 ()",
    "Killed",
    "",
    "!!! 404 ???",
    "java.lang.OutOfMemoryError: Java heap space",
];

/// Build the matrix for `metric` from raw messages, normalizing first when
/// the metric compares normalized text.
fn matrix_for(metric: SimilarityMetric, raw: &[String]) -> SimilarityMatrix {
    let normalized: Vec<String> = raw.iter().map(|m| normalize(m)).collect();
    let texts: Vec<&str> = match metric.input() {
        MetricInput::Normalized => normalized.iter().map(String::as_str).collect(),
        MetricInput::Raw => raw.iter().map(String::as_str).collect(),
    };
    metric.engine().compute(&texts).expect("compute")
}

fn assert_symmetric_unit_diagonal(metric: SimilarityMetric, matrix: &SimilarityMatrix) {
    assert!(matrix.is_symmetric(), "{metric}: not symmetric");
    for i in 0..matrix.size() {
        assert_eq!(matrix.get(i, i), Some(1.0), "{metric}: diagonal at {i}");
        for j in 0..matrix.size() {
            let s = matrix.get(i, j).expect("cell");
            assert!((0.0..=1.0).contains(&s), "{metric}: ({i},{j}) = {s}");
        }
    }
}

// =============================================================================
// NORMALIZATION
// =============================================================================

#[test]
fn test_normalize_idempotent_on_corpus() {
    for message in MESSAGES {
        let once = normalize(message);
        assert_eq!(normalize(&once), once, "not idempotent: {message:?}");
    }
    println!("[PASS] test_normalize_idempotent_on_corpus");
}

proptest! {
    #[test]
    fn prop_normalize_idempotent_any_unicode(text in any::<String>()) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_normalize_idempotent_message_like(
        text in "[A-Za-z .:/()'\"_0-9\n]{0,120}",
    ) {
        let once = normalize(&text);
        prop_assert_eq!(normalize(&once), once);
    }
}

// =============================================================================
// SIMILARITY MATRICES
// =============================================================================

#[test]
fn test_every_metric_symmetric_with_unit_diagonal() {
    let raw: Vec<String> = MESSAGES.iter().map(|m| m.to_string()).collect();

    for metric in SimilarityMetric::ALL {
        let matrix = matrix_for(metric, &raw);

        println!("[STATE] metric={metric} stats={:?}", matrix.stats());
        assert_eq!(matrix.size(), MESSAGES.len());
        assert_symmetric_unit_diagonal(metric, &matrix);

        let labels_a = assign_clusters(&matrix, 0.2, 2).expect("labels");
        let labels_b = assign_clusters(&matrix, 0.2, 2).expect("labels");
        assert_eq!(labels_a, labels_b, "{metric}: labels not deterministic");
    }
    println!("[PASS] test_every_metric_symmetric_with_unit_diagonal");
}

#[test]
fn test_reference_values() {
    assert!((TokenSetSimilarity::pair("a b", "a c") - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(EditDistanceSimilarity::pair("segfault", "segfault"), 1.0);
    assert_eq!(EditDistanceSimilarity::pair("x", "y"), 0.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_metric_symmetric_with_unit_diagonal(
        batch in prop::collection::vec("[a-zA-Z0-9 ./:_()-]{0,40}", 0..8),
    ) {
        for metric in SimilarityMetric::ALL {
            let matrix = matrix_for(metric, &batch);
            prop_assert_eq!(matrix.size(), batch.len());
            assert_symmetric_unit_diagonal(metric, &matrix);
        }
    }

    #[test]
    fn prop_every_metric_deterministic(
        batch in prop::collection::vec("[a-z ]{0,30}", 1..6),
    ) {
        for metric in SimilarityMetric::ALL {
            prop_assert_eq!(matrix_for(metric, &batch), matrix_for(metric, &batch));
        }
    }
}

// =============================================================================
// CLUSTER ACCOUNTING
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_counts_plus_noise_cover_batch(
        batch in prop::collection::vec("[a-z]{1,8}( [a-z]{1,8}){0,4}", 0..10),
        metric in prop::sample::select(SimilarityMetric::ALL.to_vec()),
        eps in 0.01f32..1.0,
        min_points in 1usize..5,
        leader in any::<bool>(),
    ) {
        let algorithm = if leader { ClusterAlgorithm::leader() } else { ClusterAlgorithm::Dbscan };
        let config = EngineConfig::default()
            .with_metric(metric)
            .with_eps(eps)
            .with_min_points(min_points)
            .with_algorithm(algorithm);
        let engine = ClusteringEngine::new(config).expect("engine");

        let now = Utc::now();
        let records: Vec<ErrorRecord> = batch
            .iter()
            .map(|t| ErrorRecord::with_random_id(t.as_str(), now, None))
            .collect();
        let outcome = engine.run(records.clone()).expect("run");

        let clustered: usize = outcome.summaries.iter().map(|s| s.count).sum();
        prop_assert_eq!(clustered + outcome.noise_count, batch.len());
        prop_assert_eq!(outcome.records.len(), batch.len());
        if leader {
            prop_assert_eq!(outcome.noise_count, 0);
        }

        let again = engine.run(records).expect("run");
        prop_assert_eq!(outcome.labels(), again.labels());
    }
}

// =============================================================================
// VERSION ORDERING
// =============================================================================

#[test]
fn test_version_reference_ordering() {
    let a = sortable_key(Some("0.0.1+galaxy1"));
    let b = sortable_key(Some("0.0.1+galaxy2"));
    let c = sortable_key(Some("0.1.0+galaxy2"));
    assert!(a < b && b < c);
    assert_eq!(sortable_key(Some("2.3.7")).components(), ["002", "003", "007"]);
    assert_eq!(sortable_key(Some("234")).components(), ["234"]);
    assert!(sortable_key(None) < sortable_key(Some("0")));
}

fn dotted(parts: &[u32]) -> String {
    parts
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

proptest! {
    #[test]
    fn prop_version_key_matches_numeric_order(
        a in prop::collection::vec(0u32..1000, 1..5),
        b in prop::collection::vec(0u32..1000, 1..5),
    ) {
        let key_a = sortable_key(Some(&dotted(&a)));
        let key_b = sortable_key(Some(&dotted(&b)));
        prop_assert_eq!(key_a.cmp(&key_b), a.cmp(&b));
    }

    #[test]
    fn prop_missing_version_sorts_lowest(
        parts in prop::collection::vec(0u32..1000, 1..5),
    ) {
        prop_assert!(sortable_key(None) < sortable_key(Some(&dotted(&parts))));
    }
}
