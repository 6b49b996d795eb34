//! Tests for configuration (de)serialization and file loading.

use std::io::Write;

use crate::clustering::ClusterAlgorithm;
use crate::config::EngineConfig;
use crate::error::ClusterError;
use crate::similarity::SimilarityMetric;

#[test]
fn test_json_round_trip() {
    let config = EngineConfig::default()
        .with_metric(SimilarityMetric::TokenSetOverlap)
        .with_algorithm(ClusterAlgorithm::leader());
    let json = serde_json::to_string(&config).expect("serialize");
    assert!(json.contains("\"token_set_overlap\""));
    let back: EngineConfig = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, config);
}

#[test]
fn test_partial_json_uses_defaults() {
    let config: EngineConfig = serde_json::from_str(r#"{"metric": "Jaccard"}"#).expect("parse");
    assert_eq!(config.metric, SimilarityMetric::TokenSetOverlap);
    assert_eq!(config.eps, 0.2);
    assert_eq!(config.min_points, 3);
}

#[test]
fn test_load_missing_file_gives_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = EngineConfig::load(dir.path().join("absent.toml")).expect("load");
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_load_toml_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tempfile");
    writeln!(
        file,
        "metric = \"tfidf\"\neps = 0.35\nmin_points = 4\n\n[algorithm]\nkind = \"leader\"\ncutoff = 0.7"
    )
    .expect("write");

    let config = EngineConfig::load(file.path()).expect("load");
    assert_eq!(config.metric, SimilarityMetric::TermWeightedCosine);
    assert_eq!(config.eps, 0.35);
    assert_eq!(config.min_points, 4);
    assert_eq!(config.algorithm, ClusterAlgorithm::Leader { cutoff: 0.7 });
    assert_eq!(config.max_text_lines, 15);
    println!("[PASS] test_load_toml_file - {:?}", config);
}

#[test]
fn test_load_rejects_unknown_metric() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tempfile");
    writeln!(file, "metric = \"cosine\"").expect("write");

    let err = EngineConfig::load(file.path()).unwrap_err();
    assert!(
        matches!(err, ClusterError::UnknownMetric { ref name } if name == "cosine"),
        "got {err:?}"
    );
}

#[test]
fn test_load_rejects_invalid_values() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tempfile");
    writeln!(file, "eps = -1.0").expect("write");

    let err = EngineConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ClusterError::InvalidParameter { .. }));
}
