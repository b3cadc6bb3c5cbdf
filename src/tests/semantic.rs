//! Integration tests against the real sentence encoder.
//!
//! These tests require model download and are marked #[ignore] by default.
//! Run with: cargo test -- --ignored

use super::sample_items;
use crate::catalog::Catalog;
use crate::recommender::Recommender;
use crate::rerank::Reranker;
use crate::semantic::{build_index, EmbeddingModel, IndexKind, TextEncoder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Similar texts should land closer than unrelated ones.
#[test]
#[ignore = "requires model download (~23MB)"]
fn test_semantic_similarity() {
    let dir = tempfile::tempdir().unwrap();
    let model = EmbeddingModel::new("all-MiniLM-L6-v2", dir.path().to_path_buf(), None)
        .expect("Failed to initialize embedding model");

    let java = model.encode("Java programming knowledge test").unwrap();
    let jvm = model.encode("Assessment of Java developer skills").unwrap();
    let personality = model.encode("Personality questionnaire about work behaviour").unwrap();

    assert!(cosine(&java, &jvm) > cosine(&java, &personality));
}

/// Full flow: catalog → encoder → both index kinds → recommendations.
#[test]
#[ignore = "requires model download (~23MB)"]
fn test_recommend_with_real_encoder() {
    let dir = tempfile::tempdir().unwrap();
    let model = EmbeddingModel::new("all-MiniLM-L6-v2", dir.path().to_path_buf(), None)
        .expect("Failed to initialize embedding model");
    assert_eq!(model.dimensions(), 384);

    let catalog = Catalog::from_items(sample_items());
    let vectors = model.encode_batch(&catalog.texts()).unwrap();
    let query = model.encode("Hiring a Java developer").unwrap();

    let flat = build_index(IndexKind::Flat, 384, vectors.clone()).unwrap();
    let brute = build_index(IndexKind::BruteForce, 384, vectors).unwrap();
    assert_eq!(flat.search(&query, 10).unwrap(), brute.search(&query, 10).unwrap());

    let recommender =
        Recommender::with_parts(catalog, Box::new(model), IndexKind::Flat, Reranker::Disabled)
            .unwrap();

    let recs = recommender.recommend("Hiring a Java developer", 10).unwrap();
    assert!((5..=10).contains(&recs.len()));
    assert!(recs.iter().any(|r| r.url.contains("java")));
}
