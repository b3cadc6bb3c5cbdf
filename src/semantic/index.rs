//! Exact inner-product nearest-neighbor search over catalog embeddings.
//!
//! Two implementations share the `NearestNeighborIndex` trait:
//! - `FlatIndex`: contiguous row-major matrix, rows scored in parallel with rayon
//! - `BruteForceIndex`: one vector per item, scored sequentially
//!
//! Both are exact. For the same vectors and query they return the same
//! results in the same order: scores come from the same `dot` function and
//! ties are broken by ascending item index.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Search result from a nearest-neighbor index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// Position of the item in the catalog
    pub index: usize,
    /// Inner product with the query (cosine similarity for unit vectors)
    pub score: f32,
}

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Which implementation to build, as written in the config file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndexPreference {
    #[default]
    Auto,
    Flat,
    BruteForce,
}

/// The implementation actually in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    Flat,
    BruteForce,
}

impl IndexKind {
    /// Resolve a preference against the running environment.
    ///
    /// `Auto` picks the parallel flat index when the rayon pool has more
    /// than one worker and falls back to brute force otherwise. Both kinds
    /// are exact and rank identically; the choice only decides whether
    /// scoring runs in parallel.
    pub fn detect(preference: IndexPreference) -> Self {
        match preference {
            IndexPreference::Flat => IndexKind::Flat,
            IndexPreference::BruteForce => IndexKind::BruteForce,
            IndexPreference::Auto => {
                if rayon::current_num_threads() > 1 {
                    IndexKind::Flat
                } else {
                    IndexKind::BruteForce
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Flat => "flat",
            IndexKind::BruteForce => "brute-force",
        }
    }
}

/// k-nearest-neighbor search by inner product.
pub trait NearestNeighborIndex: Send + Sync {
    /// Which implementation this is.
    fn kind(&self) -> IndexKind;

    /// Expected vector dimensions.
    fn dimensions(&self) -> usize;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return up to `topk` items ranked by inner product with `query`,
    /// highest first.
    fn search(&self, query: &[f32], topk: usize) -> Result<Vec<SearchResult>, IndexError>;
}

/// Build an index of the requested kind over `vectors`.
///
/// Every vector must have exactly `dimensions` components. An empty vector
/// set is valid and produces an index that always returns no results.
pub fn build_index(
    kind: IndexKind,
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
) -> Result<Box<dyn NearestNeighborIndex>, IndexError> {
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
        return Err(IndexError::DimensionMismatch {
            expected: dimensions,
            got: bad.len(),
        });
    }

    Ok(match kind {
        IndexKind::Flat => Box::new(FlatIndex::new(dimensions, vectors)),
        IndexKind::BruteForce => Box::new(BruteForceIndex::new(dimensions, vectors)),
    })
}

/// Contiguous matrix scored in parallel chunks.
pub struct FlatIndex {
    /// Row-major `rows x dimensions` matrix
    data: Vec<f32>,
    rows: usize,
    dimensions: usize,
}

impl FlatIndex {
    fn new(dimensions: usize, vectors: Vec<Vec<f32>>) -> Self {
        let rows = vectors.len();
        let mut data = Vec::with_capacity(rows * dimensions);
        for v in vectors {
            data.extend_from_slice(&v);
        }
        Self {
            data,
            rows,
            dimensions,
        }
    }
}

impl NearestNeighborIndex for FlatIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Flat
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.rows
    }

    fn search(&self, query: &[f32], topk: usize) -> Result<Vec<SearchResult>, IndexError> {
        check_query(query, self.dimensions)?;
        if self.rows == 0 || topk == 0 || self.dimensions == 0 {
            return Ok(vec![]);
        }

        let mut results: Vec<SearchResult> = self
            .data
            .par_chunks_exact(self.dimensions)
            .enumerate()
            .map(|(index, row)| SearchResult {
                index,
                score: dot(row, query),
            })
            .collect();

        // Partial selection is exact here: rank_order is a total order.
        if topk < results.len() {
            results.select_nth_unstable_by(topk - 1, rank_order);
            results.truncate(topk);
        }
        results.sort_unstable_by(rank_order);

        Ok(results)
    }
}

/// One vector per item, scored one at a time.
pub struct BruteForceIndex {
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl BruteForceIndex {
    fn new(dimensions: usize, vectors: Vec<Vec<f32>>) -> Self {
        Self {
            vectors,
            dimensions,
        }
    }
}

impl NearestNeighborIndex for BruteForceIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::BruteForce
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query: &[f32], topk: usize) -> Result<Vec<SearchResult>, IndexError> {
        check_query(query, self.dimensions)?;

        let mut results: Vec<SearchResult> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, v)| SearchResult {
                index,
                score: dot(v, query),
            })
            .collect();

        results.sort_by(rank_order);
        results.truncate(topk);

        Ok(results)
    }
}

fn check_query(query: &[f32], dimensions: usize) -> Result<(), IndexError> {
    if query.len() != dimensions {
        return Err(IndexError::DimensionMismatch {
            expected: dimensions,
            got: query.len(),
        });
    }
    Ok(())
}

/// Inner product. Both implementations must go through this function.
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Score descending, then item index ascending.
fn rank_order(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.index.cmp(&b.index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(v: &[f32]) -> Vec<f32> {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }

    fn sample_vectors() -> Vec<Vec<f32>> {
        (0..50)
            .map(|i| {
                let i = i as f32;
                unit(&[1.0 + (i * 0.37).sin(), (i * 1.3).cos(), (i * 0.11).sin() + 0.2])
            })
            .collect()
    }

    #[test]
    fn test_detect_respects_explicit_preference() {
        assert_eq!(IndexKind::detect(IndexPreference::Flat), IndexKind::Flat);
        assert_eq!(
            IndexKind::detect(IndexPreference::BruteForce),
            IndexKind::BruteForce
        );
    }

    #[test]
    fn test_search_basic() {
        for kind in [IndexKind::Flat, IndexKind::BruteForce] {
            let index = build_index(
                kind,
                3,
                vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
            )
            .unwrap();

            let results = index.search(&unit(&[1.0, 0.1, 0.0]), 2).unwrap();
            assert_eq!(results.len(), 2);
            assert_eq!(results[0].index, 0);
            assert_eq!(results[1].index, 1);
            assert!(results[0].score > results[1].score);
        }
    }

    #[test]
    fn test_flat_and_brute_force_agree() {
        let vectors = sample_vectors();
        let flat = build_index(IndexKind::Flat, 3, vectors.clone()).unwrap();
        let brute = build_index(IndexKind::BruteForce, 3, vectors).unwrap();

        let queries = [unit(&[1.0, 0.0, 0.0]), unit(&[0.2, -0.7, 0.4]), unit(&[-1.0, 1.0, 1.0])];
        for query in &queries {
            for topk in [1, 5, 17, 50, 80] {
                let a = flat.search(query, topk).unwrap();
                let b = brute.search(query, topk).unwrap();
                assert_eq!(a, b, "topk={topk}");
            }
        }
    }

    #[test]
    fn test_ties_broken_by_index() {
        let vectors = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]];
        for kind in [IndexKind::Flat, IndexKind::BruteForce] {
            let index = build_index(kind, 2, vectors.clone()).unwrap();
            let results = index.search(&[1.0, 0.0], 2).unwrap();
            let order: Vec<usize> = results.iter().map(|r| r.index).collect();
            assert_eq!(order, vec![1, 2]);
        }
    }

    #[test]
    fn test_topk_larger_than_index() {
        let index = build_index(IndexKind::Flat, 2, vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let results = index.search(&[1.0, 0.0], 30).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        for kind in [IndexKind::Flat, IndexKind::BruteForce] {
            let index = build_index(kind, 384, vec![]).unwrap();
            assert!(index.is_empty());
            let results = index.search(&vec![0.1; 384], 10).unwrap();
            assert!(results.is_empty());
        }
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = build_index(IndexKind::BruteForce, 3, vec![vec![1.0, 0.0, 0.0]]).unwrap();
        let result = index.search(&[1.0, 0.0], 1);
        assert!(matches!(
            result,
            Err(IndexError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_build_dimension_mismatch() {
        let result = build_index(IndexKind::Flat, 3, vec![vec![1.0, 0.0, 0.0], vec![1.0]]);
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
    }
}
