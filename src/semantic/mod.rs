//! Semantic search infrastructure for catalog embeddings.
//!
//! This module provides local semantic search using fastembed-rs for
//! generating embeddings and an in-memory exact nearest-neighbor index.
//!
//! # Architecture
//!
//! - `embeddings`: Wraps fastembed behind the `TextEncoder` trait
//! - `index`: Flat (parallel) and brute-force inner-product search

pub mod embeddings;
mod index;

pub use embeddings::{EmbeddingError, EmbeddingModel, TextEncoder};
pub use index::{build_index, IndexError, IndexKind, IndexPreference, NearestNeighborIndex};

/// Default embedding model name (384-dimensional sentence encoder)
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
